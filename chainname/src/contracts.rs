//! Contract interfaces the resolvers call.
//!
//! Calls are built with the `sol!`-generated `…Call` structs and their return
//! data decoded with `abi_decode_returns`, so no selector or layout is
//! hand-written. The selector constants below are what the mock transport
//! routes on.

use alloy::primitives::{Address, address};
use alloy::sol_types::{SolCall, SolError};

/// A 4-byte function or error selector.
pub type Selector = [u8; 4];

/// `sol!` bindings for the registry, resolver and `ProxyReader` contracts.
#[allow(missing_docs)]
pub mod sol {
    alloy::sol! {
        interface EnsRegistry {
            function resolver(bytes32 node) external view returns (address);
        }

        interface IERC165 {
            function supportsInterface(bytes4 interfaceId) external view returns (bool);
        }

        interface IAddrResolver {
            function addr(bytes32 node) external view returns (address);
        }

        interface IContentHashResolver {
            function contenthash(bytes32 node) external view returns (bytes);
        }

        interface IExtendedResolver {
            function resolve(bytes name, bytes data) external view returns (bytes);
            function resolveCallback(bytes response, bytes extraData)
                external view returns (bytes);
        }

        interface IOffchain {
            error OffchainLookup(
                address sender,
                string[] urls,
                bytes callData,
                bytes4 callbackFunction,
                bytes extraData
            );
        }

        interface IProxyReader {
            function get(string key, uint256 tokenId) external view returns (string);
            function getMany(string[] keys, uint256 tokenId) external view returns (string[]);
        }
    }
}

/// ENS registry on Ethereum mainnet.
pub const ENS_REGISTRY: Address = address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

/// Unstoppable Domains `ProxyReader` on Ethereum mainnet.
pub const UD_PROXY_READER_ETHEREUM: Address = address!("c3C2BAB0a7a5A9B1b6b5A4Ef1F1b6eE4E5b1d8e5");

/// Unstoppable Domains `ProxyReader` on Polygon.
pub const UD_PROXY_READER_POLYGON: Address = address!("91EDd8708062bd4233f4Dd0FCE15A7cb4d500091");

/// `resolver(bytes32)`
pub const RESOLVER: Selector = sol::EnsRegistry::resolverCall::SELECTOR;

/// `supportsInterface(bytes4)`
pub const SUPPORTS_INTERFACE: Selector = sol::IERC165::supportsInterfaceCall::SELECTOR;

/// `addr(bytes32)`
pub const ADDR: Selector = sol::IAddrResolver::addrCall::SELECTOR;

/// `contenthash(bytes32)`
pub const CONTENTHASH: Selector = sol::IContentHashResolver::contenthashCall::SELECTOR;

/// `resolve(bytes,bytes)`
pub const RESOLVE: Selector = sol::IExtendedResolver::resolveCall::SELECTOR;

/// `resolveCallback(bytes,bytes)`
pub const RESOLVE_CALLBACK: Selector = sol::IExtendedResolver::resolveCallbackCall::SELECTOR;

/// `OffchainLookup(address,string[],bytes,bytes4,bytes)` revert selector.
pub const OFFCHAIN_LOOKUP: Selector = sol::IOffchain::OffchainLookup::SELECTOR;

/// `get(string,uint256)`
pub const GET: Selector = sol::IProxyReader::getCall::SELECTOR;

/// `getMany(string[],uint256)`
pub const GET_MANY: Selector = sol::IProxyReader::getManyCall::SELECTOR;

/// ERC-165 interface id of the ENSIP-10 extended resolver.
///
/// The interface has a single function, so its id equals that function's
/// selector.
pub const ENSIP10_INTERFACE_ID: Selector = RESOLVE;
