//! CCIP-Read (ERC-3668) off-chain lookups.
//!
//! A resolver that cannot answer on-chain reverts with
//! `OffchainLookup(sender, urls, callData, callbackFunction, extraData)`.
//! [`CcipReader::follow`] posts `callData` to a gateway, hands the reply back
//! to the resolver through `callbackFunction(response, extraData)` and
//! returns what that call returns. The callback may itself revert with a new
//! lookup; at most `max_lookups` rounds are followed.
//!
//! Consent is checked by the caller before a lookup is followed.

mod gateway;

use alloy::primitives::{Address, Bytes, FixedBytes};
use alloy::sol_types::{SolError, SolValue};

pub use gateway::{GatewayClient, GatewayError, GatewayPolicy};

use crate::chain::Chain;
use crate::contracts::{self, Selector, sol};
use crate::error::ResolveError;
use crate::rpc::{CallError, RpcClient};

/// Default number of chained lookups followed before giving up.
pub const DEFAULT_MAX_LOOKUPS: usize = 4;

/// Decoded `OffchainLookup` revert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffchainLookup {
    /// Contract that raised the lookup.
    pub sender: Address,
    /// Gateway URL templates, in preference order.
    pub urls: Vec<String>,
    /// Payload to forward to the gateway.
    pub call_data: Bytes,
    /// Selector of the function that verifies the gateway reply.
    pub callback_function: Selector,
    /// Opaque data echoed back to the callback.
    pub extra_data: Bytes,
}

impl From<sol::IOffchain::OffchainLookup> for OffchainLookup {
    fn from(revert: sol::IOffchain::OffchainLookup) -> Self {
        Self {
            sender: revert.sender,
            urls: revert.urls,
            call_data: revert.callData,
            callback_function: revert.callbackFunction.0,
            extra_data: revert.extraData,
        }
    }
}

impl OffchainLookup {
    /// Whether `revert_data` starts with the `OffchainLookup` selector.
    #[must_use]
    pub fn matches(revert_data: &[u8]) -> bool {
        revert_data.starts_with(&contracts::OFFCHAIN_LOOKUP)
    }

    /// Decodes revert data.
    ///
    /// # Errors
    ///
    /// Returns the decoder error if the selector differs or the arguments are
    /// malformed.
    pub fn decode(revert_data: &[u8]) -> alloy::sol_types::Result<Self> {
        sol::IOffchain::OffchainLookup::abi_decode(revert_data).map(Self::from)
    }

    /// Encodes this lookup as revert data.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        sol::IOffchain::OffchainLookup {
            sender: self.sender,
            urls: self.urls.clone(),
            callData: self.call_data.clone(),
            callbackFunction: FixedBytes(self.callback_function),
            extraData: self.extra_data.clone(),
        }
        .abi_encode()
        .into()
    }

    /// Call data for `callbackFunction(response, extraData)`.
    ///
    /// The callback selector is chosen by the resolver, so the arguments are
    /// encoded as a plain `(bytes,bytes)` parameter list behind it.
    #[must_use]
    pub fn callback_call_data(&self, response: &[u8]) -> Bytes {
        let args = (Bytes::copy_from_slice(response), self.extra_data.clone());
        let mut data = self.callback_function.to_vec();
        data.extend(args.abi_encode_params());
        data.into()
    }
}

/// Follows `OffchainLookup` reverts through a gateway and back on-chain.
#[derive(Debug)]
pub struct CcipReader<'a> {
    rpc: &'a RpcClient,
    gateway: &'a GatewayClient,
    max_lookups: usize,
}

impl<'a> CcipReader<'a> {
    /// Creates a reader.
    #[must_use]
    pub const fn new(rpc: &'a RpcClient, gateway: &'a GatewayClient, max_lookups: usize) -> Self {
        Self {
            rpc,
            gateway,
            max_lookups,
        }
    }

    /// Resolves the lookup encoded in `revert_data`, raised by `resolver` on
    /// `chain`, and returns the final callback's return data.
    ///
    /// # Errors
    ///
    /// `ParsingError` for undecodable revert data; `InternalError` for a
    /// sender mismatch, gateway failure or too many chained lookups; RPC
    /// failures of the callback are mapped like any other call.
    pub async fn follow(
        &self,
        chain: Chain,
        resolver: Address,
        revert_data: &[u8],
    ) -> Result<Bytes, ResolveError> {
        let mut lookup = OffchainLookup::decode(revert_data)?;

        for round in 1..=self.max_lookups {
            if lookup.sender != resolver {
                return Err(GatewayError::SenderMismatch {
                    sender: lookup.sender,
                    resolver,
                }
                .into());
            }
            tracing::debug!(
                %chain,
                %resolver,
                round,
                urls = ?lookup.urls,
                "following offchain lookup"
            );

            let response = self
                .gateway
                .fetch(lookup.sender, &lookup.urls, &lookup.call_data)
                .await?;
            let callback = lookup.callback_call_data(&response);

            match self.rpc.eth_call(chain, resolver, &callback).await {
                Ok(data) => return Ok(data),
                Err(CallError::Revert { data }) if OffchainLookup::matches(&data) => {
                    lookup = OffchainLookup::decode(&data)?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(GatewayError::TooManyLookups(self.max_lookups).into())
    }
}
