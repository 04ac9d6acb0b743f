//! Mock network shared by the integration tests.
//!
//! Contract handlers are registered per (RPC endpoint, address, selector) and
//! consulted in registration order, so a more specific handler must be
//! registered before a catch-all one.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::{Address, B256, Bytes, hex};
use alloy::sol_types::{SolCall, SolValue};
use chainname::contracts::{self, sol};
use chainname::names::namehash;
use chainname::offchain::OffchainLookup;
use chainname::prelude::*;
use chainname::transport::HttpResponse;
use chainname::transport::mock::{EthCallReply, MockTransport};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;
use url::Url;

pub const ETH_RPC: &str = "https://eth.rpc.test/";
pub const POLYGON_RPC: &str = "https://polygon.rpc.test/";
pub const GATEWAY: &str = "https://gateway.example/";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn url(s: &str) -> Url {
    Url::parse(s).expect("valid url")
}

/// ABI encoding of a single address.
pub fn address_word(address: Address) -> Vec<u8> {
    address.abi_encode()
}

/// ABI encoding of a single `bytes`.
pub fn bytes_word(data: &[u8]) -> Vec<u8> {
    Bytes::copy_from_slice(data).abi_encode()
}

/// ABI encoding of a single `string`.
pub fn string_word(s: &str) -> Vec<u8> {
    s.to_owned().abi_encode()
}

/// ABI encoding of a single `string[]`.
pub fn string_array_word(values: [&str; 6]) -> Vec<u8> {
    values.map(str::to_owned).to_vec().abi_encode()
}

pub struct MockNetwork {
    pub mock: Arc<MockTransport>,
}

impl MockNetwork {
    pub fn new() -> Self {
        init_tracing();
        Self {
            mock: Arc::new(MockTransport::new()),
        }
    }

    pub fn config() -> ResolverConfig {
        let mut config = ResolverConfig::default();
        config.set_rpc_url(Chain::Ethereum, ETH_RPC);
        config.set_rpc_url(Chain::Polygon, POLYGON_RPC);
        config
    }

    pub fn service(&self, state: ConsentState) -> NameService {
        self.service_with_store(Arc::new(InMemoryConsentStore::with_state(state)))
    }

    pub fn service_with_store(&self, store: Arc<dyn ConsentStore>) -> NameService {
        NameService::builder(Self::config())
            .transport(Arc::clone(&self.mock) as Arc<dyn HttpTransport>)
            .consent_store(store)
            .build()
            .expect("test config is valid")
    }

    /// Registry answers `resolver(node)` from `names`; other names get the
    /// zero address.
    pub fn registry(&self, names: &[(&str, Address)]) {
        let table: HashMap<B256, Address> = names
            .iter()
            .map(|(name, resolver)| (namehash(name), *resolver))
            .collect();
        self.mock.on_eth_call(
            Some(url(ETH_RPC)),
            contracts::ENS_REGISTRY,
            contracts::RESOLVER,
            move |data| {
                let node = B256::from_slice(&data[4..36]);
                EthCallReply::Return(address_word(
                    table.get(&node).copied().unwrap_or(Address::ZERO),
                ))
            },
        );
    }

    pub fn supports_extended_resolution(&self, resolver: Address, supported: bool) {
        self.mock.on_eth_call(
            Some(url(ETH_RPC)),
            resolver,
            contracts::SUPPORTS_INTERFACE,
            move |data| {
                let asked = data[4..8] == contracts::ENSIP10_INTERFACE_ID;
                EthCallReply::Return((supported && asked).abi_encode())
            },
        );
    }

    pub fn addr(&self, resolver: Address, reply: Address) {
        self.mock.on_eth_call(Some(url(ETH_RPC)), resolver, contracts::ADDR, move |_| {
            EthCallReply::Return(address_word(reply))
        });
    }

    pub fn contenthash(&self, resolver: Address, hash: Vec<u8>) {
        self.mock
            .on_eth_call(Some(url(ETH_RPC)), resolver, contracts::CONTENTHASH, move |_| {
                EthCallReply::Return(bytes_word(&hash))
            });
    }

    /// `resolve(name, data)` reverts with an `OffchainLookup` pointing at
    /// [`GATEWAY`]; `resolveCallback(response, extraData)` returns the
    /// gateway response unchanged.
    pub fn offchain_resolver(&self, resolver: Address) {
        self.supports_extended_resolution(resolver, true);
        self.mock
            .on_eth_call(Some(url(ETH_RPC)), resolver, contracts::RESOLVE, move |data| {
                EthCallReply::Revert(
                    OffchainLookup {
                        sender: resolver,
                        urls: vec![GATEWAY.to_owned()],
                        call_data: data.to_vec().into(),
                        callback_function: contracts::RESOLVE_CALLBACK,
                        extra_data: string_word("extra data").into(),
                    }
                    .encode()
                    .to_vec(),
                )
            });
        self.mock.on_eth_call(
            Some(url(ETH_RPC)),
            resolver,
            contracts::RESOLVE_CALLBACK,
            |data| {
                let call = sol::IExtendedResolver::resolveCallbackCall::abi_decode(data)
                    .expect("callback arguments");
                EthCallReply::Return(bytes_word(&call.response))
            },
        );
    }

    /// Gateway answering every request with `reply`.
    pub fn gateway(&self, reply: impl Fn(&Value) -> HttpResponse + Send + Sync + 'static) {
        self.mock.on_post(GATEWAY, reply);
    }

    /// Gateway answering `{"data": hex(data)}`.
    pub fn gateway_data(&self, data: Vec<u8>) {
        self.gateway(move |_| HttpResponse::json(&json!({ "data": hex::encode_prefixed(&data) })));
    }

    /// ProxyReader `get` on the chain served by `rpc`.
    pub fn ud_get(&self, rpc: &str, reader: Address, reply: EthCallReply) {
        self.mock
            .on_eth_call(Some(url(rpc)), reader, contracts::GET, move |_| reply.clone());
    }

    /// ProxyReader `get` answering per domain; unknown domains get `""`.
    pub fn ud_get_by_domain(&self, rpc: &str, reader: Address, table: &[(&str, &str)]) {
        let table: HashMap<B256, String> = table
            .iter()
            .map(|(name, value)| (namehash(name), (*value).to_owned()))
            .collect();
        self.mock
            .on_eth_call(Some(url(rpc)), reader, contracts::GET, move |data| {
                let call = sol::IProxyReader::getCall::abi_decode(data).expect("get arguments");
                let token = B256::from(call.tokenId.to_be_bytes::<32>());
                let value = table.get(&token).cloned().unwrap_or_default();
                EthCallReply::Return(string_word(&value))
            });
    }

    /// ProxyReader `getMany` on the chain served by `rpc`.
    pub fn ud_get_many(&self, rpc: &str, reader: Address, reply: EthCallReply) {
        self.mock
            .on_eth_call(Some(url(rpc)), reader, contracts::GET_MANY, move |_| {
                reply.clone()
            });
    }

    pub fn requests_to(&self, rpc: &str) -> usize {
        self.mock
            .requests()
            .iter()
            .filter(|r| r.url.as_str() == rpc)
            .count()
    }
}
