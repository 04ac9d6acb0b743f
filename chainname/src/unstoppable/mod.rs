//! Unstoppable Domains resolution across chains.
//!
//! Records live on a ProxyReader contract on each configured chain. Every
//! chain is read concurrently and the answers are merged in priority order:
//!
//! * a non-empty value wins,
//! * an error wins,
//! * an empty value defers to the next chain.
//!
//! When every chain is empty the domain has no record. Identical reads of
//! the same domain, record and chain that overlap in time share one request.

mod records;

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use futures::future::join_all;
use url::Url;

pub use records::{DNS_RECORD_KEYS, DnsRecordSet, ETH_ADDRESS_KEY};

use crate::chain::Chain;
use crate::contracts::{self, sol};
use crate::error::{ResolveError, Result};
use crate::inflight::{Inflight, RequestKey};
use crate::names::{Domain, NamingSystem};
use crate::outcome::{Outcome, RecordKind};
use crate::rpc::RpcClient;

/// A ProxyReader deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProxyReader {
    /// Chain it is deployed on.
    pub chain: Chain,
    /// Contract address.
    pub address: Address,
}

impl ProxyReader {
    /// Reader at `address` on `chain`.
    #[must_use]
    pub const fn new(chain: Chain, address: Address) -> Self {
        Self { chain, address }
    }

    /// The published readers: Polygon first, Ethereum as fallback.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(Chain::Polygon, contracts::UD_PROXY_READER_POLYGON),
            Self::new(Chain::Ethereum, contracts::UD_PROXY_READER_ETHEREUM),
        ]
    }

    /// `get(key, tokenId)`.
    ///
    /// # Errors
    ///
    /// RPC and decode failures.
    pub async fn get(&self, rpc: &RpcClient, key: &str, token_id: U256) -> Result<String> {
        let call = sol::IProxyReader::getCall {
            key: key.to_owned(),
            tokenId: token_id,
        }
        .abi_encode();
        let data = rpc.eth_call(self.chain, self.address, &call).await?;
        Ok(sol::IProxyReader::getCall::abi_decode_returns(&data)?)
    }

    /// `getMany(keys, tokenId)`.
    ///
    /// # Errors
    ///
    /// RPC and decode failures.
    pub async fn get_many(
        &self,
        rpc: &RpcClient,
        keys: &[&str],
        token_id: U256,
    ) -> Result<Vec<String>> {
        let call = sol::IProxyReader::getManyCall {
            keys: keys.iter().map(|key| (*key).to_owned()).collect(),
            tokenId: token_id,
        }
        .abi_encode();
        let data = rpc.eth_call(self.chain, self.address, &call).await?;
        Ok(sol::IProxyReader::getManyCall::abi_decode_returns(&data)?)
    }

    async fn address_record(self, rpc: Arc<RpcClient>, token_id: U256) -> Result<Outcome<String>> {
        let value = self.get(&rpc, ETH_ADDRESS_KEY, token_id).await?;
        Ok(if value.is_empty() {
            Outcome::NoRecord
        } else {
            Outcome::Value(value)
        })
    }

    async fn dns_record(self, rpc: Arc<RpcClient>, token_id: U256) -> Result<Outcome<Url>> {
        let values = self.get_many(&rpc, &DNS_RECORD_KEYS, token_id).await?;
        let records = DnsRecordSet::from_values(values).ok_or_else(|| {
            tracing::debug!(chain = %self.chain, "getMany returned wrong number of values");
            ResolveError::parsing()
        })?;
        Ok(records.to_url().map_or(Outcome::NoRecord, Outcome::Value))
    }
}

/// Resolver for Unstoppable Domains names.
#[derive(Debug)]
pub struct UnstoppableResolver {
    rpc: Arc<RpcClient>,
    readers: Vec<ProxyReader>,
    addresses: Inflight<RequestKey, Outcome<String>>,
    dns: Inflight<RequestKey, Outcome<Url>>,
}

impl UnstoppableResolver {
    /// Creates a resolver reading `readers` in priority order.
    #[must_use]
    pub fn new(rpc: Arc<RpcClient>, readers: Vec<ProxyReader>) -> Self {
        Self {
            rpc,
            readers,
            addresses: Inflight::new(),
            dns: Inflight::new(),
        }
    }

    /// Readers in priority order.
    #[must_use]
    pub fn readers(&self) -> &[ProxyReader] {
        &self.readers
    }

    /// Resolves the `crypto.ETH.address` record, returned as stored.
    ///
    /// # Errors
    ///
    /// `InvalidParams` for a non Unstoppable Domains name, otherwise the
    /// first error in priority order that is not preceded by a value.
    pub async fn resolve_address(&self, domain: &Domain) -> Result<Outcome<String>> {
        let token_id = token_id(domain)?;
        let lookups = self.readers.iter().map(|reader| {
            let key = RequestKey::new(domain, RecordKind::Address, reader.chain, None);
            let rpc = Arc::clone(&self.rpc);
            let reader = *reader;
            self.addresses
                .run(key, move || reader.address_record(rpc, token_id))
        });
        let results = join_all(lookups).await;
        merge(domain, &self.readers, results)
    }

    /// Resolves the web URL from the DNS-style records.
    ///
    /// # Errors
    ///
    /// Same as [`UnstoppableResolver::resolve_address`].
    pub async fn resolve_dns(&self, domain: &Domain) -> Result<Outcome<Url>> {
        let token_id = token_id(domain)?;
        let lookups = self.readers.iter().map(|reader| {
            let key = RequestKey::new(domain, RecordKind::DnsRecord, reader.chain, None);
            let rpc = Arc::clone(&self.rpc);
            let reader = *reader;
            self.dns.run(key, move || reader.dns_record(rpc, token_id))
        });
        let results = join_all(lookups).await;
        merge(domain, &self.readers, results)
    }
}

/// The namehash read as a big-endian `uint256`.
fn token_id(domain: &Domain) -> Result<U256> {
    if domain.system() != NamingSystem::UnstoppableDomains {
        return Err(ResolveError::invalid_params());
    }
    Ok(U256::from_be_bytes(domain.namehash().0))
}

/// Walks per-chain results in priority order.
fn merge<T>(
    domain: &Domain,
    readers: &[ProxyReader],
    results: Vec<Result<Outcome<T>>>,
) -> Result<Outcome<T>> {
    for (reader, result) in readers.iter().zip(results) {
        match result {
            Ok(Outcome::NoRecord) => {
                tracing::debug!(%domain, chain = %reader.chain, "no record, trying next chain");
            }
            Ok(outcome) => {
                tracing::debug!(%domain, chain = %reader.chain, "record found");
                return Ok(outcome);
            }
            Err(e) => {
                tracing::debug!(%domain, chain = %reader.chain, error = %e, "chain lookup failed");
                return Err(e);
            }
        }
    }
    Ok(Outcome::NoRecord)
}
