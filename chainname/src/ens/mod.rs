//! ENS resolution with ENSIP-10 and CCIP-Read support.
//!
//! Every request re-runs the full pipeline against the registry:
//!
//! 1. `resolver(namehash)` on the registry; a zero address means the name
//!    has no resolver and fails with `InternalError`.
//! 2. `supportsInterface(0x9061b923)` on the resolver. Any failure counts as
//!    "not supported".
//! 3. Without ENSIP-10, `addr(node)` / `contenthash(node)` is called directly.
//!    With it, the same call data is wrapped in
//!    `resolve(dnsEncode(name), data)`.
//! 4. A `resolve` that reverts with `OffchainLookup` goes through the consent
//!    gate and then [`CcipReader`].
//!
//! A zero address is reported as `InvalidParams` on every path. An empty
//! content hash is "no record" from a direct call but `InvalidParams` when it
//! came through `resolve`.

mod contenthash;

use std::sync::Arc;

use alloy::primitives::{Address, B256, Bytes, FixedBytes};
use alloy::sol_types::SolCall;
use url::Url;

pub use contenthash::contenthash_to_url;

use crate::chain::Chain;
use crate::consent::{ConsentDecision, ConsentGate, OffchainLookupOptions};
use crate::contracts::{self, sol};
use crate::error::{ResolveError, Result};
use crate::names::Domain;
use crate::offchain::{CcipReader, GatewayClient, OffchainLookup};
use crate::outcome::Outcome;
use crate::rpc::{CallError, RpcClient};

/// How a record was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordSource {
    /// `addr` / `contenthash` called on the resolver.
    Direct,
    /// `resolve(bytes,bytes)` answered on-chain.
    Extended,
    /// `resolve(bytes,bytes)` deferred to a gateway.
    Offchain,
}

/// A decoded record plus the path that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<T> {
    /// Decoded return value of the record call.
    pub value: T,
    /// Path that produced it.
    pub source: RecordSource,
}

/// Resolver for `*.eth` names on one chain.
#[derive(Debug, Clone)]
pub struct EnsResolver {
    rpc: Arc<RpcClient>,
    gateway: GatewayClient,
    consent: ConsentGate,
    chain: Chain,
    registry: Address,
    max_lookups: usize,
}

impl EnsResolver {
    /// Creates a resolver reading `registry` on `chain`.
    #[must_use]
    pub const fn new(
        rpc: Arc<RpcClient>,
        gateway: GatewayClient,
        consent: ConsentGate,
        chain: Chain,
        registry: Address,
        max_lookups: usize,
    ) -> Self {
        Self {
            rpc,
            gateway,
            consent,
            chain,
            registry,
            max_lookups,
        }
    }

    /// Chain the registry lives on.
    #[must_use]
    pub const fn chain(&self) -> Chain {
        self.chain
    }

    /// Looks up the resolver contract for `node`.
    ///
    /// # Errors
    ///
    /// `InternalError` when no resolver is registered; call and decode
    /// failures are mapped as usual.
    pub async fn find_resolver(&self, node: B256) -> Result<Address> {
        let call = sol::EnsRegistry::resolverCall { node }.abi_encode();
        let data = self.rpc.eth_call(self.chain, self.registry, &call).await?;
        let resolver = sol::EnsRegistry::resolverCall::abi_decode_returns(&data)?;
        if resolver.is_zero() {
            tracing::debug!(%node, "no resolver registered");
            return Err(ResolveError::internal());
        }
        tracing::debug!(%node, %resolver, "resolver located");
        Ok(resolver)
    }

    /// Whether `resolver` implements ENSIP-10 `resolve(bytes,bytes)`.
    ///
    /// Never fails: errors fall back to the direct path.
    pub async fn supports_extended_resolution(&self, resolver: Address) -> bool {
        let call = sol::IERC165::supportsInterfaceCall {
            interfaceId: FixedBytes(contracts::ENSIP10_INTERFACE_ID),
        }
        .abi_encode();
        let supported = match self.rpc.eth_call(self.chain, resolver, &call).await {
            Ok(data) => sol::IERC165::supportsInterfaceCall::abi_decode_returns(&data)
                .unwrap_or(false),
            Err(e) => {
                tracing::debug!(%resolver, error = %e, "supportsInterface failed");
                false
            }
        };
        tracing::debug!(%resolver, supported, "ENSIP-10 support checked");
        supported
    }

    /// Resolves the address record of `domain`.
    ///
    /// # Errors
    ///
    /// `InvalidParams` for a zero address; see [`EnsResolver::lookup`].
    pub async fn resolve_address(
        &self,
        domain: &Domain,
        options: Option<OffchainLookupOptions>,
    ) -> Result<Outcome<Address>> {
        let record = match self
            .lookup(domain, |node| sol::IAddrResolver::addrCall { node }, options)
            .await?
        {
            Outcome::Value(record) => record,
            Outcome::NoRecord => return Ok(Outcome::NoRecord),
            Outcome::ConsentRequired => return Ok(Outcome::ConsentRequired),
        };
        if record.value.is_zero() {
            tracing::debug!(%domain, source = ?record.source, "zero address record");
            return Err(ResolveError::invalid_params());
        }
        Ok(Outcome::Value(record.value))
    }

    /// Resolves the content hash record of `domain`.
    ///
    /// # Errors
    ///
    /// `InvalidParams` for an empty hash returned through `resolve`; see
    /// [`EnsResolver::lookup`].
    pub async fn resolve_content_hash(
        &self,
        domain: &Domain,
        options: Option<OffchainLookupOptions>,
    ) -> Result<Outcome<Bytes>> {
        match self.content_hash(domain, options).await? {
            Outcome::Value(Record {
                value,
                source: RecordSource::Direct,
            }) if value.is_empty() => Ok(Outcome::NoRecord),
            Outcome::Value(record) if record.value.is_empty() => {
                Err(ResolveError::invalid_params())
            }
            other => Ok(other.map(|record| record.value)),
        }
    }

    /// Resolves the web URL of `domain` from its content hash.
    ///
    /// An empty or unconvertible content hash is "no record".
    ///
    /// # Errors
    ///
    /// See [`EnsResolver::lookup`].
    pub async fn resolve_dns(
        &self,
        domain: &Domain,
        options: Option<OffchainLookupOptions>,
    ) -> Result<Outcome<Url>> {
        let outcome = self.content_hash(domain, options).await?;
        Ok(outcome.and_then(|record| {
            contenthash_to_url(&record.value).map_or(Outcome::NoRecord, Outcome::Value)
        }))
    }

    async fn content_hash(
        &self,
        domain: &Domain,
        options: Option<OffchainLookupOptions>,
    ) -> Result<Outcome<Record<Bytes>>> {
        self.lookup(
            domain,
            |node| sol::IContentHashResolver::contenthashCall { node },
            options,
        )
        .await
    }

    /// Runs the record pipeline for the call `record(namehash)` and decodes
    /// its return value.
    ///
    /// # Errors
    ///
    /// * `InternalError`: no resolver, gateway failure, consent denied.
    /// * `ParsingError`: malformed return or revert data.
    /// * RPC failures mapped per JSON-RPC error code.
    pub async fn lookup<C: SolCall>(
        &self,
        domain: &Domain,
        record: impl FnOnce(B256) -> C + Send,
        options: Option<OffchainLookupOptions>,
    ) -> Result<Outcome<Record<C::Return>>> {
        let node = domain.namehash();
        let resolver = self.find_resolver(node).await?;
        let record_call = record(node).abi_encode();

        if !self.supports_extended_resolution(resolver).await {
            let data = self.rpc.eth_call(self.chain, resolver, &record_call).await?;
            return Ok(Outcome::Value(Record {
                value: C::abi_decode_returns(&data)?,
                source: RecordSource::Direct,
            }));
        }

        let resolve_call = sol::IExtendedResolver::resolveCall {
            name: domain.dns_encode()?,
            data: record_call.into(),
        }
        .abi_encode();

        let (data, source) = match self.rpc.eth_call(self.chain, resolver, &resolve_call).await {
            Ok(data) => (data, RecordSource::Extended),
            Err(CallError::Revert { data }) if OffchainLookup::matches(&data) => {
                tracing::debug!(%domain, %resolver, "offchain lookup requested");
                match self.consent.check(options).await? {
                    ConsentDecision::RequiresPrompt => return Ok(Outcome::ConsentRequired),
                    ConsentDecision::Deny => {
                        tracing::debug!(%domain, "offchain lookup denied");
                        return Err(ResolveError::internal());
                    }
                    ConsentDecision::Allow => {}
                }
                let reader = CcipReader::new(&self.rpc, &self.gateway, self.max_lookups);
                let data = reader.follow(self.chain, resolver, &data).await?;
                (data, RecordSource::Offchain)
            }
            Err(e) => return Err(e.into()),
        };

        // `resolve` and `resolveCallback` both wrap the record's return data
        // in `bytes`.
        let inner = sol::IExtendedResolver::resolveCall::abi_decode_returns(&data)?;
        Ok(Outcome::Value(Record {
            value: C::abi_decode_returns(&inner)?,
            source,
        }))
    }
}
