//! Caller-facing resolution service.
//!
//! [`NameService`] validates the domain, picks the naming system from its
//! suffix and runs the matching resolver. Invalid input is rejected before
//! any network request. Concurrent requests for the same domain, record
//! kind, chain and consent options share one pipeline run.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes};
use tracing::{debug, instrument};
use url::Url;

use crate::config::{ConfigError, ResolverConfig};
use crate::consent::{ConsentGate, ConsentStore, InMemoryConsentStore, OffchainLookupOptions};
use crate::ens::EnsResolver;
use crate::error::{ResolveError, Result};
use crate::inflight::{Inflight, RequestKey};
use crate::names::{Domain, NamingSystem};
use crate::offchain::GatewayClient;
use crate::outcome::{Outcome, RecordKind};
use crate::rpc::RpcClient;
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::unstoppable::UnstoppableResolver;

/// Resolves blockchain domains to addresses, content hashes and URLs.
///
/// Cheap to clone; clones share resolvers, consent state and in-flight
/// requests.
#[derive(Debug, Clone)]
pub struct NameService {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    ens: EnsResolver,
    unstoppable: UnstoppableResolver,
    consent: ConsentGate,
    ens_addresses: Inflight<RequestKey, Outcome<Address>>,
    ens_content_hashes: Inflight<RequestKey, Outcome<Bytes>>,
    ens_urls: Inflight<RequestKey, Outcome<Url>>,
}

impl NameService {
    /// Starts building a service from `config`.
    #[must_use]
    pub fn builder(config: ResolverConfig) -> NameServiceBuilder {
        NameServiceBuilder::new(config)
    }

    /// The consent gate shared by every off-chain lookup.
    #[must_use]
    pub fn consent(&self) -> &ConsentGate {
        &self.inner.consent
    }

    /// The ENS resolver.
    #[must_use]
    pub fn ens(&self) -> &EnsResolver {
        &self.inner.ens
    }

    /// The Unstoppable Domains resolver.
    #[must_use]
    pub fn unstoppable(&self) -> &UnstoppableResolver {
        &self.inner.unstoppable
    }

    /// Resolves the Ethereum address of `domain`.
    ///
    /// ENS addresses are EIP-55 checksummed; Unstoppable Domains addresses
    /// are returned as stored. `options` only matter when an ENS resolver
    /// defers to an off-chain gateway.
    ///
    /// # Errors
    ///
    /// `InvalidParams` for empty input or a zero ENS address,
    /// `InvalidDomain` for names failing validation, and the network error
    /// kinds described on [`ResolveError`].
    #[instrument(skip(self), fields(system))]
    pub async fn resolve_address(
        &self,
        domain: &str,
        options: Option<OffchainLookupOptions>,
    ) -> Result<Outcome<String>> {
        let domain = Domain::parse(domain)?;
        tracing::Span::current().record("system", tracing::field::debug(domain.system()));
        match domain.system() {
            NamingSystem::Ens => {
                let key = self.ens_key(&domain, RecordKind::Address, options);
                let ens = self.inner.ens.clone();
                let outcome = self
                    .inner
                    .ens_addresses
                    .run(key, move || async move {
                        ens.resolve_address(&domain, options).await
                    })
                    .await?;
                Ok(outcome.map(|address| address.to_checksum(None)))
            }
            NamingSystem::UnstoppableDomains => {
                self.inner.unstoppable.resolve_address(&domain).await
            }
        }
    }

    /// Resolves the EIP-1577 content hash of an ENS `domain`.
    ///
    /// # Errors
    ///
    /// `MethodNotSupported` for Unstoppable Domains names; otherwise as
    /// [`NameService::resolve_address`].
    #[instrument(skip(self))]
    pub async fn resolve_content_hash(
        &self,
        domain: &str,
        options: Option<OffchainLookupOptions>,
    ) -> Result<Outcome<Bytes>> {
        let domain = Domain::parse(domain)?;
        match domain.system() {
            NamingSystem::Ens => {
                let key = self.ens_key(&domain, RecordKind::ContentHash, options);
                let ens = self.inner.ens.clone();
                self.inner
                    .ens_content_hashes
                    .run(key, move || async move {
                        ens.resolve_content_hash(&domain, options).await
                    })
                    .await
            }
            NamingSystem::UnstoppableDomains => {
                debug!(%domain, "content hash requested for an Unstoppable Domains name");
                Err(ResolveError::method_not_supported(
                    "content hash is not available for Unstoppable Domains names",
                ))
            }
        }
    }

    /// Resolves the web URL of `domain`.
    ///
    /// ENS names use their content hash; Unstoppable Domains names use their
    /// DNS-style records. A domain without a usable record yields
    /// [`Outcome::NoRecord`].
    ///
    /// # Errors
    ///
    /// As [`NameService::resolve_address`].
    #[instrument(skip(self))]
    pub async fn resolve_dns(
        &self,
        domain: &str,
        options: Option<OffchainLookupOptions>,
    ) -> Result<Outcome<Url>> {
        let domain = Domain::parse(domain)?;
        match domain.system() {
            NamingSystem::Ens => {
                let key = self.ens_key(&domain, RecordKind::DnsRecord, options);
                let ens = self.inner.ens.clone();
                self.inner
                    .ens_urls
                    .run(key, move || async move { ens.resolve_dns(&domain, options).await })
                    .await
            }
            NamingSystem::UnstoppableDomains => self.inner.unstoppable.resolve_dns(&domain).await,
        }
    }

    fn ens_key(
        &self,
        domain: &Domain,
        kind: RecordKind,
        options: Option<OffchainLookupOptions>,
    ) -> RequestKey {
        RequestKey::new(domain, kind, self.inner.ens.chain(), options)
    }
}

/// Builder for [`NameService`].
#[derive(Debug)]
pub struct NameServiceBuilder {
    config: ResolverConfig,
    transport: Option<Arc<dyn HttpTransport>>,
    consent_store: Option<Arc<dyn ConsentStore>>,
}

impl NameServiceBuilder {
    /// Creates a builder using `config`.
    #[must_use]
    pub const fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            transport: None,
            consent_store: None,
        }
    }

    /// Sets the HTTP transport. Defaults to [`ReqwestTransport`].
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the consent store. Defaults to [`InMemoryConsentStore`].
    #[must_use]
    pub fn consent_store(mut self, store: Arc<dyn ConsentStore>) -> Self {
        self.consent_store = Some(store);
        self
    }

    /// Validates the configuration and builds the service.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for malformed endpoints or addresses,
    /// [`ConfigError::Http`] if the default HTTP client cannot be created.
    pub fn build(self) -> Result<NameService, ConfigError> {
        let config = self.config;
        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                ReqwestTransport::new(config.http_timeout())
                    .map_err(|e| ConfigError::Http(e.to_string()))?,
            ),
        };

        let rpc = config
            .endpoints()?
            .into_iter()
            .fold(RpcClient::new(Arc::clone(&transport)), |rpc, (chain, url)| {
                rpc.with_endpoint(chain, url)
            });
        let rpc = Arc::new(rpc);

        let store: Arc<dyn ConsentStore> = match self.consent_store {
            Some(store) => store,
            None => Arc::new(InMemoryConsentStore::new()),
        };
        let consent = ConsentGate::new(store);
        let (ens_chain, registry) = config.ens_registry()?;
        let ens = EnsResolver::new(
            Arc::clone(&rpc),
            GatewayClient::new(transport, config.gateway_policy()),
            consent.clone(),
            ens_chain,
            registry,
            config.gateway.max_lookups,
        );
        let unstoppable = UnstoppableResolver::new(rpc, config.proxy_readers()?);

        debug!(
            %ens_chain,
            %registry,
            readers = unstoppable.readers().len(),
            policy = ?config.gateway_policy(),
            "name service ready"
        );

        Ok(NameService {
            inner: Arc::new(Inner {
                ens,
                unstoppable,
                consent,
                ens_addresses: Inflight::new(),
                ens_content_hashes: Inflight::new(),
                ens_urls: Inflight::new(),
            }),
        })
    }
}
