//! Resolver configuration.
//!
//! Settings come from, in increasing priority:
//! 1. Built-in defaults (public endpoints, published contract addresses)
//! 2. A TOML document
//! 3. Environment variables (`CHAINNAME_ETH_RPC_URL`, `CHAINNAME_POLYGON_RPC_URL`)
//!
//! Values are kept as written and validated by the accessor methods, which
//! [`NameServiceBuilder::build`](crate::service::NameServiceBuilder::build)
//! calls once.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::chain::Chain;
use crate::contracts;
use crate::offchain::{DEFAULT_MAX_LOOKUPS, GatewayPolicy};
use crate::unstoppable::ProxyReader;

/// Overrides the Ethereum RPC endpoint.
pub const ENV_ETH_RPC_URL: &str = "CHAINNAME_ETH_RPC_URL";
/// Overrides the Polygon RPC endpoint.
pub const ENV_POLYGON_RPC_URL: &str = "CHAINNAME_POLYGON_RPC_URL";

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// TOML serialization error.
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    /// Invalid value.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
    /// The HTTP client could not be created.
    #[error("HTTP client error: {0}")]
    Http(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// JSON-RPC endpoints, one per chain.
    #[serde(default = "default_networks")]
    pub networks: Vec<NetworkConfig>,

    /// ENS registry location.
    #[serde(default)]
    pub ens: EnsConfig,

    /// Unstoppable Domains readers.
    #[serde(default)]
    pub unstoppable: UnstoppableConfig,

    /// Off-chain gateway behavior.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            networks: default_networks(),
            ens: EnsConfig::default(),
            unstoppable: UnstoppableConfig::default(),
            gateway: GatewayConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

/// JSON-RPC endpoint for one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Numeric chain ID.
    pub chain_id: u64,
    /// Endpoint URL.
    pub rpc_url: String,
}

fn default_networks() -> Vec<NetworkConfig> {
    vec![
        NetworkConfig {
            chain_id: Chain::Ethereum.id(),
            rpc_url: "https://ethereum-rpc.publicnode.com".to_owned(),
        },
        NetworkConfig {
            chain_id: Chain::Polygon.id(),
            rpc_url: "https://polygon-bor-rpc.publicnode.com".to_owned(),
        },
    ]
}

/// ENS settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnsConfig {
    /// Chain the registry lives on.
    #[serde(default = "default_ens_chain")]
    pub chain_id: u64,
    /// Registry address.
    #[serde(default = "default_registry")]
    pub registry: String,
}

const fn default_ens_chain() -> u64 {
    1
}

fn default_registry() -> String {
    contracts::ENS_REGISTRY.to_string()
}

impl Default for EnsConfig {
    fn default() -> Self {
        Self {
            chain_id: default_ens_chain(),
            registry: default_registry(),
        }
    }
}

/// Unstoppable Domains settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnstoppableConfig {
    /// ProxyReader contracts, highest priority first.
    #[serde(default = "default_readers")]
    pub readers: Vec<ReaderConfig>,
}

impl Default for UnstoppableConfig {
    fn default() -> Self {
        Self {
            readers: default_readers(),
        }
    }
}

/// One ProxyReader deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Numeric chain ID.
    pub chain_id: u64,
    /// Contract address.
    pub address: String,
}

fn default_readers() -> Vec<ReaderConfig> {
    ProxyReader::defaults()
        .into_iter()
        .map(|reader| ReaderConfig {
            chain_id: reader.chain.id(),
            address: reader.address.to_string(),
        })
        .collect()
}

/// Off-chain gateway settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Try every gateway URL in order instead of only the first.
    #[serde(default)]
    pub try_all_urls: bool,
    /// Maximum chained off-chain lookups per resolution.
    #[serde(default = "default_max_lookups")]
    pub max_lookups: usize,
}

const fn default_max_lookups() -> usize {
    DEFAULT_MAX_LOOKUPS
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            try_all_urls: false,
            max_lookups: default_max_lookups(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ResolverConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TomlParse`] for malformed TOML or unknown keys.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serializes to pretty TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TomlSerialize`] if serialization fails.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Loads `path`, falling back to defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// IO and parse errors.
    pub async fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !tokio::fs::try_exists(path).await? {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Writes the config to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// IO and serialization errors.
    pub async fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, self.to_toml_string()?).await?;
        debug!(path = %path.display(), "saved config file");
        Ok(())
    }

    /// Applies `CHAINNAME_*` environment overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up by environment variable name.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        for (var, chain) in [
            (ENV_ETH_RPC_URL, Chain::Ethereum),
            (ENV_POLYGON_RPC_URL, Chain::Polygon),
        ] {
            if let Some(url) = lookup(var).filter(|v| !v.is_empty()) {
                debug!(%chain, var, "RPC endpoint overridden");
                self.set_rpc_url(chain, url);
            }
        }
        self
    }

    /// Sets the endpoint for `chain`, adding it if missing.
    pub fn set_rpc_url(&mut self, chain: Chain, rpc_url: impl Into<String>) {
        let rpc_url = rpc_url.into();
        match self.networks.iter_mut().find(|n| n.chain_id == chain.id()) {
            Some(network) => network.rpc_url = rpc_url,
            None => self.networks.push(NetworkConfig {
                chain_id: chain.id(),
                rpc_url,
            }),
        }
    }

    /// Validated endpoints.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for a malformed URL or a chain listed
    /// twice.
    pub fn endpoints(&self) -> ConfigResult<Vec<(Chain, Url)>> {
        let mut endpoints: Vec<(Chain, Url)> = Vec::with_capacity(self.networks.len());
        for network in &self.networks {
            let chain = Chain::from_id(network.chain_id);
            if endpoints.iter().any(|(c, _)| *c == chain) {
                return Err(ConfigError::InvalidValue(format!(
                    "network {chain} is configured twice"
                )));
            }
            let url = Url::parse(&network.rpc_url).map_err(|e| {
                ConfigError::InvalidValue(format!("rpc_url for {chain}: {e}"))
            })?;
            endpoints.push((chain, url));
        }
        Ok(endpoints)
    }

    /// The ENS registry and its chain.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for a malformed address.
    pub fn ens_registry(&self) -> ConfigResult<(Chain, Address)> {
        Ok((
            Chain::from_id(self.ens.chain_id),
            parse_address("ens.registry", &self.ens.registry)?,
        ))
    }

    /// ProxyReaders in priority order.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for a malformed address.
    pub fn proxy_readers(&self) -> ConfigResult<Vec<ProxyReader>> {
        self.unstoppable
            .readers
            .iter()
            .map(|reader| {
                Ok(ProxyReader::new(
                    Chain::from_id(reader.chain_id),
                    parse_address("unstoppable.readers.address", &reader.address)?,
                ))
            })
            .collect()
    }

    /// Gateway URL policy.
    #[must_use]
    pub const fn gateway_policy(&self) -> GatewayPolicy {
        if self.gateway.try_all_urls {
            GatewayPolicy::Sequential
        } else {
            GatewayPolicy::FirstOnly
        }
    }

    /// HTTP request timeout.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}

fn parse_address(field: &str, value: &str) -> ConfigResult<Address> {
    Address::from_str(value).map_err(|e| ConfigError::InvalidValue(format!("{field}: {e}")))
}
