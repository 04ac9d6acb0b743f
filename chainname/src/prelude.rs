//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```rust,ignore
//! use chainname::prelude::*;
//! ```

pub use crate::chain::Chain;
pub use crate::config::{ConfigError, ResolverConfig};
pub use crate::consent::{
    ConsentDecision, ConsentGate, ConsentState, ConsentStore, FileConsentStore,
    InMemoryConsentStore, OffchainLookupOptions,
};
pub use crate::error::{ProviderError, ResolveError, Result};
pub use crate::names::{Domain, NamingSystem};
pub use crate::offchain::GatewayPolicy;
pub use crate::outcome::{Outcome, RecordKind, ResolutionResponse};
pub use crate::service::{NameService, NameServiceBuilder};
pub use crate::transport::{HttpTransport, ReqwestTransport};
