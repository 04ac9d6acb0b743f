//! Chainname - decentralized domain name resolution
//!
//! Resolves blockchain domains (`*.eth`, `*.crypto`, `*.x`, ...) to addresses,
//! content hashes and DNS-style web records by driving contract reads over
//! JSON-RPC. ENS resolvers that implement ENSIP-10 may defer an answer to an
//! off-chain gateway (CCIP-Read); that fallback is gated behind a persisted
//! user consent. Unstoppable Domains records are read from two chains at once
//! and merged in priority order.
//!
//! # Architecture
//!
//! ```text
//! NameService
//!   → names (validate, namehash, DNS wire encoding)
//!   → ens::EnsResolver ─ registry → ERC-165 check → addr/contenthash | resolve(bytes,bytes)
//!       └─ offchain::CcipReader ─ consent::ConsentGate → gateway → resolveCallback
//!   → unstoppable::UnstoppableResolver ─ ProxyReader per chain, joined and merged
//!   → rpc::RpcClient ─ transport::HttpTransport (reqwest, mock)
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use chainname::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = NameService::builder(ResolverConfig::default()).build()?;
//!
//! match service.resolve_address("vitalik.eth", None).await? {
//!     Outcome::Value(address) => println!("{address}"),
//!     Outcome::NoRecord => println!("no record"),
//!     Outcome::ConsentRequired => println!("off-chain lookup needs consent"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod chain;
pub mod config;
pub mod consent;
pub mod contracts;
pub mod ens;
pub mod error;
pub mod inflight;
pub mod names;
pub mod offchain;
pub mod outcome;
pub mod prelude;
pub mod rpc;
pub mod service;
pub mod transport;
pub mod unstoppable;

pub use chain::Chain;
pub use error::{ProviderError, ResolveError, Result};
pub use outcome::{Outcome, RecordKind, ResolutionResponse};
pub use service::NameService;
