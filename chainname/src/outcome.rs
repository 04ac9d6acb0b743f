//! Successful resolution outcomes and the flattened caller-facing response.

use std::fmt;

use serde::Serialize;

use crate::error::{ProviderError, ResolveError};

/// Kind of record requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// The domain's Ethereum address.
    Address,
    /// The EIP-1577 content hash.
    ContentHash,
    /// The web URL derived from DNS-style records.
    DnsRecord,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Address => "address",
            Self::ContentHash => "content_hash",
            Self::DnsRecord => "dns_record",
        })
    }
}

/// A resolution that did not fail.
///
/// Neither `NoRecord` nor `ConsentRequired` is an error: the first is an
/// empty answer, the second asks the caller to retry with explicit consent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The record value.
    Value(T),
    /// The domain has no such record.
    NoRecord,
    /// An off-chain lookup is needed and consent has not been given.
    ConsentRequired,
}

impl<T> Outcome<T> {
    /// Returns the value, if any.
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            Self::NoRecord | Self::ConsentRequired => None,
        }
    }

    /// Borrows the value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            Self::NoRecord | Self::ConsentRequired => None,
        }
    }

    /// Whether the caller must retry with explicit consent.
    #[must_use]
    pub const fn requires_consent(&self) -> bool {
        matches!(self, Self::ConsentRequired)
    }

    /// Whether the domain has no such record.
    #[must_use]
    pub const fn is_no_record(&self) -> bool {
        matches!(self, Self::NoRecord)
    }

    /// Maps the value, keeping the other variants.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Value(v) => Outcome::Value(f(v)),
            Self::NoRecord => Outcome::NoRecord,
            Self::ConsentRequired => Outcome::ConsentRequired,
        }
    }

    /// Maps the value to another outcome.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Self::Value(v) => f(v),
            Self::NoRecord => Outcome::NoRecord,
            Self::ConsentRequired => Outcome::ConsentRequired,
        }
    }
}

/// Flat `(value, requires_offchain_consent, error, error_message)` view of a
/// resolution result.
///
/// ```rust
/// use chainname::{Outcome, ProviderError, ResolutionResponse};
///
/// let response = ResolutionResponse::from(Ok(Outcome::<String>::ConsentRequired));
/// assert!(response.requires_offchain_consent);
/// assert_eq!(response.error, ProviderError::Success);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionResponse<T> {
    /// The record value; `None` when absent, pending consent or failed.
    pub value: Option<T>,
    /// Set when the caller must retry with explicit consent.
    pub requires_offchain_consent: bool,
    /// [`ProviderError::Success`] unless the resolution failed.
    pub error: ProviderError,
    /// Empty on success.
    pub error_message: String,
}

impl<T> From<Result<Outcome<T>, ResolveError>> for ResolutionResponse<T> {
    fn from(result: Result<Outcome<T>, ResolveError>) -> Self {
        match result {
            Ok(outcome) => Self {
                requires_offchain_consent: outcome.requires_consent(),
                value: outcome.into_value(),
                error: ProviderError::Success,
                error_message: String::new(),
            },
            Err(e) => Self {
                value: None,
                requires_offchain_consent: false,
                error: e.kind(),
                error_message: e.message().to_owned(),
            },
        }
    }
}
