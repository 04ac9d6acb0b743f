//! Error taxonomy surfaced to callers.
//!
//! Every lower-layer failure (ABI decoding, transport, JSON-RPC, gateway,
//! consent storage) is translated into a single [`ResolveError`] whose
//! [`ProviderError`] kind is one of a small, stable set. Raw transport or codec
//! errors never cross the public resolution API.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consent::StoreError;
use crate::names::NameError;
use crate::offchain::GatewayError;
use crate::rpc::CallError;

/// Result type alias for resolution operations.
pub type Result<T, E = ResolveError> = std::result::Result<T, E>;

/// JSON-RPC error code some providers use for rate limiting.
pub const LIMIT_EXCEEDED_CODE: i64 = -32005;

/// Kind of outcome reported to callers.
///
/// `Success` only appears in the flattened
/// [`ResolutionResponse`](crate::outcome::ResolutionResponse); a
/// [`ResolveError`] never carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderError {
    /// The request completed.
    Success,
    /// Malformed or empty arguments, or a record the caller treats as invalid.
    InvalidParams,
    /// The domain failed its naming system's normalization rules.
    InvalidDomain,
    /// Transport failure, timeout, missing resolver or gateway failure.
    InternalError,
    /// Malformed JSON-RPC envelope or ABI decode failure.
    ParsingError,
    /// The upstream node rate-limited the request.
    LimitExceeded,
    /// The naming system or chain is not supported by this configuration.
    MethodNotSupported,
}

impl ProviderError {
    /// Message used when no upstream message is available.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::Success => "",
            Self::InvalidParams => "Invalid parameters, check your input",
            Self::InvalidDomain => "Invalid domain name",
            Self::InternalError => "An internal error has occurred",
            Self::ParsingError => "Error parsing response",
            Self::LimitExceeded => "Request exceeds defined limit",
            Self::MethodNotSupported => "Method not supported",
        }
    }

    /// Returns `true` for [`ProviderError::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "success",
            Self::InvalidParams => "invalid_params",
            Self::InvalidDomain => "invalid_domain",
            Self::InternalError => "internal_error",
            Self::ParsingError => "parsing_error",
            Self::LimitExceeded => "limit_exceeded",
            Self::MethodNotSupported => "method_not_supported",
        };
        f.write_str(name)
    }
}

/// Error returned by every resolution entry point.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ResolveError {
    kind: ProviderError,
    message: String,
}

impl ResolveError {
    /// Create an error with an explicit message.
    #[must_use]
    pub fn new(kind: ProviderError, message: impl Into<String>) -> Self {
        debug_assert!(!kind.is_success(), "a ResolveError cannot be a success");
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create an error carrying the kind's default message.
    #[must_use]
    pub fn from_kind(kind: ProviderError) -> Self {
        Self::new(kind, kind.default_message())
    }

    /// Create an invalid params error.
    #[must_use]
    pub fn invalid_params() -> Self {
        Self::from_kind(ProviderError::InvalidParams)
    }

    /// Create an invalid domain error.
    #[must_use]
    pub fn invalid_domain() -> Self {
        Self::from_kind(ProviderError::InvalidDomain)
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal() -> Self {
        Self::from_kind(ProviderError::InternalError)
    }

    /// Create a parsing error.
    #[must_use]
    pub fn parsing() -> Self {
        Self::from_kind(ProviderError::ParsingError)
    }

    /// Create a rate limit error with the upstream message.
    #[must_use]
    pub fn limit_exceeded(message: impl Into<String>) -> Self {
        Self::new(ProviderError::LimitExceeded, message)
    }

    /// Create a method not supported error.
    #[must_use]
    pub fn method_not_supported(message: impl Into<String>) -> Self {
        Self::new(ProviderError::MethodNotSupported, message)
    }

    /// The error kind.
    #[must_use]
    pub const fn kind(&self) -> ProviderError {
        self.kind
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<alloy::sol_types::Error> for ResolveError {
    fn from(e: alloy::sol_types::Error) -> Self {
        tracing::debug!(error = %e, "ABI decode failed");
        Self::parsing()
    }
}

impl From<NameError> for ResolveError {
    fn from(e: NameError) -> Self {
        match e {
            NameError::Empty => Self::invalid_params(),
            NameError::UnknownSuffix(_)
            | NameError::Invalid { .. }
            | NameError::LabelTooLong(_) => Self::invalid_domain(),
        }
    }
}

impl From<CallError> for ResolveError {
    fn from(e: CallError) -> Self {
        match e {
            CallError::UnsupportedChain(chain) => {
                Self::method_not_supported(format!("no RPC endpoint configured for {chain}"))
            }
            CallError::Parsing(detail) => {
                tracing::debug!(%detail, "malformed JSON-RPC response");
                Self::parsing()
            }
            CallError::LimitExceeded(message) => Self::limit_exceeded(message),
            CallError::Rpc { code, message } => match code {
                -32700 => Self::new(ProviderError::ParsingError, message),
                -32602 => Self::new(ProviderError::InvalidParams, message),
                -32601 => Self::method_not_supported(message),
                _ => Self::new(ProviderError::InternalError, message),
            },
            CallError::Timeout | CallError::Transport(_) | CallError::HttpStatus(_) => {
                tracing::debug!(error = %e, "eth_call transport failure");
                Self::internal()
            }
            CallError::Revert { .. } => Self::internal(),
        }
    }
}

impl From<GatewayError> for ResolveError {
    fn from(e: GatewayError) -> Self {
        tracing::warn!(error = %e, "off-chain gateway request failed");
        Self::internal()
    }
}

impl From<StoreError> for ResolveError {
    fn from(e: StoreError) -> Self {
        tracing::warn!(error = %e, "consent store unavailable");
        Self::internal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_messages() {
        let err = ResolveError::internal();
        assert_eq!(err.kind(), ProviderError::InternalError);
        assert_eq!(err.message(), "An internal error has occurred");
        assert_eq!(err.to_string(), err.message());
    }

    #[test]
    fn test_rpc_codes_map_to_kinds() {
        let limit: ResolveError = CallError::LimitExceeded("Error!".to_owned()).into();
        assert_eq!(limit.kind(), ProviderError::LimitExceeded);
        assert_eq!(limit.message(), "Error!");

        let parse: ResolveError = CallError::Rpc {
            code: -32700,
            message: "bad json".to_owned(),
        }
        .into();
        assert_eq!(parse.kind(), ProviderError::ParsingError);

        let other: ResolveError = CallError::Rpc {
            code: -32099,
            message: "boom".to_owned(),
        }
        .into();
        assert_eq!(other.kind(), ProviderError::InternalError);
        assert_eq!(other.message(), "boom");

        let timeout: ResolveError = CallError::Timeout.into();
        assert_eq!(timeout.kind(), ProviderError::InternalError);
    }

    #[test]
    fn test_name_errors() {
        assert_eq!(
            ResolveError::from(NameError::Empty).kind(),
            ProviderError::InvalidParams
        );
        assert_eq!(
            ResolveError::from(NameError::UnknownSuffix("brad.test".to_owned())).kind(),
            ProviderError::InvalidDomain
        );
    }

    #[test]
    fn test_provider_error_serde() {
        let json = serde_json::to_string(&ProviderError::LimitExceeded).unwrap();
        assert_eq!(json, "\"limit_exceeded\"");
        assert_eq!(ProviderError::MethodNotSupported.to_string(), "method_not_supported");
    }

    #[test]
    fn test_decode_errors_are_parsing_errors() {
        use alloy::sol_types::SolCall;

        let err = crate::contracts::sol::IAddrResolver::addrCall::abi_decode_returns(&[0u8; 3])
            .unwrap_err();
        assert_eq!(ResolveError::from(err).kind(), ProviderError::ParsingError);
    }
}
