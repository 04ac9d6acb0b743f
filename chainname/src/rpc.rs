//! Contract reads over JSON-RPC.
//!
//! [`RpcClient::eth_call`] is a thin, stateless pass-through: it picks the
//! endpoint configured for a chain, posts one `eth_call` against the latest
//! block and classifies the reply. Reverts carrying data are surfaced as
//! [`CallError::Revert`] so callers can look for an `OffchainLookup`.
//!
//! Request and response envelopes are alloy's JSON-RPC types; only the
//! transport underneath is ours.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use alloy::primitives::{Address, Bytes, hex};
use alloy::rpc::json_rpc::{ErrorPayload, Id, Request, Response, ResponsePayload};
use serde_json::json;
use url::Url;

use crate::chain::Chain;
use crate::error::LIMIT_EXCEEDED_CODE;
use crate::transport::{HttpTransport, TransportError};

/// JSON-RPC error codes nodes use for a reverted `eth_call`.
const REVERT_CODES: [i64; 2] = [3, -32000];

/// Error from a single contract read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    /// No RPC endpoint is configured for the chain.
    #[error("no RPC endpoint configured for {0}")]
    UnsupportedChain(Chain),

    /// The request timed out.
    #[error("eth_call timed out")]
    Timeout,

    /// The request could not be sent or its body not read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The node answered with a non-2xx status.
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    /// The reply is not a well-formed JSON-RPC envelope.
    #[error("malformed JSON-RPC response: {0}")]
    Parsing(String),

    /// The node rate-limited the request.
    #[error("rate limited: {0}")]
    LimitExceeded(String),

    /// The node returned an error other than a revert.
    #[error("JSON-RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Upstream message.
        message: String,
    },

    /// The call reverted with data.
    #[error("execution reverted with {} bytes of data", .data.len())]
    Revert {
        /// Raw revert data, selector included.
        data: Bytes,
    },
}

impl From<TransportError> for CallError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Timeout => Self::Timeout,
            TransportError::Request(msg) => Self::Transport(msg),
        }
    }
}

/// Issues `eth_call` requests against per-chain endpoints.
#[derive(Debug)]
pub struct RpcClient {
    transport: Arc<dyn HttpTransport>,
    endpoints: HashMap<Chain, Url>,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Creates a client with no endpoints.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            endpoints: HashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Adds or replaces the endpoint for `chain`.
    #[must_use]
    pub fn with_endpoint(mut self, chain: Chain, url: Url) -> Self {
        self.endpoints.insert(chain, url);
        self
    }

    /// The endpoint configured for `chain`.
    #[must_use]
    pub fn endpoint(&self, chain: Chain) -> Option<&Url> {
        self.endpoints.get(&chain)
    }

    /// The transport shared with other clients.
    #[must_use]
    pub fn transport(&self) -> Arc<dyn HttpTransport> {
        Arc::clone(&self.transport)
    }

    /// Calls `to` with `data` on `chain` and returns the raw return data.
    ///
    /// # Errors
    ///
    /// Returns a [`CallError`] describing why no return data is available.
    pub async fn eth_call(
        &self,
        chain: Chain,
        to: Address,
        data: &[u8],
    ) -> Result<Bytes, CallError> {
        let url = self
            .endpoints
            .get(&chain)
            .ok_or(CallError::UnsupportedChain(chain))?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let call = json!({ "to": to.to_string(), "data": hex::encode_prefixed(data) });
        let params = json!([call, "latest"]);
        let request = Request::new("eth_call", Id::Number(id), params);
        let body = serde_json::to_value(&request).map_err(|e| CallError::Parsing(e.to_string()))?;

        tracing::trace!(%chain, %to, id, "eth_call");
        let response = self.transport.post_json(url, &body).await?;
        if !response.is_success() {
            return Err(CallError::HttpStatus(response.status));
        }

        let envelope: Response<Bytes> = response
            .parse()
            .map_err(|e| CallError::Parsing(e.to_string()))?;
        match envelope.payload {
            ResponsePayload::Success(data) => Ok(data),
            ResponsePayload::Failure(error) => Err(classify_error(&error)),
        }
    }
}

fn classify_error(error: &ErrorPayload) -> CallError {
    let message = error.message.to_string();
    if error.code == LIMIT_EXCEEDED_CODE {
        return CallError::LimitExceeded(message);
    }
    if REVERT_CODES.contains(&error.code)
        && let Some(data) = error.as_revert_data()
        && !data.is_empty()
    {
        return CallError::Revert { data };
    }
    CallError::Rpc {
        code: error.code,
        message,
    }
}
