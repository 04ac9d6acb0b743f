//! HTTP client for CCIP-Read gateways.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, hex};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::transport::HttpTransport;

/// Which gateway URLs of an `OffchainLookup` are tried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GatewayPolicy {
    /// Only the first URL.
    #[default]
    FirstOnly,
    /// Every URL in order until one answers.
    Sequential,
}

/// Error fetching from a gateway.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The lookup listed no URLs.
    #[error("offchain lookup carries no gateway URLs")]
    NoUrls,

    /// A URL could not be parsed after template substitution.
    #[error("invalid gateway URL {0}")]
    InvalidUrl(String),

    /// The request failed to complete.
    #[error("gateway request failed: {0}")]
    Transport(String),

    /// The gateway answered with a non-2xx status.
    #[error("gateway answered with HTTP {0}")]
    Status(u16),

    /// The body is not `{"data": "0x..."}`.
    #[error("malformed gateway response: {0}")]
    Malformed(String),

    /// The lookup chain ran past its limit.
    #[error("more than {0} chained offchain lookups")]
    TooManyLookups(usize),

    /// The lookup names a different contract than the one that reverted.
    #[error("offchain lookup sender {sender} does not match resolver {resolver}")]
    SenderMismatch {
        /// Sender named in the revert.
        sender: Address,
        /// Contract that reverted.
        resolver: Address,
    },
}

#[derive(Debug, Deserialize)]
struct GatewayReply {
    data: String,
}

/// Posts `{sender, data}` to gateway URLs and returns the `data` reply.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    transport: Arc<dyn HttpTransport>,
    policy: GatewayPolicy,
}

impl GatewayClient {
    /// Creates a client with the given URL policy.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, policy: GatewayPolicy) -> Self {
        Self { transport, policy }
    }

    /// The configured URL policy.
    #[must_use]
    pub const fn policy(&self) -> GatewayPolicy {
        self.policy
    }

    /// Fetches the response for `call_data` from `urls`.
    ///
    /// # Errors
    ///
    /// Returns the error of the last URL tried, or [`GatewayError::NoUrls`].
    pub async fn fetch(
        &self,
        sender: Address,
        urls: &[String],
        call_data: &[u8],
    ) -> Result<Bytes, GatewayError> {
        let candidates = match self.policy {
            GatewayPolicy::FirstOnly => &urls[..urls.len().min(1)],
            GatewayPolicy::Sequential => urls,
        };

        let mut last_error = GatewayError::NoUrls;
        for template in candidates {
            match self.fetch_one(sender, template, call_data).await {
                Ok(data) => return Ok(data),
                Err(e) => {
                    tracing::debug!(url = %template, error = %e, "gateway attempt failed");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    async fn fetch_one(
        &self,
        sender: Address,
        template: &str,
        call_data: &[u8],
    ) -> Result<Bytes, GatewayError> {
        let sender_hex = hex::encode_prefixed(sender);
        let data_hex = hex::encode_prefixed(call_data);
        let url = expand_template(template, &sender_hex, &data_hex)?;
        let body = json!({ "sender": sender_hex, "data": data_hex });

        let response = self
            .transport
            .post_json(&url, &body)
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        if !response.is_success() {
            return Err(GatewayError::Status(response.status));
        }

        let reply: GatewayReply = response
            .parse()
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;
        let data = hex::decode(&reply.data).map_err(|e| GatewayError::Malformed(e.to_string()))?;
        tracing::debug!(%url, len = data.len(), "gateway answered");
        Ok(data.into())
    }
}

/// Substitutes `{sender}` and `{data}` in a gateway URL template.
fn expand_template(template: &str, sender: &str, data: &str) -> Result<Url, GatewayError> {
    let expanded = template.replace("{sender}", sender).replace("{data}", data);
    Url::parse(&expanded).map_err(|_| GatewayError::InvalidUrl(template.to_owned()))
}
