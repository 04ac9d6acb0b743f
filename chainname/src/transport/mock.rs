//! Scriptable transport for tests.
//!
//! Handlers are consulted in registration order; the first one that returns
//! `Some` answers the request. Requests no handler claims get a `408`, which
//! callers see as a transport-level failure.
//!
//! ```rust
//! use alloy::primitives::Address;
//! use chainname::contracts;
//! use chainname::transport::mock::{EthCallReply, MockTransport};
//!
//! let mock = MockTransport::new();
//! mock.on_eth_call(None, Address::ZERO, contracts::RESOLVER, |_| {
//!     EthCallReply::Return(vec![0u8; 32])
//! });
//! assert_eq!(mock.request_count(), 0);
//! ```

use std::fmt;
use std::sync::{Mutex, PoisonError};

use alloy::primitives::{Address, hex};
use async_trait::async_trait;
use serde_json::{Value, json};
use url::Url;

use super::{HttpResponse, HttpTransport, TransportError};
use crate::contracts::Selector;

type Handler =
    Box<dyn Fn(&Url, &Value) -> Option<Result<HttpResponse, TransportError>> + Send + Sync>;

/// Scripted reply to an `eth_call`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EthCallReply {
    /// The call returns these bytes.
    Return(Vec<u8>),
    /// The call reverts with this revert data (JSON-RPC error code 3).
    Revert(Vec<u8>),
    /// The node answers with a JSON-RPC error.
    Error {
        /// JSON-RPC error code.
        code: i64,
        /// Error message.
        message: String,
    },
    /// The node answers with this HTTP status and an empty body.
    Status(u16),
    /// The node answers `200 OK` with this raw body.
    Raw(String),
    /// The request times out.
    Timeout,
}

/// A request seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Target URL.
    pub url: Url,
    /// JSON body.
    pub body: Value,
}

impl RecordedRequest {
    /// The `eth_call` target and call data, if this is an `eth_call`.
    #[must_use]
    pub fn eth_call(&self) -> Option<(Address, Vec<u8>)> {
        parse_eth_call(&self.body)
    }

    /// The selector of an `eth_call`.
    #[must_use]
    pub fn selector(&self) -> Option<Selector> {
        let (_, data) = self.eth_call()?;
        data.first_chunk::<4>().copied()
    }
}

/// In-memory [`HttpTransport`] answering from registered handlers.
#[derive(Default)]
pub struct MockTransport {
    handlers: Mutex<Vec<Handler>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("handlers", &lock(&self.handlers).len())
            .field("requests", &lock(&self.requests).len())
            .finish()
    }
}

impl MockTransport {
    /// Creates a mock with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a raw handler.
    pub fn on<F>(&self, handler: F)
    where
        F: Fn(&Url, &Value) -> Option<Result<HttpResponse, TransportError>> + Send + Sync + 'static,
    {
        lock(&self.handlers).push(Box::new(handler));
    }

    /// Registers an `eth_call` handler for calls to `to` with `selector`.
    ///
    /// With `endpoint` set, only requests sent to that RPC URL match, which is
    /// how tests tell chains apart. The handler receives the full call data.
    pub fn on_eth_call<F>(&self, endpoint: Option<Url>, to: Address, selector: Selector, reply: F)
    where
        F: Fn(&[u8]) -> EthCallReply + Send + Sync + 'static,
    {
        self.on(move |url, body| {
            if endpoint.as_ref().is_some_and(|e| e != url) {
                return None;
            }
            let (target, data) = parse_eth_call(body)?;
            if target != to || data.get(..4) != Some(selector.as_slice()) {
                return None;
            }
            Some(render_eth_call(body.get("id"), reply(&data)))
        });
    }

    /// Registers a handler for POSTs whose URL starts with `prefix`.
    pub fn on_post<F>(&self, prefix: impl Into<String>, reply: F)
    where
        F: Fn(&Value) -> HttpResponse + Send + Sync + 'static,
    {
        let prefix = prefix.into();
        self.on(move |url, body| {
            url.as_str()
                .starts_with(&prefix)
                .then(|| Ok(reply(body)))
        });
    }

    /// Every request seen so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Number of requests seen so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Selectors of every `eth_call` seen so far, in order.
    #[must_use]
    pub fn called_selectors(&self) -> Vec<Selector> {
        lock(&self.requests)
            .iter()
            .filter_map(RecordedRequest::selector)
            .collect()
    }

    /// Forgets recorded requests; handlers are kept.
    pub fn clear_requests(&self) {
        lock(&self.requests).clear();
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn post_json(&self, url: &Url, body: &Value) -> Result<HttpResponse, TransportError> {
        lock(&self.requests).push(RecordedRequest {
            url: url.clone(),
            body: body.clone(),
        });

        // Let concurrent callers reach the in-flight map before this reply lands.
        tokio::task::yield_now().await;

        let reply = lock(&self.handlers)
            .iter()
            .find_map(|handler| handler(url, body));
        reply.unwrap_or_else(|| Ok(HttpResponse::new(408, Vec::new())))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn parse_eth_call(body: &Value) -> Option<(Address, Vec<u8>)> {
    if body.get("method")?.as_str()? != "eth_call" {
        return None;
    }
    let call = body.get("params")?.get(0)?;
    let to = call.get("to")?.as_str()?.parse().ok()?;
    let data = hex::decode(call.get("data")?.as_str()?).ok()?;
    Some((to, data))
}

fn render_eth_call(
    id: Option<&Value>,
    reply: EthCallReply,
) -> Result<HttpResponse, TransportError> {
    let id = id.cloned().unwrap_or(Value::Null);
    let envelope = match reply {
        EthCallReply::Return(data) => {
            json!({ "jsonrpc": "2.0", "id": id, "result": hex::encode_prefixed(data) })
        }
        EthCallReply::Revert(data) => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {
                "code": 3,
                "message": "execution reverted",
                "data": hex::encode_prefixed(data),
            },
        }),
        EthCallReply::Error { code, message } => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": code, "message": message },
        }),
        EthCallReply::Status(status) => return Ok(HttpResponse::new(status, Vec::new())),
        EthCallReply::Raw(body) => return Ok(HttpResponse::ok(body)),
        EthCallReply::Timeout => return Err(TransportError::Timeout),
    };
    Ok(HttpResponse::json(&envelope))
}
