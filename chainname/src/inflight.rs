//! Coalescing of identical in-flight requests.
//!
//! The first caller for a key spawns the work; callers arriving while it is
//! pending get a clone of the same [`Shared`] future and observe the same
//! result. The spawned task removes its entry when it completes, even if every
//! caller has stopped waiting, so a later request for the key starts fresh.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::Instrument;

use crate::chain::Chain;
use crate::consent::OffchainLookupOptions;
use crate::error::{ResolveError, Result};
use crate::names::Domain;
use crate::outcome::RecordKind;

/// A pending resolution shared between callers.
pub type SharedResult<T> = Shared<BoxFuture<'static, Result<T>>>;

/// Identity of one resolution.
///
/// Explicit consent options are part of the key: a request carrying
/// `allow` must not join one that will stop at the consent prompt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    /// Normalized domain.
    pub domain: String,
    /// Record requested.
    pub kind: RecordKind,
    /// Chain read.
    pub chain: Chain,
    /// Consent options passed by the caller.
    pub options: Option<OffchainLookupOptions>,
}

impl RequestKey {
    /// Key for `kind` of `domain` on `chain`.
    #[must_use]
    pub fn new(
        domain: &Domain,
        kind: RecordKind,
        chain: Chain,
        options: Option<OffchainLookupOptions>,
    ) -> Self {
        Self {
            domain: domain.as_str().to_owned(),
            kind,
            chain,
            options,
        }
    }
}

/// Map of pending resolutions keyed by request identity.
pub struct Inflight<K, T> {
    pending: Arc<Mutex<HashMap<K, SharedResult<T>>>>,
}

impl<K, T> fmt::Debug for Inflight<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inflight")
            .field("pending", &lock(&self.pending).len())
            .finish()
    }
}

impl<K, T> Default for Inflight<K, T> {
    fn default() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K, T> Inflight<K, T>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pending resolution for `key`, spawning `start` if none is
    /// pending.
    ///
    /// Must be called from within a tokio runtime.
    pub fn run<F, Fut>(&self, key: K, start: F) -> SharedResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let mut pending = lock(&self.pending);
        if let Some(existing) = pending.get(&key) {
            tracing::debug!(?key, "joined in-flight request");
            return existing.clone();
        }

        let map = Arc::clone(&self.pending);
        let done_key = key.clone();
        let work = start();
        let task = tokio::spawn(
            async move {
                let value = work.await;
                lock(&map).remove(&done_key);
                value
            }
            .in_current_span(),
        );
        let shared = async move {
            match task.await {
                Ok(value) => value,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => {
                    tracing::warn!(error = %e, "in-flight request cancelled");
                    Err(ResolveError::internal())
                }
            }
        }
        .boxed()
        .shared();

        pending.insert(key, shared.clone());
        shared
    }

    /// Number of keys currently pending.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
