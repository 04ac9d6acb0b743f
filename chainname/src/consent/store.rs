//! Persistence for the off-chain consent preference.
//!
//! [`InMemoryConsentStore`] keeps the state behind a `tokio::sync::RwLock`
//! and loses it on drop. [`FileConsentStore`] writes a small JSON document;
//! a missing file reads as [`ConsentState::Ask`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::ConsentState;

/// Error reading or writing persisted consent.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("consent store I/O error at {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The stored document is not valid.
    #[error("consent store document is invalid: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Backend holding the single, process-wide consent state.
#[async_trait]
pub trait ConsentStore: Send + Sync + std::fmt::Debug {
    /// Reads the current state.
    async fn load(&self) -> Result<ConsentState, StoreError>;

    /// Replaces the current state.
    async fn store(&self, state: ConsentState) -> Result<(), StoreError>;
}

/// Volatile consent store.
#[derive(Debug, Default)]
pub struct InMemoryConsentStore {
    state: RwLock<ConsentState>,
}

impl InMemoryConsentStore {
    /// Creates a store starting at [`ConsentState::Ask`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store starting at `state`.
    #[must_use]
    pub fn with_state(state: ConsentState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }
}

#[async_trait]
impl ConsentStore for InMemoryConsentStore {
    async fn load(&self) -> Result<ConsentState, StoreError> {
        Ok(*self.state.read().await)
    }

    async fn store(&self, state: ConsentState) -> Result<(), StoreError> {
        *self.state.write().await = state;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ConsentDocument {
    offchain_lookup: ConsentState,
}

/// Consent store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileConsentStore {
    path: PathBuf,
}

impl FileConsentStore {
    /// Uses the file at `path`; it is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl ConsentStore for FileConsentStore {
    async fn load(&self) -> Result<ConsentState, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) => {
                let doc: ConsentDocument = serde_json::from_slice(&raw)?;
                Ok(doc.offchain_lookup)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConsentState::Ask),
            Err(e) => Err(self.io_error(e)),
        }
    }

    async fn store(&self, state: ConsentState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        let raw = serde_json::to_vec_pretty(&ConsentDocument {
            offchain_lookup: state,
        })?;
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| self.io_error(e))
    }
}
