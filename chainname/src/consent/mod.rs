//! Consent gate for off-chain lookups.
//!
//! Following an `OffchainLookup` sends the queried name to a third-party
//! gateway, so it is allowed only when the persisted [`ConsentState`] or the
//! caller's explicit [`OffchainLookupOptions`] say so:
//!
//! | state         | no options     | allow              | deny             |
//! |---------------|----------------|--------------------|------------------|
//! | `Ask`         | RequiresPrompt | Allow              | Deny             |
//! | `AlwaysAllow` | Allow          | Allow              | Allow            |
//! | `NeverAllow`  | Deny           | Allow              | Deny             |
//!
//! With `remember`, an allow persists `AlwaysAllow` and a deny persists
//! `NeverAllow`. `AlwaysAllow` ignores the options entirely.

mod store;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

pub use store::{ConsentStore, FileConsentStore, InMemoryConsentStore, StoreError};

/// Persisted preference for off-chain lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentState {
    /// Prompt the user before each lookup.
    #[default]
    Ask,
    /// Follow lookups without asking.
    AlwaysAllow,
    /// Refuse lookups unless explicitly allowed per request.
    NeverAllow,
}

impl std::fmt::Display for ConsentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Ask => "ask",
            Self::AlwaysAllow => "always_allow",
            Self::NeverAllow => "never_allow",
        })
    }
}

/// Explicit per-request consent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OffchainLookupOptions {
    /// Whether this request may follow an off-chain lookup.
    pub allow: bool,
    /// Whether to persist the answer.
    pub remember: bool,
}

impl OffchainLookupOptions {
    /// Allow this request only.
    #[must_use]
    pub const fn allow_once() -> Self {
        Self {
            allow: true,
            remember: false,
        }
    }

    /// Allow and persist [`ConsentState::AlwaysAllow`].
    #[must_use]
    pub const fn allow_and_remember() -> Self {
        Self {
            allow: true,
            remember: true,
        }
    }

    /// Deny this request only.
    #[must_use]
    pub const fn deny() -> Self {
        Self {
            allow: false,
            remember: false,
        }
    }

    /// Deny and persist [`ConsentState::NeverAllow`].
    #[must_use]
    pub const fn deny_and_remember() -> Self {
        Self {
            allow: false,
            remember: true,
        }
    }
}

/// Outcome of a consent check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsentDecision {
    /// Follow the lookup.
    Allow,
    /// Refuse the lookup.
    Deny,
    /// Ask the user and retry with explicit options.
    RequiresPrompt,
}

/// Computes the decision and the state to persist, if any.
const fn decide(
    state: ConsentState,
    options: Option<OffchainLookupOptions>,
) -> (ConsentDecision, Option<ConsentState>) {
    match (state, options) {
        (ConsentState::AlwaysAllow, _) => (ConsentDecision::Allow, None),
        (ConsentState::Ask, None) => (ConsentDecision::RequiresPrompt, None),
        (ConsentState::NeverAllow, None) => (ConsentDecision::Deny, None),
        (_, Some(OffchainLookupOptions { allow: true, remember })) => (
            ConsentDecision::Allow,
            if remember {
                Some(ConsentState::AlwaysAllow)
            } else {
                None
            },
        ),
        (_, Some(OffchainLookupOptions { allow: false, remember })) => (
            ConsentDecision::Deny,
            if remember {
                Some(ConsentState::NeverAllow)
            } else {
                None
            },
        ),
    }
}

/// Serialized access to the consent store.
#[derive(Debug, Clone)]
pub struct ConsentGate {
    store: Arc<dyn ConsentStore>,
    lock: Arc<Mutex<()>>,
}

impl ConsentGate {
    /// Wraps `store`.
    #[must_use]
    pub fn new(store: Arc<dyn ConsentStore>) -> Self {
        Self {
            store,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Decides whether a lookup may proceed, persisting any remembered
    /// answer.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be read or written.
    pub async fn check(
        &self,
        options: Option<OffchainLookupOptions>,
    ) -> Result<ConsentDecision, StoreError> {
        let _guard = self.lock.lock().await;
        let state = self.store.load().await?;
        let (decision, persist) = decide(state, options);
        if let Some(next) = persist.filter(|next| *next != state) {
            self.store.store(next).await?;
            tracing::info!(from = %state, to = %next, "offchain consent updated");
        }
        tracing::debug!(%state, ?options, ?decision, "offchain consent checked");
        Ok(decision)
    }

    /// Reads the persisted state.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be read.
    pub async fn state(&self) -> Result<ConsentState, StoreError> {
        let _guard = self.lock.lock().await;
        self.store.load().await
    }

    /// Overwrites the persisted state.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be written.
    pub async fn set_state(&self, state: ConsentState) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.store.store(state).await?;
        tracing::info!(to = %state, "offchain consent set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(state: ConsentState) -> ConsentGate {
        ConsentGate::new(Arc::new(InMemoryConsentStore::with_state(state)))
    }

    async fn check(
        state: ConsentState,
        options: Option<OffchainLookupOptions>,
    ) -> (ConsentDecision, ConsentState) {
        let gate = gate(state);
        let decision = gate.check(options).await.expect("check");
        (decision, gate.state().await.expect("state"))
    }

    mod decisions {
        use super::*;
        use crate::consent::ConsentDecision::{Allow, Deny, RequiresPrompt};
        use crate::consent::ConsentState::{AlwaysAllow, Ask, NeverAllow};

        #[tokio::test]
        async fn ask_without_options_prompts() {
            assert_eq!(check(Ask, None).await, (RequiresPrompt, Ask));
        }

        #[tokio::test]
        async fn allow_once_keeps_state() {
            let once = Some(OffchainLookupOptions::allow_once());
            assert_eq!(check(Ask, once).await, (Allow, Ask));
            assert_eq!(check(NeverAllow, once).await, (Allow, NeverAllow));
        }

        #[tokio::test]
        async fn allow_and_remember_enables() {
            let options = Some(OffchainLookupOptions::allow_and_remember());
            assert_eq!(check(Ask, options).await, (Allow, AlwaysAllow));
            assert_eq!(check(NeverAllow, options).await, (Allow, AlwaysAllow));
        }

        #[tokio::test]
        async fn deny_variants() {
            assert_eq!(
                check(Ask, Some(OffchainLookupOptions::deny())).await,
                (Deny, Ask)
            );
            assert_eq!(
                check(Ask, Some(OffchainLookupOptions::deny_and_remember())).await,
                (Deny, NeverAllow)
            );
            assert_eq!(check(NeverAllow, None).await, (Deny, NeverAllow));
        }

        #[tokio::test]
        async fn always_allow_ignores_options() {
            for options in [
                None,
                Some(OffchainLookupOptions::deny()),
                Some(OffchainLookupOptions::deny_and_remember()),
            ] {
                assert_eq!(check(AlwaysAllow, options).await, (Allow, AlwaysAllow));
            }
        }
    }

    #[tokio::test]
    async fn set_state_overwrites() {
        let gate = gate(ConsentState::Ask);
        gate.set_state(ConsentState::NeverAllow).await.expect("set");
        assert_eq!(gate.state().await.expect("state"), ConsentState::NeverAllow);
    }

    #[test]
    fn state_serde_is_snake_case() {
        let json = serde_json::to_string(&ConsentState::AlwaysAllow).expect("serialize");
        assert_eq!(json, "\"always_allow\"");
        assert_eq!(ConsentState::default(), ConsentState::Ask);
    }
}
