//!
//! Portico session store
//! ---------------------
//! Process-wide authenticated-session state, loaded once when the page tree
//! mounts and re-loadable on demand. The context object is explicitly owned
//! and injected down the tree; load/refresh are its only mutators and every
//! consumer is read-only.
//!
//! Contract:
//! - `load` queries the provider for the current user, then the current
//!   session, and commits {identity, token, role} as one write; any failure
//!   commits the cleared state instead, never a partial one.
//! - The role claim comes from the token payload via `claims::role_claim`,
//!   falling back to "customer"; role always has a value.
//! - `loading` is true from construction until the first load settles and
//!   again during every refresh, so readers can tell "still loading" from
//!   "known unauthenticated".

use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::claims;
use crate::error::{AppError, AppResult};
use crate::provider::{IdentityProvider, UserProfile};

/// Role committed whenever the token carries no role claim, including the
/// cleared (unauthenticated) state.
pub const DEFAULT_ROLE: &str = "customer";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub identity: Option<UserProfile>,
    pub token: Option<String>,
    pub role: String,
    pub loading: bool,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl SessionState {
    fn initial() -> Self {
        Self { identity: None, token: None, role: DEFAULT_ROLE.to_string(), loading: true, loaded_at: None }
    }

    fn cleared() -> Self {
        Self { identity: None, token: None, role: DEFAULT_ROLE.to_string(), loading: false, loaded_at: Some(Utc::now()) }
    }

    pub fn is_authenticated(&self) -> bool { self.token.is_some() }
}

/// Owner of the session state. Construct one at page-tree mount, `load` it,
/// and hand `SessionHandle`s to everything below.
pub struct SessionContext {
    provider: Arc<dyn IdentityProvider>,
    state: Arc<RwLock<SessionState>>,
}

impl SessionContext {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider, state: Arc::new(RwLock::new(SessionState::initial())) }
    }

    /// Read-only accessor to pass down the tree. Handles do not keep the
    /// context alive; reading through a handle after the context is gone is
    /// a usage error, not a session error.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle { state: Arc::downgrade(&self.state) }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.read().clone()
    }

    /// Load the session from the identity provider. On any failure the
    /// committed state is fully cleared: identity and token null, role back
    /// to the default. A fired cancel token discards the result instead of
    /// committing it.
    pub async fn load(&self, cancel: &CancelToken) -> SessionState {
        self.state.write().loading = true;
        let next = match self.fetch().await {
            Ok(state) => state,
            Err(e) => {
                warn!(target: "session", "session load failed, clearing: {e}");
                SessionState::cleared()
            }
        };
        if cancel.is_cancelled() {
            return self.snapshot();
        }
        *self.state.write() = next;
        let committed = self.snapshot();
        info!(
            target: "session",
            "session settled: authenticated={} role={}",
            committed.is_authenticated(),
            committed.role
        );
        committed
    }

    /// Re-run the load operation; same contract.
    pub async fn refresh(&self, cancel: &CancelToken) -> SessionState {
        self.load(cancel).await
    }

    async fn fetch(&self) -> anyhow::Result<SessionState> {
        let identity = self.provider.current_user().await?;
        let session = self.provider.current_session().await?;
        let role = claims::role_claim(&session.id_token).unwrap_or_else(|| DEFAULT_ROLE.to_string());
        Ok(SessionState {
            identity: Some(identity),
            token: Some(session.id_token),
            role,
            loading: false,
            loaded_at: Some(Utc::now()),
        })
    }
}

/// Cloneable read handle onto a `SessionContext`'s state.
#[derive(Clone)]
pub struct SessionHandle {
    state: Weak<RwLock<SessionState>>,
}

impl SessionHandle {
    pub fn read(&self) -> AppResult<SessionState> {
        let Some(state) = self.state.upgrade() else {
            return Err(AppError::config("session_scope", "session handle used outside its context's lifetime"));
        };
        let snapshot = state.read().clone();
        Ok(snapshot)
    }
}
