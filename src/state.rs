use std::sync::Arc;

use tokio::sync::watch;

use crate::token::{AuthTokens, User};

/// Process-wide session record.
///
/// Invariant: `is_authenticated` implies `tokens.is_some()`. `user` may
/// lag behind authentication until a profile load completes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub user: Option<User>,
    pub tokens: Option<AuthTokens>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Shared observable cell holding the current [`SessionState`].
///
/// Mutations replace the whole record atomically; observers never see a
/// partially-updated state. Created once at process start and handed by
/// reference to every collaborator, so tests get isolation from fresh
/// instances. [`AuthSessionManager`](crate::manager::AuthSessionManager)
/// is the only writer by convention.
#[derive(Debug, Clone)]
pub struct SessionCell {
    tx: Arc<watch::Sender<SessionState>>,
}

impl SessionCell {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Snapshot of the current record.
    pub fn get(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    /// Watch for record replacements.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Apply one logical mutation as a single atomic replacement.
    pub fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut SessionState),
    {
        self.tx.send_modify(mutate);
    }

    /// Swap in a complete record.
    pub fn replace(&self, next: SessionState) {
        self.tx.send_replace(next);
    }
}

impl Default for SessionCell {
    fn default() -> Self {
        Self::new()
    }
}
