//! Session lifecycle: login, logout, refresh, profile load, auth checks.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::identity::IdentityClient;
use crate::navigation::{NavSender, NavSignal};
use crate::state::{SessionCell, SessionState};
use crate::store::TokenStore;
use crate::token::{AuthTokens, LoginCredentials, User};

pub(crate) const SESSION_EXPIRED: &str = "Session expired. Please log in again.";

/// Outcome slot shared by everyone attached to one refresh flight.
/// `None` until the flight lands.
type RefreshOutcome = Option<Result<AuthTokens, AuthError>>;

/// Owns the token lifecycle and the single-flight refresh coordination.
///
/// Reads and writes [`SessionState`] through its [`SessionCell`], mirrors
/// tokens into the [`TokenStore`], and talks to the identity endpoint.
/// Cheap to clone; clones share one session.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use turnstile::config::AuthConfig;
/// use turnstile::manager::AuthSessionManager;
/// use turnstile::navigation::nav_channel;
/// use turnstile::store::MemoryTokenStore;
/// use turnstile::token::LoginCredentials;
///
/// # async fn example() -> turnstile::error::Result<()> {
/// let (nav, _signals) = nav_channel();
/// let manager = AuthSessionManager::new(
///     &AuthConfig::default(),
///     Arc::new(MemoryTokenStore::new()),
///     nav,
/// );
/// manager.initialize().await;
/// let user = manager
///     .login(&LoginCredentials::new("emilys", "emilyspass"))
///     .await?;
/// assert_eq!(user.username, "emilys");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuthSessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    identity: IdentityClient,
    store: Arc<dyn TokenStore>,
    state: SessionCell,
    nav: NavSender,
    access_ttl: chrono::Duration,
    refresh_flight: Mutex<Option<watch::Receiver<RefreshOutcome>>>,
}

/// Clears the flight slot when the refresh task finishes, even if the
/// task body panics mid-flight.
struct FlightGuard {
    inner: Arc<Inner>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        *self
            .inner
            .refresh_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl AuthSessionManager {
    pub fn new(config: &AuthConfig, store: Arc<dyn TokenStore>, nav: NavSender) -> Self {
        Self {
            inner: Arc::new(Inner {
                identity: IdentityClient::new(&config.base_url),
                store,
                state: SessionCell::new(),
                nav,
                access_ttl: chrono::Duration::from_std(config.access_ttl)
                    .unwrap_or_else(|_| chrono::Duration::seconds(60)),
                refresh_flight: Mutex::new(None),
            }),
        }
    }

    /// The observable session record.
    pub fn state(&self) -> &SessionCell {
        &self.inner.state
    }

    /// Restore a persisted session at process start. No network call:
    /// authentication is judged by local expiry only. A restored valid
    /// token triggers a background profile load whose failure is logged
    /// and surfaced to no one.
    pub async fn initialize(&self) {
        let Some(tokens) = self.inner.store.load() else {
            return;
        };
        let valid = tokens.is_valid();
        self.inner.state.update(|s| {
            s.tokens = Some(tokens);
            s.is_authenticated = valid;
        });
        debug!(valid, "restored persisted session");
        if valid {
            let manager = self.clone();
            tokio::spawn(async move {
                if let Err(err) = manager.load_user_profile().await {
                    warn!(error = %err, "background profile load failed");
                }
            });
        }
    }

    /// Authenticate against the identity endpoint.
    ///
    /// Concurrent calls are independent requests; nothing coalesces them.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<User, AuthError> {
        self.inner.state.update(|s| {
            s.is_loading = true;
            s.error = None;
        });
        match self.inner.identity.login(credentials).await {
            Ok(response) => {
                let tokens = self.issue_tokens(response.access_token, response.refresh_token);
                let user = response.user;
                self.inner.state.update(|s| {
                    s.user = Some(user.clone());
                    s.tokens = Some(tokens.clone());
                    s.is_authenticated = true;
                    s.is_loading = false;
                    s.error = None;
                });
                self.persist(&tokens);
                self.inner.nav.send(NavSignal::Protected);
                debug!(username = %user.username, "login succeeded");
                Ok(user)
            }
            Err(err) => {
                let message = error_message(&err);
                self.inner.state.update(|s| {
                    s.is_loading = false;
                    s.error = Some(message);
                });
                Err(err)
            }
        }
    }

    /// Exchange the stored refresh token for a new pair.
    ///
    /// Single-flight: while a refresh is in the air, further callers
    /// attach to its outcome instead of issuing another request. The
    /// flight slot is claimed synchronously before any await point, and
    /// the flight itself runs as a detached task so one caller giving up
    /// cannot cancel it for the others. Failure force-logs-out the
    /// session before propagating.
    pub async fn refresh_token(&self) -> Result<AuthTokens, AuthError> {
        let mut rx = {
            let mut flight = self
                .inner
                .refresh_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(rx) = flight.as_ref() {
                debug!("refresh already in flight; attaching to its outcome");
                rx.clone()
            } else {
                let refresh_token = match self.inner.store.load() {
                    Some(tokens) if tokens.has_refresh_token() => tokens.refresh_token,
                    _ => return Err(AuthError::NoRefreshToken),
                };
                let (tx, rx) = watch::channel(None);
                *flight = Some(rx.clone());
                let manager = self.clone();
                tokio::spawn(async move {
                    let clear = FlightGuard {
                        inner: manager.inner.clone(),
                    };
                    let outcome = manager.run_refresh(refresh_token).await;
                    // Slot must be empty before the outcome is visible, so a
                    // waiter that immediately retries starts a fresh flight.
                    drop(clear);
                    let _ = tx.send(Some(outcome));
                });
                rx
            }
        };
        loop {
            if let Some(outcome) = rx.borrow_and_update().clone() {
                return outcome;
            }
            if rx.changed().await.is_err() {
                return Err(AuthError::RefreshFailed(
                    "refresh flight ended without an outcome".to_string(),
                ));
            }
        }
    }

    async fn run_refresh(&self, refresh_token: String) -> Result<AuthTokens, AuthError> {
        self.inner.state.update(|s| s.is_loading = true);
        match self.inner.identity.refresh(&refresh_token).await {
            Ok(response) => {
                let tokens = self.issue_tokens(response.access_token, response.refresh_token);
                self.inner.state.update(|s| {
                    s.tokens = Some(tokens.clone());
                    s.is_authenticated = true;
                    s.is_loading = false;
                });
                self.persist(&tokens);
                debug!("access token refreshed");
                Ok(tokens)
            }
            Err(err) => {
                self.inner.state.update(|s| s.is_loading = false);
                self.logout_with_message(Some(SESSION_EXPIRED.to_string()));
                Err(match err {
                    AuthError::RefreshFailed(_) => err,
                    other => AuthError::RefreshFailed(other.to_string()),
                })
            }
        }
    }

    /// Fetch the profile snapshot for the current session.
    ///
    /// A missing access token triggers one refresh-then-retry, as does a
    /// 401 on the profile request itself; a second rejection ends the
    /// session. Non-auth failures are recorded without logging out.
    pub async fn load_user_profile(&self) -> Result<User, AuthError> {
        let access_token = match self.stored_access_token() {
            Some(token) => token,
            None => {
                self.refresh_token().await?;
                self.stored_access_token()
                    .ok_or(AuthError::Unauthenticated)?
            }
        };
        self.inner.state.update(|s| {
            s.is_loading = true;
            s.error = None;
        });
        match self.inner.identity.me(&access_token).await {
            Ok(user) => {
                self.apply_user(&user);
                Ok(user)
            }
            Err(AuthError::Unauthorized) => {
                debug!("profile request rejected; refreshing and retrying once");
                let retried = match self.refresh_token().await {
                    Ok(tokens) => self.inner.identity.me(&tokens.access_token).await,
                    Err(err) => Err(err),
                };
                match retried {
                    Ok(user) => {
                        self.apply_user(&user);
                        Ok(user)
                    }
                    Err(_) => {
                        self.logout_with_message(Some(SESSION_EXPIRED.to_string()));
                        Err(AuthError::ProfileLoadFailed(SESSION_EXPIRED.to_string()))
                    }
                }
            }
            Err(err) => {
                let message = error_message(&err);
                self.inner.state.update(|s| {
                    s.is_loading = false;
                    s.error = Some(message);
                });
                Err(err)
            }
        }
    }

    /// Local-first auth probe used by [`RouteGuard`](crate::guard::RouteGuard).
    ///
    /// Boundary that deliberately discards error detail: an expired
    /// session with a refresh token delegates to [`Self::refresh_token`]
    /// and reports only whether it succeeded.
    pub async fn check_auth(&self) -> bool {
        let Some(tokens) = self.inner.store.load() else {
            return false;
        };
        if tokens.is_valid() {
            return true;
        }
        if tokens.has_refresh_token() {
            return self.refresh_token().await.is_ok();
        }
        false
    }

    /// End the session unconditionally. No server-side revocation.
    pub fn logout(&self) {
        self.logout_with_message(None);
    }

    fn logout_with_message(&self, message: Option<String>) {
        self.inner.state.replace(SessionState {
            user: None,
            tokens: None,
            is_authenticated: false,
            is_loading: false,
            error: message.clone(),
        });
        if let Err(err) = self.inner.store.clear() {
            warn!(error = %err, "failed to clear persisted session");
        }
        self.inner.nav.send(NavSignal::Login { message });
    }

    fn issue_tokens(&self, access_token: String, refresh_token: String) -> AuthTokens {
        AuthTokens {
            access_token,
            refresh_token,
            expires_at: Utc::now() + self.inner.access_ttl,
        }
    }

    fn persist(&self, tokens: &AuthTokens) {
        // The durable copy is a mirror; the in-memory session stays
        // usable even if the disk write fails.
        if let Err(err) = self.inner.store.save(tokens) {
            warn!(error = %err, "failed to persist session tokens");
        }
    }

    fn stored_access_token(&self) -> Option<String> {
        self.inner
            .store
            .load()
            .map(|tokens| tokens.access_token)
            .filter(|token| !token.is_empty())
    }

    fn apply_user(&self, user: &User) {
        self.inner.state.update(|s| {
            s.user = Some(user.clone());
            s.is_loading = false;
            s.error = None;
        });
    }
}

/// Human-readable text recorded in [`SessionState::error`].
fn error_message(err: &AuthError) -> String {
    match err {
        AuthError::InvalidCredentials(message)
        | AuthError::RefreshFailed(message)
        | AuthError::ProfileLoadFailed(message) => message.clone(),
        other => other.to_string(),
    }
}
