//! Convenience re-exports for common use.

pub use crate::authorizer::{RequestAuthorizer, Transport};
pub use crate::config::AuthConfig;
pub use crate::error::{AuthError, Result};
pub use crate::guard::{GuardOutcome, RouteGuard};
pub use crate::manager::AuthSessionManager;
pub use crate::navigation::{nav_channel, NavReceiver, NavSender, NavSignal};
pub use crate::state::{SessionCell, SessionState};
pub use crate::store::{FileTokenStore, MemoryTokenStore, TokenStore, TokenStoreConfig};
pub use crate::token::{is_token_valid, AuthTokens, LoginCredentials, User};
