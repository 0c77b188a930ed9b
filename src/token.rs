use chrono::{DateTime, Duration, Local, Utc};
use serde::{Deserialize, Serialize};

/// Credential triple anchoring one session.
///
/// `expires_at` is stamped locally at issuance (`now + access_ttl` from
/// [`AuthConfig`](crate::config::AuthConfig)); after that moment the
/// access token must be treated as unusable regardless of what the
/// server would say.
///
/// # Example
/// ```
/// use chrono::{Duration, Utc};
/// use turnstile::token::AuthTokens;
///
/// let tokens = AuthTokens {
///     access_token: "access".to_string(),
///     refresh_token: "refresh".to_string(),
///     expires_at: Utc::now() + Duration::seconds(60),
/// };
/// assert!(tokens.is_valid());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthTokens {
    /// Whether the access token is still inside its validity window.
    pub fn is_valid(&self) -> bool {
        self.expires_at > Utc::now()
    }

    /// An empty refresh token means the session cannot be renewed.
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// Remaining validity, floored at zero.
    pub fn time_until_expiry(&self) -> Duration {
        (self.expires_at - Utc::now()).max(Duration::zero())
    }

    /// Remaining validity as display text, e.g. `"37 sec"` or `"expired"`.
    pub fn expiry_countdown(&self) -> String {
        let left = self.expires_at - Utc::now();
        if left <= Duration::zero() {
            return "expired".to_string();
        }
        format!("{} sec", left.num_seconds())
    }

    /// Expiry moment as local wall-clock text for status displays.
    pub fn expiry_clock_time(&self) -> String {
        self.expires_at
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string()
    }
}

/// `true` iff tokens exist and the access token is unexpired.
pub fn is_token_valid(tokens: Option<&AuthTokens>) -> bool {
    tokens.is_some_and(AuthTokens::is_valid)
}

/// Username/password pair submitted to the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Immutable profile snapshot from the identity endpoint. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub image: String,
}
