//! Session manager configuration (code > env > defaults).

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

const DEFAULT_BASE_URL: &str = "https://dummyjson.com/auth";
const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(60);

/// Configuration shared by the manager and the request authorizer.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use turnstile::config::AuthConfig;
///
/// let config = AuthConfig::new("https://id.example.com/auth")
///     .with_access_ttl(Duration::from_secs(300));
/// ```
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Identity endpoint base, e.g. `https://dummyjson.com/auth`.
    pub base_url: String,
    /// Local validity window stamped onto issued access tokens.
    ///
    /// The window is fixed client-side rather than derived from the
    /// server's token lifetime; keep it shorter than whatever the
    /// identity provider actually issues.
    pub access_ttl: Duration,
    /// Directory for the persisted session record; `None` uses the
    /// per-user default.
    pub token_dir: Option<PathBuf>,
}

impl AuthConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_ttl: DEFAULT_ACCESS_TTL,
            token_dir: None,
        }
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn with_token_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.token_dir = Some(dir.into());
        self
    }

    /// Load overrides from the environment (and `.env` if present).
    ///
    /// Recognized: `TURNSTILE_BASE_URL`, `TURNSTILE_ACCESS_TTL_SECS`,
    /// `TURNSTILE_TOKEN_DIR`.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        if let Ok(url) = std::env::var("TURNSTILE_BASE_URL") {
            if !url.is_empty() {
                config.base_url = url;
            }
        }
        if let Ok(raw) = std::env::var("TURNSTILE_ACCESS_TTL_SECS") {
            match parse_ttl_secs(&raw) {
                Some(ttl) => config.access_ttl = ttl,
                None => warn!(value = %raw, "ignoring invalid TURNSTILE_ACCESS_TTL_SECS"),
            }
        }
        if let Ok(dir) = std::env::var("TURNSTILE_TOKEN_DIR") {
            if !dir.is_empty() {
                config.token_dir = Some(PathBuf::from(dir));
            }
        }
        config
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

fn parse_ttl_secs(raw: &str) -> Option<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => None,
    }
}
