use thiserror::Error;

/// Normalized errors for the session core.
///
/// Variants carry plain strings so an outcome can be cloned to every
/// waiter attached to an in-flight refresh.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Login rejected: {0}")]
    InvalidCredentials(String),
    #[error("No refresh token stored")]
    NoRefreshToken,
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),
    #[error("Request rejected: credentials are stale")]
    Unauthorized,
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("Profile load failed: {0}")]
    ProfileLoadFailed(String),
    #[error("Stored session record is corrupt: {0}")]
    StorageCorrupt(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::StorageCorrupt(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AuthError>;
