use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AuthError;
use crate::token::AuthTokens;

const SESSION_FILE: &str = "session.toml";

/// Durable storage for the session's token triple.
///
/// One named record; absence means "no session". Implementations are a
/// pure serialize/deserialize boundary and validate nothing.
pub trait TokenStore: Send + Sync {
    /// Load the persisted record.
    ///
    /// Fails soft: missing, unreadable, or malformed data all read as
    /// `None` so a corrupt record can never wedge process start.
    fn load(&self) -> Option<AuthTokens>;
    fn save(&self, tokens: &AuthTokens) -> Result<(), AuthError>;
    /// Idempotent; clearing an absent record succeeds.
    fn clear(&self) -> Result<(), AuthError>;
}

/// Configuration for file-backed session storage.
#[derive(Debug, Clone)]
pub struct TokenStoreConfig {
    pub base_dir: PathBuf,
}

impl TokenStoreConfig {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn default_dir() -> PathBuf {
        default_turnstile_dir()
    }
}

/// File-backed store keeping the session record as a TOML file.
///
/// # Example
/// ```no_run
/// use chrono::{Duration, Utc};
/// use turnstile::store::{FileTokenStore, TokenStore};
/// use turnstile::token::AuthTokens;
///
/// let store = FileTokenStore::new_default();
/// let tokens = AuthTokens {
///     access_token: "access".to_string(),
///     refresh_token: "refresh".to_string(),
///     expires_at: Utc::now() + Duration::seconds(60),
/// };
/// store.save(&tokens)?;
/// # Ok::<(), turnstile::error::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(config: TokenStoreConfig) -> Self {
        Self {
            path: config.base_dir.join(SESSION_FILE),
        }
    }

    pub fn new_default() -> Self {
        Self {
            path: default_turnstile_dir().join(SESSION_FILE),
        }
    }

    /// Build a store honoring `config.token_dir` when set.
    pub fn for_config(config: &crate::config::AuthConfig) -> Self {
        let base_dir = config
            .token_dir
            .clone()
            .unwrap_or_else(default_turnstile_dir);
        Self::new(TokenStoreConfig::new(base_dir))
    }

    fn ensure_parent(path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn read_record(&self) -> Result<Option<AuthTokens>, AuthError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let file: SessionFile = toml::from_str(&raw)?;
        Ok(Some(file.tokens))
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<AuthTokens> {
        match self.read_record() {
            Ok(record) => record,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "treating unreadable session record as absent");
                None
            }
        }
    }

    fn save(&self, tokens: &AuthTokens) -> Result<(), AuthError> {
        Self::ensure_parent(&self.path)?;
        let file = SessionFile {
            version: 1,
            tokens: tokens.clone(),
            saved_at: Utc::now(),
        };
        let serialized = toml::to_string(&file)?;
        fs::write(&self.path, serialized)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

/// In-memory store for tests and hosts without a writable filesystem.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    record: Mutex<Option<AuthTokens>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<AuthTokens> {
        self.record
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn save(&self, tokens: &AuthTokens) -> Result<(), AuthError> {
        *self
            .record
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(tokens.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self
            .record
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    tokens: AuthTokens,
    saved_at: DateTime<Utc>,
}

fn default_turnstile_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".turnstile"))
        .unwrap_or_else(|| PathBuf::from(".turnstile"))
}
