//! Turnstile — client-side bearer-token session manager.
//!
//! Obtains, stores, validates, and refreshes a single (access token,
//! refresh token, expiry) credential triple against a remote identity
//! endpoint, attaches credentials to outgoing requests, and gates
//! navigation to protected views. Concurrent refresh attempts are
//! serialized into one in-flight request whose outcome every caller
//! shares.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use turnstile::prelude::*;
//!
//! # async fn example() -> turnstile::error::Result<()> {
//! let config = AuthConfig::default();
//! let (nav, signals) = nav_channel();
//! let store = Arc::new(FileTokenStore::for_config(&config));
//! let manager = AuthSessionManager::new(&config, store, nav);
//!
//! manager.initialize().await;
//! let user = manager
//!     .login(&LoginCredentials::new("emilys", "emilyspass"))
//!     .await?;
//! println!("hello, {}", user.first_name);
//! # Ok(())
//! # }
//! ```

pub mod authorizer;
pub mod config;
pub mod error;
pub mod guard;
pub mod identity;
pub mod manager;
pub mod navigation;
pub mod prelude;
pub mod state;
pub mod store;
pub mod token;
