//! Outgoing-request authorization: attach credentials or refresh inline.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Request, Response};
use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::identity::IdentityClient;
use crate::manager::SESSION_EXPIRED;
use crate::navigation::{NavSender, NavSignal};
use crate::store::TokenStore;
use crate::token::AuthTokens;

/// Transport seam so request execution can be faked in tests. The real
/// implementation is a plain [`reqwest::Client`]; timeouts and retries
/// belong to it, not to this layer.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: Request) -> Result<Response, AuthError>;
}

#[async_trait]
impl Transport for reqwest::Client {
    async fn execute(&self, request: Request) -> Result<Response, AuthError> {
        Ok(reqwest::Client::execute(self, request).await?)
    }
}

/// Gate for every outgoing request except those aimed at the identity
/// endpoint itself (login/refresh must pass through unauthenticated or
/// they would recurse forever).
///
/// Holds its own [`IdentityClient`] and refreshes inline, independent of
/// the manager's single-flight instance.
pub struct RequestAuthorizer {
    transport: Arc<dyn Transport>,
    identity: IdentityClient,
    store: Arc<dyn TokenStore>,
    nav: NavSender,
    access_ttl: chrono::Duration,
}

impl RequestAuthorizer {
    pub fn new(config: &AuthConfig, store: Arc<dyn TokenStore>, nav: NavSender) -> Self {
        Self {
            transport: Arc::new(reqwest::Client::new()),
            identity: IdentityClient::new(&config.base_url),
            store,
            nav,
            access_ttl: chrono::Duration::from_std(config.access_ttl)
                .unwrap_or_else(|_| chrono::Duration::seconds(60)),
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Apply the credential decision table to one outgoing request.
    ///
    /// Returns the request ready to forward, with a bearer header
    /// attached unless the request targets the identity endpoint.
    pub async fn authorize(&self, mut request: Request) -> Result<Request, AuthError> {
        if is_identity_request(&request) {
            return Ok(request);
        }
        let Some(tokens) = self.store.load() else {
            return Err(self.reject(None));
        };
        if tokens.is_valid() {
            attach_bearer(&mut request, &tokens.access_token)?;
            return Ok(request);
        }
        if !tokens.has_refresh_token() {
            return Err(self.reject(None));
        }
        debug!(url = %request.url(), "access token expired; refreshing inline");
        match self.refresh_inline(&tokens.refresh_token).await {
            Ok(fresh) => {
                attach_bearer(&mut request, &fresh.access_token)?;
                Ok(request)
            }
            Err(err) => {
                if let Err(clear_err) = self.store.clear() {
                    warn!(error = %clear_err, "failed to clear persisted session");
                }
                self.nav.send(NavSignal::login_with(SESSION_EXPIRED));
                Err(err)
            }
        }
    }

    /// Authorize and send in one step.
    pub async fn execute(&self, request: Request) -> Result<Response, AuthError> {
        let request = self.authorize(request).await?;
        self.transport.execute(request).await
    }

    async fn refresh_inline(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        let response = self.identity.refresh(refresh_token).await?;
        let tokens = AuthTokens {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: Utc::now() + self.access_ttl,
        };
        if let Err(err) = self.store.save(&tokens) {
            warn!(error = %err, "failed to persist refreshed tokens");
        }
        Ok(tokens)
    }

    fn reject(&self, message: Option<String>) -> AuthError {
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to clear persisted session");
        }
        self.nav.send(NavSignal::Login { message });
        AuthError::Unauthenticated
    }
}

fn is_identity_request(request: &Request) -> bool {
    let path = request.url().path();
    path.contains("/auth/login") || path.contains("/auth/refresh")
}

fn attach_bearer(request: &mut Request, access_token: &str) -> Result<(), AuthError> {
    let value = HeaderValue::try_from(format!("Bearer {access_token}"))
        .map_err(|err| AuthError::InvalidResponse(err.to_string()))?;
    request.headers_mut().insert(AUTHORIZATION, value);
    Ok(())
}
