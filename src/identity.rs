//! Typed client for the remote identity endpoint.
//!
//! Three operations, dummyjson-style contract: `POST {base}/login`,
//! `POST {base}/refresh`, `GET {base}/me`. Everything else about the
//! provider is a black box.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::token::{LoginCredentials, User};

const DEFAULT_LOGIN_ERROR: &str = "Login failed. Check your username and password.";
const DEFAULT_REFRESH_ERROR: &str = "Could not refresh the session.";
const DEFAULT_PROFILE_ERROR: &str = "Failed to load profile.";

/// Successful login payload: profile snapshot plus the token pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Successful refresh payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: Option<String>,
}

/// HTTP client for the identity provider.
pub struct IdentityClient {
    client: reqwest::Client,
    base_url: String,
}

impl IdentityClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST {base}/login` with username/password.
    ///
    /// Any non-success status maps to [`AuthError::InvalidCredentials`]
    /// carrying the server's message when it sends one.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginResponse, AuthError> {
        let resp = self
            .client
            .post(format!("{}/login", self.base_url))
            .json(credentials)
            .send()
            .await?;
        if !resp.status().is_success() {
            let message = read_message(resp).await.unwrap_or_else(|| DEFAULT_LOGIN_ERROR.to_string());
            return Err(AuthError::InvalidCredentials(message));
        }
        Ok(resp.json().await?)
    }

    /// `POST {base}/refresh` exchanging the refresh token for a new pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, AuthError> {
        let resp = self
            .client
            .post(format!("{}/refresh", self.base_url))
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;
        if !resp.status().is_success() {
            let message = read_message(resp).await.unwrap_or_else(|| DEFAULT_REFRESH_ERROR.to_string());
            return Err(AuthError::RefreshFailed(message));
        }
        Ok(resp.json().await?)
    }

    /// `GET {base}/me` with a bearer token.
    ///
    /// 401/403 map to [`AuthError::Unauthorized`] (token presumed stale);
    /// other failures to [`AuthError::ProfileLoadFailed`].
    pub async fn me(&self, access_token: &str) -> Result<User, AuthError> {
        let resp = self
            .client
            .get(format!("{}/me", self.base_url))
            .bearer_auth(access_token)
            .send()
            .await?;
        if resp.status() == StatusCode::UNAUTHORIZED || resp.status() == StatusCode::FORBIDDEN {
            return Err(AuthError::Unauthorized);
        }
        if !resp.status().is_success() {
            let message = read_message(resp).await.unwrap_or_else(|| DEFAULT_PROFILE_ERROR.to_string());
            return Err(AuthError::ProfileLoadFailed(message));
        }
        Ok(resp.json().await?)
    }
}

async fn read_message(resp: reqwest::Response) -> Option<String> {
    resp.json::<ApiMessage>().await.ok().and_then(|m| m.message)
}
