#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use turnstile::config::AuthConfig;
use turnstile::error::AuthError;
use turnstile::manager::AuthSessionManager;
use turnstile::navigation::{nav_channel, NavReceiver};
use turnstile::store::TokenStore;
use turnstile::token::AuthTokens;

pub fn valid_tokens(access: &str, refresh: &str) -> AuthTokens {
    AuthTokens {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_at: Utc::now() + Duration::seconds(60),
    }
}

pub fn expired_tokens(access: &str, refresh: &str) -> AuthTokens {
    AuthTokens {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_at: Utc::now() - Duration::seconds(1),
    }
}

pub fn auth_config(server: &MockServer) -> AuthConfig {
    AuthConfig::new(format!("{}/auth", server.uri()))
}

pub fn manager_with_store(
    server: &MockServer,
    store: Arc<dyn TokenStore>,
) -> (AuthSessionManager, NavReceiver) {
    let (nav, signals) = nav_channel();
    let manager = AuthSessionManager::new(&auth_config(server), store, nav);
    (manager, signals)
}

pub fn emilys_login_json() -> serde_json::Value {
    json!({
        "id": 1,
        "username": "emilys",
        "email": "emily.johnson@x.dummyjson.com",
        "firstName": "Emily",
        "lastName": "Johnson",
        "gender": "female",
        "image": "https://dummyjson.com/icon/emilys/128",
        "accessToken": "A1",
        "refreshToken": "R1"
    })
}

pub fn emilys_profile_json() -> serde_json::Value {
    json!({
        "id": 1,
        "username": "emilys",
        "email": "emily.johnson@x.dummyjson.com",
        "firstName": "Emily",
        "lastName": "Johnson",
        "gender": "female",
        "image": "https://dummyjson.com/icon/emilys/128"
    })
}

pub async fn mount_login_success(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(emilys_login_json()))
        .mount(server)
        .await;
}

pub async fn mount_refresh_success(server: &MockServer, access: &str, refresh: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": access,
            "refreshToken": refresh
        })))
        .mount(server)
        .await;
}

pub async fn mount_me_success(server: &MockServer, bearer: &str) {
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", format!("Bearer {bearer}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(emilys_profile_json()))
        .mount(server)
        .await;
}

/// Store whose reads panic, for exercising the guard's never-throw
/// boundary.
pub struct PanickyStore;

impl TokenStore for PanickyStore {
    fn load(&self) -> Option<AuthTokens> {
        panic!("store exploded");
    }

    fn save(&self, _tokens: &AuthTokens) -> Result<(), AuthError> {
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        Ok(())
    }
}
