mod support;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use turnstile::error::AuthError;
use turnstile::navigation::NavSignal;
use turnstile::store::{MemoryTokenStore, TokenStore};
use turnstile::token::AuthTokens;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{
    emilys_profile_json, manager_with_store, mount_me_success, mount_refresh_success,
    valid_tokens,
};

#[tokio::test]
async fn profile_success_populates_user() {
    let server = MockServer::start().await;
    mount_me_success(&server, "A1").await;

    let store = Arc::new(MemoryTokenStore::new());
    store.save(&valid_tokens("A1", "R1")).unwrap();
    let (manager, _signals) = manager_with_store(&server, store);

    let user = manager.load_user_profile().await.expect("profile loads");
    assert_eq!(user.username, "emilys");

    let state = manager.state().get();
    assert_eq!(state.user, Some(user));
    assert!(!state.is_loading);
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn profile_401_refreshes_and_retries_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh_success(&server, "fresh", "R2").await;
    mount_me_success(&server, "fresh").await;

    let store = Arc::new(MemoryTokenStore::new());
    store.save(&valid_tokens("stale", "R1")).unwrap();
    let (manager, _signals) = manager_with_store(&server, store.clone());

    let user = manager.load_user_profile().await.expect("retry succeeds");
    assert_eq!(user.username, "emilys");
    assert_eq!(
        store.load().map(|t| t.access_token),
        Some("fresh".to_string())
    );
    assert!(manager.state().get().is_authenticated);
}

#[tokio::test]
async fn profile_401_with_failing_refresh_forces_logout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    store.save(&valid_tokens("stale", "R1")).unwrap();
    let (manager, mut signals) = manager_with_store(&server, store.clone());

    let err = manager.load_user_profile().await.expect_err("must fail");
    assert!(matches!(err, AuthError::ProfileLoadFailed(_)));

    let state = manager.state().get();
    assert!(!state.is_authenticated);
    assert!(state.tokens.is_none());
    assert_eq!(
        state.error.as_deref(),
        Some("Session expired. Please log in again.")
    );
    assert!(store.load().is_none());
    // refresh failure logged out first; the profile path reports the same
    assert!(matches!(signals.try_recv(), Ok(NavSignal::Login { .. })));
}

#[tokio::test]
async fn profile_second_401_after_retry_forces_logout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    mount_refresh_success(&server, "fresh", "R2").await;

    let store = Arc::new(MemoryTokenStore::new());
    store.save(&valid_tokens("stale", "R1")).unwrap();
    let (manager, _signals) = manager_with_store(&server, store.clone());

    let err = manager.load_user_profile().await.expect_err("must fail");
    assert!(matches!(err, AuthError::ProfileLoadFailed(_)));
    assert!(store.load().is_none());
    assert!(!manager.state().get().is_authenticated);
}

#[tokio::test]
async fn profile_non_auth_error_is_recorded_without_logout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "profile backend unavailable"
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    store.save(&valid_tokens("A1", "R1")).unwrap();
    let (manager, mut signals) = manager_with_store(&server, store.clone());

    let err = manager.load_user_profile().await.expect_err("must fail");
    match err {
        AuthError::ProfileLoadFailed(message) => {
            assert_eq!(message, "profile backend unavailable");
        }
        other => panic!("expected ProfileLoadFailed, got {other:?}"),
    }

    let state = manager.state().get();
    assert_eq!(state.error.as_deref(), Some("profile backend unavailable"));
    assert!(store.load().is_some());
    assert!(signals.try_recv().is_err());
}

#[tokio::test]
async fn profile_with_missing_access_token_refreshes_first() {
    let server = MockServer::start().await;
    mount_refresh_success(&server, "fresh", "R2").await;
    mount_me_success(&server, "fresh").await;

    let store = Arc::new(MemoryTokenStore::new());
    store
        .save(&AuthTokens {
            access_token: String::new(),
            refresh_token: "R1".to_string(),
            expires_at: chrono::Utc::now(),
        })
        .unwrap();
    let (manager, _signals) = manager_with_store(&server, store.clone());

    let user = manager.load_user_profile().await.expect("profile loads");
    assert_eq!(user.username, "emilys");
    assert_eq!(
        store.load().map(|t| t.access_token),
        Some("fresh".to_string())
    );
}

#[tokio::test]
async fn profile_response_matches_login_identity() {
    let server = MockServer::start().await;
    mount_me_success(&server, "A1").await;

    let store = Arc::new(MemoryTokenStore::new());
    store.save(&valid_tokens("A1", "R1")).unwrap();
    let (manager, _signals) = manager_with_store(&server, store);

    let user = manager.load_user_profile().await.expect("profile loads");
    let expected: turnstile::token::User =
        serde_json::from_value(emilys_profile_json()).unwrap();
    assert_eq!(user, expected);
}
