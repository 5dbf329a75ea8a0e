//! Integration tests for the access-token cache
//!
//! Exercises the read-through cache against a mocked auth endpoint: refresh
//! on expiry, reuse of stored tokens, and failure propagation.

use alphasignal::models::token::CachedToken;
use alphasignal::services::token::{FileTokenStore, TokenManager};
use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn manager_with_file(server: &MockServer, token_path: &std::path::Path) -> TokenManager {
    TokenManager::new(
        &server.uri(),
        "app-key".to_string(),
        "app-secret".to_string(),
        Arc::new(FileTokenStore::new(token_path)),
    )
}

#[tokio::test]
async fn expired_stored_token_triggers_exactly_one_refresh() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("token.json");

    let expired = CachedToken {
        access_token: "stale".to_string(),
        expires_at: Utc::now() - Duration::hours(1),
    };
    std::fs::write(&token_path, serde_json::to_string(&expired).unwrap()).unwrap();

    Mock::given(method("POST"))
        .and(path("/oauth2/tokenP"))
        .and(body_string_contains("client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "renewed",
            "expires_in": 86400
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager_with_file(&server, &token_path);
    assert_eq!(manager.access_token().await.unwrap(), "renewed");
    // Second read hits the in-memory copy; the mock allows exactly one call
    assert_eq!(manager.access_token().await.unwrap(), "renewed");
}

#[tokio::test]
async fn valid_stored_token_is_used_without_refresh() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("token.json");

    let valid = CachedToken {
        access_token: "still-good".to_string(),
        expires_at: Utc::now() + Duration::hours(12),
    };
    std::fs::write(&token_path, serde_json::to_string(&valid).unwrap()).unwrap();

    let manager = manager_with_file(&server, &token_path);
    assert_eq!(manager.access_token().await.unwrap(), "still-good");

    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty(), "No refresh call expected");
}

#[tokio::test]
async fn corrupt_store_reads_as_missing() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("token.json");
    std::fs::write(&token_path, "{not json").unwrap();

    Mock::given(method("POST"))
        .and(path("/oauth2/tokenP"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "recovered",
            "expires_in": 86400
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager_with_file(&server, &token_path);
    assert_eq!(manager.access_token().await.unwrap(), "recovered");
}

#[tokio::test]
async fn refreshed_token_is_persisted_with_expiry_margin() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("token.json");

    Mock::given(method("POST"))
        .and(path("/oauth2/tokenP"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "persisted",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    let manager = manager_with_file(&server, &token_path);
    manager.access_token().await.unwrap();
    let after = Utc::now();

    let raw = std::fs::read_to_string(&token_path).unwrap();
    let stored: CachedToken = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored.access_token, "persisted");

    // 3600 s lifetime minus the 60 s margin, measured from after the refresh
    let lifetime = stored.expires_at - after;
    assert!(lifetime <= Duration::seconds(3540));
    assert!(lifetime > Duration::seconds(3500));
}

#[tokio::test]
async fn refresh_failure_propagates() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/oauth2/tokenP"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "error": "maintenance" })))
        .mount(&server)
        .await;

    let manager = manager_with_file(&server, &dir.path().join("token.json"));
    assert!(manager.access_token().await.is_err());
}

#[tokio::test]
async fn response_without_access_token_is_an_error() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/oauth2/tokenP"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "expires_in": 3600 })))
        .mount(&server)
        .await;

    let manager = manager_with_file(&server, &dir.path().join("token.json"));
    assert!(manager.access_token().await.is_err());
}
