//! Integration tests for the API Server
//!
//! Tests HTTP endpoints, health checks, metrics, and business logic.


use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use test_utils::{rss_feed, TestApiServer};

#[tokio::test]
async fn health_endpoint_reports_healthy_status() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime_seconds"].as_u64().is_some());
    assert_eq!(body["service"], "alphasignal-api");
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_metrics() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/metrics").await;
    assert_eq!(response.status_code(), 200);

    let body = response.text();
    assert!(
        body.contains("http_requests_total"),
        "Expected http_requests_total metric"
    );
    assert!(
        body.contains("http_request_duration_seconds"),
        "Expected http_request_duration_seconds metric"
    );
    assert!(
        body.contains("http_requests_in_flight"),
        "Expected http_requests_in_flight metric"
    );
}

#[tokio::test]
async fn empty_search_queries_short_circuit() {
    let app = TestApiServer::new().await;

    for endpoint in [
        "/api/search/stocks",
        "/api/search/market",
        "/api/search/crypto",
    ] {
        let response = app.server.get(endpoint).await;
        assert_eq!(response.status_code(), 200, "endpoint {}", endpoint);
        let body: Value = response.json();
        assert_eq!(body["results"], json!([]));
    }

    // No outbound calls were made for empty queries
    let requests = app.upstream.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn crypto_search_maps_upstream_coins() {
    let app = TestApiServer::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/search"))
        .and(query_param("query", "bitcoin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "coins": [
                { "id": "bitcoin", "name": "Bitcoin", "symbol": "BTC", "thumb": "http://img/btc.png" },
                { "id": "bitcoin-cash", "name": "Bitcoin Cash", "symbol": "BCH", "thumb": "" }
            ]
        })))
        .mount(&app.upstream)
        .await;

    let response = app.server.get("/api/search/crypto?q=bitcoin").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["id"], "bitcoin");
    assert_eq!(results[0]["symbol"], "BTC");
}

#[tokio::test]
async fn token_endpoint_returns_refreshed_token() {
    let app = TestApiServer::new().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/tokenP"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh-token",
            "expires_in": 86400
        })))
        .expect(1)
        .mount(&app.upstream)
        .await;

    let response = app.server.get("/api/token").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["access_token"], "fresh-token");

    // Second call is served from the cache (the mock expects exactly one hit)
    let response = app.server.get("/api/token").await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn token_endpoint_propagates_auth_failure() {
    let app = TestApiServer::new().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/tokenP"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "boom" })))
        .mount(&app.upstream)
        .await;

    let response = app.server.get("/api/token").await;
    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn market_search_sends_bearer_token() {
    let app = TestApiServer::new().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/tokenP"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "market-token",
            "expires_in": 86400
        })))
        .mount(&app.upstream)
        .await;

    Mock::given(method("GET"))
        .and(path("/uapi/domestic-stock/v1/quotations/inquire-search"))
        .and(query_param("searchname", "samsung"))
        .and(header("authorization", "Bearer market-token"))
        .and(header("appkey", "test-app-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": [
                { "hts_kor_isnm": "Samsung Electronics", "research_stock_code": "005930" }
            ]
        })))
        .mount(&app.upstream)
        .await;

    let response = app.server.get("/api/search/market?q=samsung").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["name"], "Samsung Electronics");
    assert_eq!(results[0]["code"], "005930");
}

#[tokio::test]
async fn headlines_endpoint_parses_feed() {
    let app = TestApiServer::new().await;

    Mock::given(method("GET"))
        .and(path("/headlines.xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(rss_feed(&[
                ("Markets rally", "http://example.com/a"),
                ("Rates decision ahead", "http://example.com/b"),
            ])),
        )
        .mount(&app.upstream)
        .await;

    let response = app.server.get("/api/news/headlines").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    let articles = body["articles"].as_array().unwrap();
    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0]["title"], "Markets rally");
    assert_eq!(articles[1]["link"], "http://example.com/b");
}

#[tokio::test]
async fn news_watchlist_requires_user_id() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/api/news/watchlist").await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn database_endpoints_answer_503_without_database() {
    let app = TestApiServer::new().await;

    let response = app.server.get("/api/users/u1/watchlist").await;
    assert_eq!(response.status_code(), 503);

    let response = app
        .server
        .post("/api/users/u1/watchlist")
        .json(&json!({ "symbol": "BTC", "name": "Bitcoin", "market": "crypto" }))
        .await;
    assert_eq!(response.status_code(), 503);

    let response = app.server.get("/api/users/u1/signals").await;
    assert_eq!(response.status_code(), 503);

    let response = app.server.post("/api/signals/generate").await;
    assert_eq!(response.status_code(), 503);

    let response = app.server.get("/api/search/stocks?q=samsung").await;
    assert_eq!(response.status_code(), 503);

    let response = app.server.get("/api/news/watchlist?user_id=u1").await;
    assert_eq!(response.status_code(), 503);

    let response = app.server.post("/api/listings/refresh").await;
    assert_eq!(response.status_code(), 503);
}

#[tokio::test]
async fn api_server_is_stateless() {
    let app = TestApiServer::new().await;

    let response1 = app.server.get("/health").await;
    let response2 = app.server.get("/health").await;

    assert_eq!(response1.status_code(), 200);
    assert_eq!(response2.status_code(), 200);

    let body1: Value = response1.json();
    let body2: Value = response2.json();
    assert_eq!(body1["status"], "healthy");
    assert_eq!(body2["status"], "healthy");
}
