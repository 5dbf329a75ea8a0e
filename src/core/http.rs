//! HTTP endpoint server using Axum

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, Level};

use crate::cache::RedisCache;
use crate::config;
use crate::db::Database;
use crate::jobs::types::CollectWatchlistJob;
use crate::metrics::Metrics;
use crate::models::watchlist::{MarketKind, WatchlistItem};
use crate::services::crypto::CryptoClient;
use crate::services::listing::ListingClient;
use crate::services::market::MarketDataClient;
use crate::services::news::NewsService;
use crate::services::token::{FileTokenStore, PostgresTokenStore, TokenManager, TokenStore};
use apalis::prelude::*;
use apalis_redis::RedisStorage;

#[derive(Clone)]
pub struct AppState {
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub database: Option<Arc<Database>>,
    pub tokens: Option<Arc<TokenManager>>,
    pub market: Option<Arc<MarketDataClient>>,
    pub crypto: Arc<CryptoClient>,
    pub news: Arc<NewsService>,
    pub listing: Arc<ListingClient>,
    pub news_cache: Option<Arc<RedisCache>>,
    pub generate_queue: Option<Arc<RedisStorage<CollectWatchlistJob>>>,
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

type ApiError = (StatusCode, Json<Value>);

fn internal_error(context: &str, e: impl std::fmt::Display) -> ApiError {
    error!(error = %e, "{}", context);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": context })),
    )
}

fn service_unavailable(what: &str) -> ApiError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": format!("{} unavailable", what) })),
    )
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let health = state.health.read().await;
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Ok(Json(json!({
        "status": health.status,
        "uptime_seconds": uptime_seconds,
        "service": "alphasignal-api"
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();

    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();

    state.metrics.http_requests_in_flight.dec();
    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserQuery {
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SignalsQuery {
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct AddWatchlistRequest {
    symbol: String,
    name: String,
    market: MarketKind,
    #[serde(default)]
    alert: bool,
}

/// Search the local listed-instrument table
async fn search_stocks(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Ok(Json(json!({ "results": [] })));
    }

    let db = state
        .database
        .as_ref()
        .ok_or_else(|| service_unavailable("database"))?;

    let results = db
        .search_listed_stocks(query.trim())
        .await
        .map_err(|e| internal_error("Stock search failed", e))?;

    Ok(Json(json!({ "results": results })))
}

/// Search through the remote market-data API (token-authenticated)
async fn search_market(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Ok(Json(json!({ "results": [] })));
    }

    let market = state
        .market
        .as_ref()
        .ok_or_else(|| service_unavailable("market data API"))?;

    let results = market
        .search(query.trim())
        .await
        .map_err(|e| internal_error("Market search failed", e))?;

    Ok(Json(json!({ "results": results })))
}

/// Search the cryptocurrency metadata API
async fn search_crypto(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Ok(Json(json!({ "results": [] })));
    }

    let results = state
        .crypto
        .search(query.trim())
        .await
        .map_err(|e| internal_error("Crypto search failed", e))?;

    Ok(Json(json!({ "results": results })))
}

/// Expose the current market-data access token
async fn get_token(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let tokens = state
        .tokens
        .as_ref()
        .ok_or_else(|| service_unavailable("token manager"))?;

    let access_token = tokens
        .access_token()
        .await
        .map_err(|e| internal_error("Failed to obtain token", e))?;

    Ok(Json(json!({ "access_token": access_token })))
}

/// Finance headlines feed
async fn news_headlines(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let articles = state
        .news
        .headlines()
        .await
        .map_err(|e| internal_error("Headlines fetch failed", e))?;

    Ok(Json(json!({ "articles": articles })))
}

/// Merged per-keyword news for a user's watchlist
///
/// Per-feed failures are skipped inside the fan-out; only failing to load
/// the watchlist itself is an error (500 with an empty article list).
async fn news_watchlist(
    State(state): State<AppState>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Value>, ApiError> {
    let user_id = params.user_id.ok_or((
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "user_id is required" })),
    ))?;

    let db = state
        .database
        .as_ref()
        .ok_or_else(|| service_unavailable("database"))?;

    if let Some(ref cache) = state.news_cache {
        if let Some(articles) = cache.get_watchlist_news(&user_id).await {
            return Ok(Json(json!({ "articles": articles })));
        }
    }

    let watchlist = db.get_watchlist(&user_id, false).await.map_err(|e| {
        error!(user_id = %user_id, error = %e, "Failed to load watchlist for news fan-out");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "articles": [] })),
        )
    })?;

    let articles = state.news.watchlist_news(&watchlist).await;

    // An empty merge usually means every feed failed; caching it would hide
    // upstream recovery for a full TTL
    if !articles.is_empty() {
        if let Some(ref cache) = state.news_cache {
            cache.put_watchlist_news(&user_id, &articles).await;
        }
    }

    Ok(Json(json!({ "articles": articles })))
}

/// List a user's watchlist
async fn list_watchlist(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let db = state
        .database
        .as_ref()
        .ok_or_else(|| service_unavailable("database"))?;

    let items = db
        .get_watchlist(&user_id, false)
        .await
        .map_err(|e| internal_error("Failed to load watchlist", e))?;

    Ok(Json(json!({ "items": items })))
}

/// Add (or replace) a watchlist entry
async fn add_watchlist_item(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<AddWatchlistRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let db = state
        .database
        .as_ref()
        .ok_or_else(|| service_unavailable("database"))?;

    let item = WatchlistItem {
        symbol: request.symbol,
        name: request.name,
        market: request.market,
        alert: request.alert,
        created_at: chrono::Utc::now(),
    };

    db.add_watchlist_item(&user_id, &item)
        .await
        .map_err(|e| internal_error("Failed to add watchlist item", e))?;

    Ok((StatusCode::CREATED, Json(json!({ "item": item }))))
}

/// Remove a watchlist entry
async fn remove_watchlist_item(
    State(state): State<AppState>,
    Path((user_id, symbol)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let db = state
        .database
        .as_ref()
        .ok_or_else(|| service_unavailable("database"))?;

    let removed = db
        .remove_watchlist_item(&user_id, &symbol)
        .await
        .map_err(|e| internal_error("Failed to remove watchlist item", e))?;

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "watchlist item not found" })),
        ))
    }
}

/// Recent signals for a user, newest first
async fn list_signals(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<SignalsQuery>,
) -> Result<Json<Value>, ApiError> {
    let db = state
        .database
        .as_ref()
        .ok_or_else(|| service_unavailable("database"))?;

    let limit = params.limit.unwrap_or(20).clamp(1, 200);
    let signals = db
        .get_signals(&user_id, limit)
        .await
        .map_err(|e| internal_error("Failed to load signals", e))?;

    Ok(Json(json!({ "signals": signals })))
}

/// Enqueue a signal generation run for every known user
async fn generate_signals(State(state): State<AppState>) -> Result<(StatusCode, Json<Value>), ApiError> {
    let db = state
        .database
        .as_ref()
        .ok_or_else(|| service_unavailable("database"))?;
    let queue = state
        .generate_queue
        .as_ref()
        .ok_or_else(|| service_unavailable("job queue"))?;

    let users = db
        .list_users()
        .await
        .map_err(|e| internal_error("Failed to list users", e))?;

    let mut enqueued = 0;
    for (user_id, _) in &users {
        let job = CollectWatchlistJob {
            user_id: user_id.clone(),
        };
        let mut storage = (**queue).clone();
        storage
            .push(job)
            .await
            .map_err(|e| internal_error("Failed to enqueue generation job", e))?;
        enqueued += 1;
    }

    info!(enqueued = enqueued, "Enqueued signal generation for {} users", enqueued);
    Ok((StatusCode::ACCEPTED, Json(json!({ "enqueued": enqueued }))))
}

/// Refresh the local instrument listing from the exchange download
async fn refresh_listings(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let db = state
        .database
        .as_ref()
        .ok_or_else(|| service_unavailable("database"))?;

    let stocks = state
        .listing
        .fetch_listing()
        .await
        .map_err(|e| internal_error("Listing download failed", e))?;

    let count = db
        .upsert_listed_stocks(&stocks)
        .await
        .map_err(|e| internal_error("Listing upsert failed", e))?;

    info!(count = count, "Instrument listing refreshed with {} entries", count);
    Ok(Json(json!({ "count": count })))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/search/stocks", get(search_stocks))
        .route("/api/search/market", get(search_market))
        .route("/api/search/crypto", get(search_crypto))
        .route("/api/token", get(get_token))
        .route("/api/news/headlines", get(news_headlines))
        .route("/api/news/watchlist", get(news_watchlist))
        .route("/api/users/{user_id}/watchlist", get(list_watchlist))
        .route("/api/users/{user_id}/watchlist", post(add_watchlist_item))
        .route(
            "/api/users/{user_id}/watchlist/{symbol}",
            delete(remove_watchlist_item),
        )
        .route("/api/users/{user_id}/signals", get(list_signals))
        .route("/api/signals/generate", post(generate_signals))
        .route("/api/listings/refresh", post(refresh_listings))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Build the full application state from environment configuration.
/// Optional collaborators degrade to None with a warning; their endpoints
/// answer 503 until the dependency comes back.
pub async fn build_state(metrics: Arc<Metrics>) -> AppState {
    let database = match Database::new().await {
        Ok(db) => {
            info!("Postgres connected for API server");
            metrics.database_connected.set(1.0);
            Some(Arc::new(db))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to connect to Postgres - database-backed endpoints will be unavailable");
            None
        }
    };

    // Token document lives in Postgres when available, else in a local file
    let token_store: Arc<dyn TokenStore> = match database {
        Some(ref db) => Arc::new(PostgresTokenStore::new(db.clone())),
        None => Arc::new(FileTokenStore::new(config::get_token_file_path())),
    };
    let tokens = Some(Arc::new(
        TokenManager::new(
            &config::get_market_api_base_url(),
            config::get_market_app_key(),
            config::get_market_app_secret(),
            token_store,
        )
        .with_metrics(metrics.clone()),
    ));

    let market = tokens.as_ref().map(|tokens| {
        Arc::new(MarketDataClient::new(
            &config::get_market_api_base_url(),
            config::get_market_app_key(),
            config::get_market_app_secret(),
            tokens.clone(),
        ))
    });

    let news_cache = match RedisCache::new().await {
        Ok(cache) => {
            metrics.cache_connected.set(1.0);
            Some(Arc::new(cache))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to connect to Redis - news responses will not be cached");
            None
        }
    };

    let generate_queue = match apalis_redis::connect(config::get_redis_url()).await {
        Ok(conn) => Some(Arc::new(RedisStorage::new(conn))),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to connect to Redis job queue - generation trigger will be unavailable");
            None
        }
    };

    AppState {
        health: Arc::new(RwLock::new(HealthStatus::default())),
        metrics: metrics.clone(),
        start_time: Arc::new(Instant::now()),
        database,
        tokens,
        market,
        crypto: Arc::new(CryptoClient::new(&config::get_crypto_api_base_url())),
        news: Arc::new(
            NewsService::new(
                &config::get_news_search_base_url(),
                &config::get_headlines_feed_url(),
            )
            .with_metrics(metrics.clone()),
        ),
        listing: Arc::new(ListingClient::new(&config::get_listing_url())),
        news_cache,
        generate_queue,
    }
}

pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let metrics = Arc::new(Metrics::new()?);
    let state = build_state(metrics).await;
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!(port = port, "HTTP server listening on port {}", port);
    info!(
        "Metrics endpoint available at http://0.0.0.0:{}/metrics",
        port
    );
    axum::serve(listener, app).await?;

    Ok(())
}
