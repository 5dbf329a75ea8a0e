//! Access-token cache with lazy refresh
//!
//! Returns a valid bearer token for the market-data API: the in-memory copy is
//! used while unexpired, then the persistent store is consulted, and only then
//! is a client-credentials request issued upstream. Refresh failures propagate
//! to the caller; there is no retry or backoff. Concurrent refreshes are not
//! coordinated: the refresh is idempotent and last-writer-wins.

use crate::db::Database;
use crate::metrics::Metrics;
use crate::models::token::CachedToken;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Persistent backing store for the cached token
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<Option<CachedToken>, BoxError>;
    async fn save(&self, token: &CachedToken) -> Result<(), BoxError>;
}

/// JSON file store; a missing or corrupt file reads as empty.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<CachedToken>, BoxError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(_) => return Ok(None),
        };

        Ok(serde_json::from_str(&raw).ok())
    }

    async fn save(&self, token: &CachedToken) -> Result<(), BoxError> {
        let json = serde_json::to_string(token)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

/// Single-row token document in Postgres
pub struct PostgresTokenStore {
    db: Arc<Database>,
}

impl PostgresTokenStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenStore for PostgresTokenStore {
    async fn load(&self) -> Result<Option<CachedToken>, BoxError> {
        self.db.load_token().await
    }

    async fn save(&self, token: &CachedToken) -> Result<(), BoxError> {
        self.db.save_token(token).await
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

/// Read-through token cache over an OAuth client-credentials endpoint
pub struct TokenManager {
    http: reqwest::Client,
    auth_url: String,
    app_key: String,
    app_secret: String,
    store: Arc<dyn TokenStore>,
    cached: RwLock<Option<CachedToken>>,
    metrics: Option<Arc<Metrics>>,
}

impl TokenManager {
    pub fn new(
        base_url: &str,
        app_key: String,
        app_secret: String,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth_url: format!("{}/oauth2/tokenP", base_url.trim_end_matches('/')),
            app_key,
            app_secret,
            store,
            cached: RwLock::new(None),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Return a valid bearer token, refreshing upstream when the cached value
    /// is absent or past expiry.
    pub async fn access_token(&self) -> Result<String, BoxError> {
        let now = Utc::now();

        {
            let cached = self.cached.read().await;
            if let Some(ref token) = *cached {
                if !token.is_expired(now) {
                    return Ok(token.access_token.clone());
                }
            }
        }

        if let Some(token) = self.store.load().await? {
            if !token.is_expired(now) {
                debug!("Token loaded from persistent store");
                let access_token = token.access_token.clone();
                *self.cached.write().await = Some(token);
                return Ok(access_token);
            }
        }

        self.refresh().await
    }

    async fn refresh(&self) -> Result<String, BoxError> {
        let response = self
            .http
            .post(&self.auth_url)
            .json(&serde_json::json!({
                "grant_type": "client_credentials",
                "appkey": self.app_key,
                "appsecret": self.app_secret,
                "scope": "oob",
            }))
            .send()
            .await
            .map_err(|e| Box::new(e) as BoxError)?;

        let status = response.status();
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| Box::new(e) as BoxError)?;

        if !status.is_success() {
            return Err(Box::new(std::io::Error::other(format!(
                "Token endpoint returned {}",
                status
            ))));
        }

        let access_token = body.access_token.ok_or_else(|| {
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "Token response without access_token",
            )) as BoxError
        })?;

        let token = CachedToken::from_response(access_token, body.expires_in, Utc::now());
        self.store.save(&token).await?;

        if let Some(ref metrics) = self.metrics {
            metrics.token_refreshes_total.inc();
        }
        info!(expires_at = %token.expires_at, "Access token refreshed");

        let access_token = token.access_token.clone();
        *self.cached.write().await = Some(token);
        Ok(access_token)
    }
}
