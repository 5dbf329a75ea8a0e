//! Postgres operations for users, watchlists, signals, tokens and listings

use crate::config;
use crate::models::news::ListedStock;
use crate::models::signal::Signal;
use crate::models::token::CachedToken;
use crate::models::watchlist::{MarketKind, Plan, WatchlistItem};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_postgres::{Client, NoTls};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn db_err(context: &str, e: impl std::fmt::Display) -> BoxError {
    Box::new(std::io::Error::other(format!("{}: {}", context, e)))
}

// ILIKE treats %, _ and \ as metacharacters; user input must match literally
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

pub struct Database {
    client: Arc<RwLock<Option<Client>>>,
}

impl Database {
    pub async fn new() -> Result<Self, BoxError> {
        Self::connect(&config::get_database_url()).await
    }

    pub async fn connect(database_url: &str) -> Result<Self, BoxError> {
        let (client, connection) = tokio_postgres::connect(database_url, NoTls)
            .await
            .map_err(|e| {
                Box::new(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    format!("Failed to connect to Postgres: {}", e),
                )) as BoxError
            })?;

        // Spawn connection task
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "Postgres connection error");
            }
        });

        let db = Self {
            client: Arc::new(RwLock::new(Some(client))),
        };

        db.init_schema().await?;

        Ok(db)
    }

    async fn init_schema(&self) -> Result<(), BoxError> {
        let client = self.client.read().await;
        if let Some(ref c) = *client {
            c.batch_execute(
                "CREATE TABLE IF NOT EXISTS users (
                    id TEXT PRIMARY KEY,
                    plan TEXT NOT NULL DEFAULT 'free'
                );
                CREATE TABLE IF NOT EXISTS watchlist (
                    user_id TEXT NOT NULL,
                    symbol TEXT NOT NULL,
                    name TEXT NOT NULL,
                    market TEXT NOT NULL,
                    alert BOOLEAN NOT NULL DEFAULT FALSE,
                    created_at TIMESTAMPTZ NOT NULL,
                    PRIMARY KEY (user_id, symbol)
                );
                CREATE TABLE IF NOT EXISTS signals (
                    id BIGSERIAL PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    symbol TEXT NOT NULL,
                    name TEXT NOT NULL,
                    market TEXT NOT NULL,
                    score INT NOT NULL,
                    analysis TEXT NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL
                );
                CREATE TABLE IF NOT EXISTS api_token (
                    id INT PRIMARY KEY,
                    access_token TEXT NOT NULL,
                    expires_at TIMESTAMPTZ NOT NULL
                );
                CREATE TABLE IF NOT EXISTS listed_stocks (
                    code TEXT PRIMARY KEY,
                    name TEXT NOT NULL
                );",
            )
            .await
            .map_err(|e| db_err("Failed to initialize schema", e))?;
        }

        Ok(())
    }

    /// All known user ids with their plans
    pub async fn list_users(&self) -> Result<Vec<(String, Plan)>, BoxError> {
        let client = self.client.read().await;
        if let Some(ref c) = *client {
            let rows = c
                .query("SELECT id, plan FROM users ORDER BY id", &[])
                .await
                .map_err(|e| db_err("Failed to query users", e))?;

            Ok(rows
                .iter()
                .map(|row| {
                    let id: String = row.get(0);
                    let plan: String = row.get(1);
                    (id, Plan::parse(&plan))
                })
                .collect())
        } else {
            Ok(Vec::new())
        }
    }

    /// Plan for a user; unknown users get the free tier
    pub async fn get_user_plan(&self, user_id: &str) -> Result<Plan, BoxError> {
        let client = self.client.read().await;
        if let Some(ref c) = *client {
            let row = c
                .query_opt("SELECT plan FROM users WHERE id = $1", &[&user_id])
                .await
                .map_err(|e| db_err("Failed to query user plan", e))?;

            Ok(row
                .map(|r| Plan::parse(r.get::<_, String>(0).as_str()))
                .unwrap_or(Plan::Free))
        } else {
            Ok(Plan::Free)
        }
    }

    pub async fn upsert_user(&self, user_id: &str, plan: Plan) -> Result<(), BoxError> {
        let client = self.client.read().await;
        if let Some(ref c) = *client {
            c.execute(
                "INSERT INTO users (id, plan) VALUES ($1, $2)
                 ON CONFLICT (id) DO UPDATE SET plan = EXCLUDED.plan",
                &[&user_id, &plan.as_str()],
            )
            .await
            .map_err(|e| db_err("Failed to upsert user", e))?;
        }

        Ok(())
    }

    /// Watchlist for a user, insertion-ordered; `alert_only` filters to
    /// entries opted into signal generation.
    pub async fn get_watchlist(
        &self,
        user_id: &str,
        alert_only: bool,
    ) -> Result<Vec<WatchlistItem>, BoxError> {
        let client = self.client.read().await;
        if let Some(ref c) = *client {
            let query = if alert_only {
                "SELECT symbol, name, market, alert, created_at FROM watchlist
                 WHERE user_id = $1 AND alert ORDER BY created_at"
            } else {
                "SELECT symbol, name, market, alert, created_at FROM watchlist
                 WHERE user_id = $1 ORDER BY created_at"
            };

            let rows = c
                .query(query, &[&user_id])
                .await
                .map_err(|e| db_err("Failed to query watchlist", e))?;

            let mut items = Vec::new();
            for row in rows {
                let market: String = row.get(2);
                items.push(WatchlistItem {
                    symbol: row.get(0),
                    name: row.get(1),
                    market: MarketKind::parse(&market).unwrap_or(MarketKind::Global),
                    alert: row.get(3),
                    created_at: row.get::<_, DateTime<Utc>>(4),
                });
            }

            Ok(items)
        } else {
            Ok(Vec::new())
        }
    }

    /// Insert or replace a watchlist entry; symbol is unique per user.
    pub async fn add_watchlist_item(
        &self,
        user_id: &str,
        item: &WatchlistItem,
    ) -> Result<(), BoxError> {
        let client = self.client.read().await;
        if let Some(ref c) = *client {
            c.execute(
                "INSERT INTO watchlist (user_id, symbol, name, market, alert, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (user_id, symbol) DO UPDATE
                 SET name = EXCLUDED.name, market = EXCLUDED.market, alert = EXCLUDED.alert",
                &[
                    &user_id,
                    &item.symbol,
                    &item.name,
                    &item.market.as_str(),
                    &item.alert,
                    &item.created_at,
                ],
            )
            .await
            .map_err(|e| db_err("Failed to add watchlist item", e))?;
        }

        Ok(())
    }

    /// Remove a watchlist entry; returns whether a row was deleted.
    pub async fn remove_watchlist_item(
        &self,
        user_id: &str,
        symbol: &str,
    ) -> Result<bool, BoxError> {
        let client = self.client.read().await;
        if let Some(ref c) = *client {
            let deleted = c
                .execute(
                    "DELETE FROM watchlist WHERE user_id = $1 AND symbol = $2",
                    &[&user_id, &symbol],
                )
                .await
                .map_err(|e| db_err("Failed to remove watchlist item", e))?;

            Ok(deleted > 0)
        } else {
            Ok(false)
        }
    }

    pub async fn store_signal(&self, signal: &Signal) -> Result<(), BoxError> {
        let client = self.client.read().await;
        if let Some(ref c) = *client {
            c.execute(
                "INSERT INTO signals (user_id, symbol, name, market, score, analysis, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
                &[
                    &signal.user_id,
                    &signal.symbol,
                    &signal.name,
                    &signal.market.as_str(),
                    &(signal.score as i32),
                    &signal.analysis,
                    &signal.created_at,
                ],
            )
            .await
            .map_err(|e| db_err("Failed to store signal", e))?;
        }

        Ok(())
    }

    /// Most recent signals for a user, newest first
    pub async fn get_signals(&self, user_id: &str, limit: i64) -> Result<Vec<Signal>, BoxError> {
        let client = self.client.read().await;
        if let Some(ref c) = *client {
            let rows = c
                .query(
                    "SELECT id, symbol, name, market, score, analysis, created_at
                     FROM signals WHERE user_id = $1
                     ORDER BY created_at DESC LIMIT $2",
                    &[&user_id, &limit],
                )
                .await
                .map_err(|e| db_err("Failed to query signals", e))?;

            let mut signals = Vec::new();
            for row in rows {
                let market: String = row.get(3);
                let score: i32 = row.get(4);
                signals.push(Signal {
                    id: Some(row.get(0)),
                    user_id: user_id.to_string(),
                    symbol: row.get(1),
                    name: row.get(2),
                    market: MarketKind::parse(&market).unwrap_or(MarketKind::Global),
                    score: score.clamp(0, 100) as u8,
                    analysis: row.get(5),
                    created_at: row.get::<_, DateTime<Utc>>(6),
                });
            }

            Ok(signals)
        } else {
            Ok(Vec::new())
        }
    }

    /// Load the single cached token document, if present
    pub async fn load_token(&self) -> Result<Option<CachedToken>, BoxError> {
        let client = self.client.read().await;
        if let Some(ref c) = *client {
            let row = c
                .query_opt(
                    "SELECT access_token, expires_at FROM api_token WHERE id = 1",
                    &[],
                )
                .await
                .map_err(|e| db_err("Failed to load token", e))?;

            Ok(row.map(|r| CachedToken {
                access_token: r.get(0),
                expires_at: r.get::<_, DateTime<Utc>>(1),
            }))
        } else {
            Ok(None)
        }
    }

    pub async fn save_token(&self, token: &CachedToken) -> Result<(), BoxError> {
        let client = self.client.read().await;
        if let Some(ref c) = *client {
            c.execute(
                "INSERT INTO api_token (id, access_token, expires_at) VALUES (1, $1, $2)
                 ON CONFLICT (id) DO UPDATE
                 SET access_token = EXCLUDED.access_token, expires_at = EXCLUDED.expires_at",
                &[&token.access_token, &token.expires_at],
            )
            .await
            .map_err(|e| db_err("Failed to save token", e))?;
        }

        Ok(())
    }

    /// Replace-or-insert the instrument reference rows; returns count written.
    pub async fn upsert_listed_stocks(&self, stocks: &[ListedStock]) -> Result<usize, BoxError> {
        let client = self.client.read().await;
        let mut written = 0;
        if let Some(ref c) = *client {
            for stock in stocks {
                c.execute(
                    "INSERT INTO listed_stocks (code, name) VALUES ($1, $2)
                     ON CONFLICT (code) DO UPDATE SET name = EXCLUDED.name",
                    &[&stock.code, &stock.name],
                )
                .await
                .map_err(|e| db_err("Failed to upsert listed stock", e))?;
                written += 1;
            }
        }

        Ok(written)
    }

    /// Case-insensitive substring search over the instrument reference table
    pub async fn search_listed_stocks(&self, query: &str) -> Result<Vec<ListedStock>, BoxError> {
        let client = self.client.read().await;
        if let Some(ref c) = *client {
            let pattern = like_pattern(query);
            let rows = c
                .query(
                    "SELECT code, name FROM listed_stocks
                     WHERE name ILIKE $1 ORDER BY name LIMIT 50",
                    &[&pattern],
                )
                .await
                .map_err(|e| db_err("Failed to search listed stocks", e))?;

            Ok(rows
                .iter()
                .map(|row| ListedStock {
                    code: row.get(0),
                    name: row.get(1),
                })
                .collect())
        } else {
            Ok(Vec::new())
        }
    }
}
