//! Redis read-through cache for merged news responses

use crate::config;
use crate::models::news::Article;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::warn;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    ttl_seconds: u64,
}

impl RedisCache {
    pub async fn new() -> Result<Self, BoxError> {
        Self::connect(&config::get_redis_url(), config::get_news_cache_ttl_seconds()).await
    }

    pub async fn connect(redis_url: &str, ttl_seconds: u64) -> Result<Self, BoxError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| Box::new(e) as BoxError)?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| Box::new(e) as BoxError)?;

        Ok(Self { conn, ttl_seconds })
    }

    fn news_key(user_id: &str) -> String {
        format!("news:watchlist:{}", user_id)
    }

    /// Cached merged articles for a user, or None on miss. Cache errors
    /// degrade to a miss so callers fall through to the live fan-out.
    pub async fn get_watchlist_news(&self, user_id: &str) -> Option<Vec<Article>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = match conn.get(Self::news_key(user_id)).await {
            Ok(v) => v,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "News cache read failed");
                return None;
            }
        };

        raw.and_then(|json| serde_json::from_str(&json).ok())
    }

    pub async fn put_watchlist_news(&self, user_id: &str, articles: &[Article]) {
        let json = match serde_json::to_string(articles) {
            Ok(j) => j,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "News cache serialization failed");
                return;
            }
        };

        let mut conn = self.conn.clone();
        if let Err(e) = conn
            .set_ex::<_, _, ()>(Self::news_key(user_id), json, self.ttl_seconds)
            .await
        {
            warn!(user_id = %user_id, error = %e, "News cache write failed");
        }
    }
}
