//! Cryptocurrency metadata client (CoinGecko-style search API)

use serde::{Deserialize, Serialize};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinMatch {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub thumb: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<CoinMatch>,
}

pub struct CryptoClient {
    http: reqwest::Client,
    base_url: String,
}

impl CryptoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Search coins by name or ticker; empty queries short-circuit.
    pub async fn search(&self, query: &str) -> Result<Vec<CoinMatch>, BoxError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/v3/search", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("query", query)])
            .send()
            .await
            .map_err(|e| Box::new(e) as BoxError)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Box::new(std::io::Error::other(format!(
                "Crypto search returned {}",
                status
            ))));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| Box::new(e) as BoxError)?;

        Ok(body.coins)
    }
}
