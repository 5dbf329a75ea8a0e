//! Market-data REST client (KIS-style open API)

use crate::services::token::TokenManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const SEARCH_TR_ID: &str = "FHKST01010100";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMatch {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    output: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    hts_kor_isnm: String,
    #[serde(default)]
    research_stock_code: String,
}

pub struct MarketDataClient {
    http: reqwest::Client,
    base_url: String,
    app_key: String,
    app_secret: String,
    tokens: Arc<TokenManager>,
}

impl MarketDataClient {
    pub fn new(
        base_url: &str,
        app_key: String,
        app_secret: String,
        tokens: Arc<TokenManager>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            app_key,
            app_secret,
            tokens,
        }
    }

    /// Search instruments by name through the vendor's quotation API.
    /// An empty query returns no results without an outbound call.
    pub async fn search(&self, query: &str) -> Result<Vec<StockMatch>, BoxError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let token = self.tokens.access_token().await?;
        let url = format!(
            "{}/uapi/domestic-stock/v1/quotations/inquire-search",
            self.base_url
        );

        let response = self
            .http
            .get(&url)
            .query(&[("contextMenuType", "stock"), ("searchname", query)])
            .header("authorization", format!("Bearer {}", token))
            .header("appkey", &self.app_key)
            .header("appsecret", &self.app_secret)
            .header("tr_id", SEARCH_TR_ID)
            .send()
            .await
            .map_err(|e| Box::new(e) as BoxError)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Box::new(std::io::Error::other(format!(
                "Market search returned {}",
                status
            ))));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| Box::new(e) as BoxError)?;

        Ok(body
            .output
            .into_iter()
            .map(|item| StockMatch {
                name: item.hts_kor_isnm,
                code: item.research_stock_code,
            })
            .collect())
    }
}
