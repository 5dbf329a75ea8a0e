//! News feeds: finance headlines and per-watchlist keyword fan-out

use crate::metrics::Metrics;
use crate::models::news::Article;
use crate::models::watchlist::WatchlistItem;
use rss::Channel;
use std::sync::Arc;
use tracing::{debug, warn};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; AlphaSignal/1.0; +https://example.com/bot)";

pub struct NewsService {
    http: reqwest::Client,
    search_base_url: String,
    headlines_url: String,
    metrics: Option<Arc<Metrics>>,
}

impl NewsService {
    pub fn new(search_base_url: &str, headlines_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            search_base_url: search_base_url.trim_end_matches('/').to_string(),
            headlines_url: headlines_url.to_string(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Articles from the single finance headlines feed.
    pub async fn headlines(&self) -> Result<Vec<Article>, BoxError> {
        let channel = self.fetch_channel(&self.headlines_url, &[]).await?;
        Ok(channel_articles(&channel, None))
    }

    /// Sequential fan-out over watchlist entries: one keyword-search feed
    /// request per entry, failures logged and skipped, results merged in
    /// input order. Never fails as a whole.
    pub async fn watchlist_news(&self, items: &[WatchlistItem]) -> Vec<Article> {
        let url = format!("{}/rss/search", self.search_base_url);
        let mut merged = Vec::new();

        for item in items {
            let keyword = item.name.trim();
            if keyword.is_empty() {
                continue;
            }

            if let Some(ref metrics) = self.metrics {
                metrics.news_fanout_requests_total.inc();
            }

            let query = [
                ("q", keyword),
                ("hl", "ko"),
                ("gl", "KR"),
                ("ceid", "KR:ko"),
            ];
            match self.fetch_channel(&url, &query).await {
                Ok(channel) => {
                    let articles = channel_articles(&channel, Some(keyword));
                    debug!(
                        keyword = %keyword,
                        count = articles.len(),
                        "Fetched {} articles for '{}'",
                        articles.len(),
                        keyword
                    );
                    merged.extend(articles);
                }
                Err(e) => {
                    if let Some(ref metrics) = self.metrics {
                        metrics.news_fanout_failures_total.inc();
                    }
                    warn!(keyword = %keyword, error = %e, "News feed fetch failed, skipping");
                }
            }
        }

        merged
    }

    async fn fetch_channel(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Channel, BoxError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| Box::new(e) as BoxError)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Box::new(std::io::Error::other(format!(
                "Feed returned {}",
                status
            ))));
        }

        let bytes = response.bytes().await.map_err(|e| Box::new(e) as BoxError)?;
        Channel::read_from(&bytes[..]).map_err(|e| Box::new(e) as BoxError)
    }
}

fn channel_articles(channel: &Channel, keyword: Option<&str>) -> Vec<Article> {
    channel
        .items()
        .iter()
        .map(|item| Article {
            title: item.title().unwrap_or_default().to_string(),
            link: item.link().unwrap_or_default().to_string(),
            pub_date: item.pub_date().unwrap_or_default().to_string(),
            keyword: keyword.map(str::to_string),
        })
        .collect()
}
