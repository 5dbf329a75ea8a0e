//! News article and instrument reference models

use serde::{Deserialize, Serialize};

/// A merged news article as returned by the news endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub pub_date: String,
    /// Watchlist entry name the article was fetched for (fan-out only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
}

/// One row of the local listed-instrument reference table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListedStock {
    pub code: String,
    pub name: String,
}
