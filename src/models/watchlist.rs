//! Watchlist and subscription-plan data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Market segment a watched instrument belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    Kr,
    Global,
    Crypto,
}

impl MarketKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketKind::Kr => "kr",
            MarketKind::Global => "global",
            MarketKind::Crypto => "crypto",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "kr" => Some(MarketKind::Kr),
            "global" => Some(MarketKind::Global),
            "crypto" => Some(MarketKind::Crypto),
            _ => None,
        }
    }
}

/// A single user-curated watchlist entry
///
/// Symbols are unique per user; `alert` gates inclusion in signal generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistItem {
    pub symbol: String,
    pub name: String,
    pub market: MarketKind,
    pub alert: bool,
    pub created_at: DateTime<Utc>,
}

/// Subscription plan controlling how many signals a run may generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Basic,
    Pro,
}

impl Plan {
    /// Maximum number of watchlist entries analyzed per generation run
    pub fn max_signals(&self) -> usize {
        match self {
            Plan::Free => 1,
            Plan::Basic => 5,
            Plan::Pro => 20,
        }
    }

    /// Unknown plan names fall back to the free tier
    pub fn parse(s: &str) -> Self {
        match s {
            "basic" => Plan::Basic,
            "pro" => Plan::Pro,
            _ => Plan::Free,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Basic => "basic",
            Plan::Pro => "pro",
        }
    }
}
