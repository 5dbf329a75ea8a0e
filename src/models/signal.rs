//! Generated signal data model

use crate::models::watchlist::MarketKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An AI-generated attractiveness score with accompanying narrative
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: Option<i64>,
    pub user_id: String,
    pub symbol: String,
    pub name: String,
    pub market: MarketKind,
    /// 0..=100
    pub score: u8,
    pub analysis: String,
    pub created_at: DateTime<Utc>,
}

impl Signal {
    pub fn new(
        user_id: String,
        symbol: String,
        name: String,
        market: MarketKind,
        score: u8,
        analysis: String,
    ) -> Self {
        Self {
            id: None,
            user_id,
            symbol,
            name,
            market,
            score,
            analysis,
            created_at: Utc::now(),
        }
    }
}
