//! Job types for the signal generation workflow

use crate::models::signal::Signal;
use crate::models::watchlist::WatchlistItem;
use serde::{Deserialize, Serialize};

/// Job to collect a user's alert-enabled watchlist and fan out analyses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectWatchlistJob {
    pub user_id: String,
}

/// Job to run the LLM scoring call for one watched asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeAssetJob {
    pub user_id: String,
    pub item: WatchlistItem,
}

/// Job to persist a generated signal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSignalJob {
    pub signal: Signal,
}
