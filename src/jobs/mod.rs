//! Job queue system for signal generation

pub mod context;
pub mod handlers;
pub mod types;

pub use context::JobContext;
pub use types::{AnalyzeAssetJob, CollectWatchlistJob, StoreSignalJob};
