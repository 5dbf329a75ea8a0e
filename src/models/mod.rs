//! Shared data models spanning the service layers.

pub mod news;
pub mod signal;
pub mod token;
pub mod watchlist;

pub use news::{Article, ListedStock};
pub use signal::Signal;
pub use token::CachedToken;
pub use watchlist::{MarketKind, Plan, WatchlistItem};
