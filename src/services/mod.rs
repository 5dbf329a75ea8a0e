//! Outbound service clients

pub mod crypto;
pub mod listing;
pub mod llm;
pub mod market;
pub mod news;
pub mod token;

pub use crypto::CryptoClient;
pub use listing::ListingClient;
pub use llm::LlmClient;
pub use market::MarketDataClient;
pub use news::NewsService;
pub use token::{FileTokenStore, PostgresTokenStore, TokenManager, TokenStore};
