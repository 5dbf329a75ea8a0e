//! AlphaSignal backend library
//!
//! Aggregates user watchlists, fans out to third-party market-data and news
//! APIs, caches the market-data access token, and generates AI-scored signals
//! per watched asset. The `api-server` binary serves the HTTP API; the
//! `worker` binary processes the signal-generation job pipeline.

pub mod cache;
pub mod config;
pub mod core;
pub mod db;
pub mod jobs;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
