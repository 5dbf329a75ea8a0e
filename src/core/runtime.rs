//! Apalis worker setup for signal generation jobs

use crate::jobs::context::JobContext;
use crate::jobs::handlers;
use crate::jobs::types::{AnalyzeAssetJob, CollectWatchlistJob, StoreSignalJob};
use apalis::prelude::*;
use apalis_redis::RedisStorage;
use std::sync::Arc;
use tracing::info;

/// Configuration for the job runtime
#[derive(Clone)]
pub struct RuntimeConfig {
    pub generation_interval_seconds: u64,
    pub user_ids: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            generation_interval_seconds: 3600,
            user_ids: Vec::new(),
        }
    }
}

/// Signal runtime that sets up Apalis workers
pub struct SignalRuntime {
    _config: RuntimeConfig,
    job_context: Arc<JobContext>,
    collect_storage: Arc<RedisStorage<CollectWatchlistJob>>,
    analyze_storage: Arc<RedisStorage<AnalyzeAssetJob>>,
    store_storage: Arc<RedisStorage<StoreSignalJob>>,
}

impl SignalRuntime {
    pub fn new(
        config: RuntimeConfig,
        job_context: Arc<JobContext>,
        collect_storage: Arc<RedisStorage<CollectWatchlistJob>>,
        analyze_storage: Arc<RedisStorage<AnalyzeAssetJob>>,
        store_storage: Arc<RedisStorage<StoreSignalJob>>,
    ) -> Self {
        Self {
            _config: config,
            job_context,
            collect_storage,
            analyze_storage,
            store_storage,
        }
    }

    /// Start all workers and return handles for graceful shutdown
    pub async fn start_workers(
        &self,
    ) -> Result<Vec<tokio::task::JoinHandle<()>>, Box<dyn std::error::Error + Send + Sync>> {
        let mut handles = Vec::new();

        // Worker for CollectWatchlistJob
        let collect_storage = (*self.collect_storage).clone();
        let analyze_storage = (*self.analyze_storage).clone();
        let job_context = self.job_context.clone();
        let collect_handle = tokio::spawn(async move {
            let worker = WorkerBuilder::new("collect-watchlist-worker")
                .data(job_context.clone())
                .data(analyze_storage.clone())
                .backend(collect_storage)
                .build_fn(handlers::handle_collect_watchlist);

            info!("SignalRuntime: CollectWatchlistJob worker started");
            worker.run().await;
        });
        handles.push(collect_handle);

        // Worker for AnalyzeAssetJob
        let analyze_storage_worker = (*self.analyze_storage).clone();
        let store_storage = (*self.store_storage).clone();
        let job_context_analyze = self.job_context.clone();
        let analyze_handle = tokio::spawn(async move {
            let worker = WorkerBuilder::new("analyze-asset-worker")
                .data(job_context_analyze.clone())
                .data(store_storage.clone())
                .backend(analyze_storage_worker)
                .build_fn(handlers::handle_analyze_asset);

            info!("SignalRuntime: AnalyzeAssetJob worker started");
            worker.run().await;
        });
        handles.push(analyze_handle);

        // Worker for StoreSignalJob
        let store_storage_worker = (*self.store_storage).clone();
        let job_context_store = self.job_context.clone();
        let store_handle = tokio::spawn(async move {
            let worker = WorkerBuilder::new("store-signal-worker")
                .data(job_context_store.clone())
                .backend(store_storage_worker)
                .build_fn(handlers::handle_store_signal);

            info!("SignalRuntime: StoreSignalJob worker started");
            worker.run().await;
        });
        handles.push(store_handle);

        info!("SignalRuntime: all workers started");
        Ok(handles)
    }
}
