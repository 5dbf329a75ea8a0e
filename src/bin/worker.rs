//! AlphaSignal Worker
//!
//! Processes signal generation jobs from the Redis queue.
//! Can be run as a separate process/instance from the web server.

use alphasignal::config;
use alphasignal::core::runtime::{RuntimeConfig, SignalRuntime};
use alphasignal::core::scheduler::JobScheduler;
use alphasignal::db::Database;
use alphasignal::jobs::context::JobContext;
use alphasignal::jobs::types::{AnalyzeAssetJob, CollectWatchlistJob, StoreSignalJob};
use alphasignal::logging;
use alphasignal::metrics::Metrics;
use alphasignal::services::llm::LlmClient;
use apalis_redis::RedisStorage;
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load environment variables from .env if present
    dotenv().ok();

    // Initialize logging based on environment
    logging::init_logging();

    let generation_interval = config::get_generation_interval_seconds();

    let env = config::get_environment();
    info!("Starting AlphaSignal Worker");
    info!(environment = %env, "Environment");

    if generation_interval == 0 {
        return Err("GENERATION_INTERVAL_SECONDS must be > 0 for worker".into());
    }

    // Initialize metrics
    let metrics = Arc::new(Metrics::new()?);

    // Initialize Postgres (required for loading users and watchlists)
    info!("Initializing Postgres connection...");
    let database = match Database::new().await {
        Ok(db) => {
            info!("Postgres connected");
            metrics.database_connected.set(1.0);
            Arc::new(db)
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to Postgres");
            warn!("Worker requires Postgres for loading watchlists - exiting");
            return Err(format!("Postgres connection required for worker: {}", e).into());
        }
    };

    // Load users from database
    info!("Loading users from database...");
    let users = database
        .list_users()
        .await
        .map_err(|e| format!("Failed to load users: {}", e))?;

    if users.is_empty() {
        warn!("No users found in database - worker will start but no generation runs will be scheduled");
    } else {
        info!(user_count = users.len(), "Loaded {} users from database", users.len());
    }

    let user_ids: Vec<String> = users.into_iter().map(|(id, _)| id).collect();

    info!(
        interval = generation_interval,
        "Signal generation: every {} seconds", generation_interval
    );

    let runtime_config = RuntimeConfig {
        generation_interval_seconds: generation_interval,
        user_ids: user_ids.clone(),
    };

    // LLM client for the analyze stage
    let llm = Arc::new(LlmClient::new(
        &config::get_llm_api_base_url(),
        config::get_llm_api_key(),
        config::get_llm_model(),
    ));

    // Initialize Apalis storage backends
    info!("Initializing Apalis Redis storage...");
    let redis_url = config::get_redis_url();
    let conn = apalis_redis::connect(redis_url.clone()).await?;
    let collect_storage: Arc<RedisStorage<CollectWatchlistJob>> =
        Arc::new(RedisStorage::new(conn.clone()));
    let analyze_storage: Arc<RedisStorage<AnalyzeAssetJob>> =
        Arc::new(RedisStorage::new(conn.clone()));
    let store_storage: Arc<RedisStorage<StoreSignalJob>> = Arc::new(RedisStorage::new(conn));
    info!("Apalis Redis storage initialized");

    // Create job context
    let job_context = Arc::new(JobContext::new(
        Some(database.clone()),
        llm,
        Some(metrics.clone()),
    ));

    // Initialize and start job runtime (workers)
    info!("Starting Apalis workers...");
    let runtime = SignalRuntime::new(
        runtime_config.clone(),
        job_context,
        collect_storage.clone(),
        analyze_storage.clone(),
        store_storage.clone(),
    );
    let worker_handles = runtime
        .start_workers()
        .await
        .map_err(|e| format!("Failed to start workers: {}", e))?;

    // Initialize and start scheduler
    info!("Starting job scheduler...");
    let scheduler = JobScheduler::new(collect_storage, user_ids, generation_interval)
        .map_err(|e| format!("Failed to create scheduler: {}", e))?;
    scheduler
        .start()
        .await
        .map_err(|e| format!("Failed to start scheduler: {}", e))?;

    // Graceful shutdown
    info!("Worker started, waiting for shutdown signal...");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down worker...");
            scheduler.stop().await;
            for handle in worker_handles {
                handle.abort();
            }
            info!("Worker stopped");
        }
    }

    Ok(())
}
