//! Interval-based scheduler for enqueuing signal generation runs

use crate::jobs::types::CollectWatchlistJob;
use apalis::prelude::*;
use apalis_redis::RedisStorage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Tick period for a configured generation interval.
/// Rejects 0, which means generation is disabled.
pub fn generation_period(
    interval_seconds: u64,
) -> Result<Duration, Box<dyn std::error::Error + Send + Sync>> {
    if interval_seconds == 0 {
        return Err("Scheduler disabled: interval_seconds is 0".into());
    }
    Ok(Duration::from_secs(interval_seconds))
}

/// Scheduler that periodically enqueues CollectWatchlistJob for each user
pub struct JobScheduler {
    storage: Arc<RedisStorage<CollectWatchlistJob>>,
    user_ids: Vec<String>,
    period: Duration,
    handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl JobScheduler {
    /// Create a new scheduler
    ///
    /// # Arguments
    /// * `storage` - Redis storage backend for jobs
    /// * `user_ids` - Users to schedule generation runs for
    /// * `interval_seconds` - Generation interval in seconds (0 = disabled)
    pub fn new(
        storage: Arc<RedisStorage<CollectWatchlistJob>>,
        user_ids: Vec<String>,
        interval_seconds: u64,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let period = generation_period(interval_seconds)?;

        info!(
            interval = interval_seconds,
            user_count = user_ids.len(),
            "JobScheduler: created with interval {}s",
            interval_seconds
        );

        Ok(Self {
            storage,
            user_ids,
            period,
            handle: Arc::new(RwLock::new(None)),
        })
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let storage = self.storage.clone();
        let user_ids = self.user_ids.clone();
        let period = self.period;
        let handle_arc = self.handle.clone();

        let handle = tokio::spawn(async move {
            info!("JobScheduler: started, waiting for first tick...");

            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; consume it so the first
            // run happens one full period after startup.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                info!(
                    user_count = user_ids.len(),
                    "JobScheduler: tick, enqueuing CollectWatchlistJob for {} users",
                    user_ids.len()
                );

                for user_id in &user_ids {
                    let job = CollectWatchlistJob {
                        user_id: user_id.clone(),
                    };

                    let mut storage_clone = (*storage).clone();
                    match storage_clone.push(job).await {
                        Ok(_) => {
                            debug!(user_id = %user_id, "JobScheduler: enqueued CollectWatchlistJob for {}", user_id);
                        }
                        Err(e) => {
                            error!(
                                user_id = %user_id,
                                error = %e,
                                "JobScheduler: failed to enqueue CollectWatchlistJob for {}",
                                user_id
                            );
                        }
                    }
                }
            }
        });

        {
            let mut h = handle_arc.write().await;
            *h = Some(handle);
        }

        info!("JobScheduler: started successfully");
        Ok(())
    }

    /// Stop the scheduler
    pub async fn stop(&self) {
        let mut handle = self.handle.write().await;
        if let Some(h) = handle.take() {
            h.abort();
            info!("JobScheduler: stopped");
        }
    }

    /// Check if the scheduler is running
    pub async fn is_running(&self) -> bool {
        let handle = self.handle.read().await;
        handle.is_some()
    }
}
