//! Job handlers for the signal generation workflow

use crate::jobs::context::JobContext;
use crate::jobs::types::{AnalyzeAssetJob, CollectWatchlistJob, StoreSignalJob};
use crate::models::signal::Signal;
use apalis::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Handler for collecting a user's watchlist
///
/// Loads the plan and alert-enabled entries, truncates to the plan's limit,
/// and enqueues one AnalyzeAssetJob per remaining entry.
pub async fn handle_collect_watchlist(
    job: CollectWatchlistJob,
    ctx: Data<Arc<JobContext>>,
    analyze_storage: Data<apalis_redis::RedisStorage<AnalyzeAssetJob>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    debug!(user_id = %job.user_id, "CollectWatchlistJob: collecting watchlist for {}", job.user_id);

    let db = match ctx.database {
        Some(ref db) => db,
        None => {
            debug!(
                user_id = %job.user_id,
                "CollectWatchlistJob: no database available, skipping"
            );
            return Ok(());
        }
    };

    let plan = db.get_user_plan(&job.user_id).await.map_err(|e| {
        Box::new(std::io::Error::other(format!(
            "Failed to load user plan: {}",
            e
        ))) as Box<dyn std::error::Error + Send + Sync>
    })?;

    let watchlist = db.get_watchlist(&job.user_id, true).await.map_err(|e| {
        Box::new(std::io::Error::other(format!(
            "Failed to load watchlist: {}",
            e
        ))) as Box<dyn std::error::Error + Send + Sync>
    })?;

    if watchlist.is_empty() {
        debug!(
            user_id = %job.user_id,
            "CollectWatchlistJob: no alert-enabled entries for {}, skipping",
            job.user_id
        );
        return Ok(());
    }

    let limit = plan.max_signals();
    let targets = &watchlist[..watchlist.len().min(limit)];
    info!(
        user_id = %job.user_id,
        plan = plan.as_str(),
        total = watchlist.len(),
        targets = targets.len(),
        "CollectWatchlistJob: {} of {} entries selected for {} ({} plan)",
        targets.len(),
        watchlist.len(),
        job.user_id,
        plan.as_str()
    );

    for item in targets {
        let next_job = AnalyzeAssetJob {
            user_id: job.user_id.clone(),
            item: item.clone(),
        };
        let mut storage = (*analyze_storage).clone();
        storage.push(next_job).await.map_err(|e| {
            Box::new(std::io::Error::other(format!(
                "Failed to enqueue AnalyzeAssetJob: {}",
                e
            ))) as Box<dyn std::error::Error + Send + Sync>
        })?;

        debug!(
            user_id = %job.user_id,
            symbol = %item.symbol,
            "CollectWatchlistJob: enqueued AnalyzeAssetJob for {}",
            item.symbol
        );
    }

    Ok(())
}

/// Handler for analyzing one watched asset
///
/// Runs the LLM scoring call. A reply without a parsable score skips the
/// asset without error; a scored reply enqueues StoreSignalJob.
pub async fn handle_analyze_asset(
    job: AnalyzeAssetJob,
    ctx: Data<Arc<JobContext>>,
    store_storage: Data<apalis_redis::RedisStorage<StoreSignalJob>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let start = Instant::now();

    if let Some(ref metrics) = ctx.metrics {
        metrics.signal_analyses_active.inc();
    }

    debug!(
        user_id = %job.user_id,
        symbol = %job.item.symbol,
        "AnalyzeAssetJob: analyzing {} for {}",
        job.item.symbol,
        job.user_id
    );

    let result = ctx.llm.analyze(&job.item).await;

    if let Some(ref metrics) = ctx.metrics {
        metrics.signal_analyses_active.dec();
        metrics
            .signal_analysis_duration_seconds
            .observe(start.elapsed().as_secs_f64());
    }

    let analysis = result.map_err(|e| {
        Box::new(std::io::Error::other(format!("LLM analysis failed: {}", e)))
            as Box<dyn std::error::Error + Send + Sync>
    })?;

    let score = match analysis.score {
        Some(score) => score,
        None => {
            debug!(
                user_id = %job.user_id,
                symbol = %job.item.symbol,
                "AnalyzeAssetJob: reply without a score for {}, skipping",
                job.item.symbol
            );
            return Ok(());
        }
    };

    info!(
        user_id = %job.user_id,
        symbol = %job.item.symbol,
        score = score,
        "AnalyzeAssetJob: scored {} at {}",
        job.item.symbol,
        score
    );

    let signal = Signal::new(
        job.user_id.clone(),
        job.item.symbol.clone(),
        job.item.name.clone(),
        job.item.market,
        score,
        analysis.text,
    );

    let mut storage = (*store_storage).clone();
    storage
        .push(StoreSignalJob { signal })
        .await
        .map_err(|e| {
            Box::new(std::io::Error::other(format!(
                "Failed to enqueue StoreSignalJob: {}",
                e
            ))) as Box<dyn std::error::Error + Send + Sync>
        })?;

    Ok(())
}

/// Handler for persisting a generated signal
///
/// Final step of the workflow: stores the signal and updates metrics.
pub async fn handle_store_signal(
    job: StoreSignalJob,
    ctx: Data<Arc<JobContext>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let signal = &job.signal;

    if let Some(ref metrics) = ctx.metrics {
        metrics.signal_analyses_total.inc();
    }

    if let Some(ref db) = ctx.database {
        if let Err(e) = db.store_signal(signal).await {
            error!(
                user_id = %signal.user_id,
                symbol = %signal.symbol,
                error = %e,
                "StoreSignalJob: failed to store signal for {}",
                signal.symbol
            );
            // Analysis already counted; storage failure is logged only
        } else {
            debug!(
                user_id = %signal.user_id,
                symbol = %signal.symbol,
                score = signal.score,
                "StoreSignalJob: stored signal for {} (score {})",
                signal.symbol,
                signal.score
            );
        }
    }

    Ok(())
}
