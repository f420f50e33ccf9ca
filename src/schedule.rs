//! Periodic full syncs

use catalog_source::{Error, Synchronizer};
use sign_store::SignStore;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub interval: Duration,
    /// Sync immediately even when the store already has data
    pub sync_on_start: bool,
}

/// Counts of sync attempts made by [`run_scheduled`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleStats {
    pub succeeded: usize,
    pub failed: usize,
}

/// Sync on start if the store is empty (or `sync_on_start` is set), then every
/// `interval` until `cancel` fires.
///
/// A failed sync is logged and retried at the next tick. Cancellation aborts an
/// in-flight sync and ends the loop.
pub async fn run_scheduled<S: SignStore>(
    sync: &Synchronizer<S>,
    source_url: &str,
    schedule: &ScheduleConfig,
    cancel: &CancellationToken,
) -> anyhow::Result<ScheduleStats> {
    let mut stats = ScheduleStats::default();

    let initial = schedule.sync_on_start
        || match sync.store().sign_count().await {
            Ok(count) => count == 0,
            Err(e) => {
                tracing::warn!("Could not count stored signs, syncing now: {e}");
                true
            }
        };

    if initial {
        if run_once(sync, source_url, cancel, &mut stats).await.is_break() {
            return Ok(stats);
        }
    } else {
        tracing::info!(
            "Store already populated; next sync in {:?}",
            schedule.interval
        );
    }

    let mut ticker = interval_at(Instant::now() + schedule.interval, schedule.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if run_once(sync, source_url, cancel, &mut stats).await.is_break() {
                    break;
                }
            }
        }
    }

    tracing::info!(
        "Sync schedule stopped ({} succeeded, {} failed)",
        stats.succeeded,
        stats.failed
    );
    Ok(stats)
}

async fn run_once<S: SignStore>(
    sync: &Synchronizer<S>,
    source_url: &str,
    cancel: &CancellationToken,
    stats: &mut ScheduleStats,
) -> std::ops::ControlFlow<()> {
    match sync.sync(source_url, cancel).await {
        Ok(summary) => {
            stats.succeeded += 1;
            tracing::info!(
                "Scheduled sync wrote {} records from {} pages",
                summary.records_written,
                summary.pages_fetched
            );
            std::ops::ControlFlow::Continue(())
        }
        Err(Error::Cancelled) => {
            tracing::info!("Sync cancelled");
            std::ops::ControlFlow::Break(())
        }
        Err(e) => {
            stats.failed += 1;
            tracing::error!("Scheduled sync failed, retrying at next interval: {e}");
            std::ops::ControlFlow::Continue(())
        }
    }
}
