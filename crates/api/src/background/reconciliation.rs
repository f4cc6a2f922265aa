//! Periodic reconciliation: background matching, expiry, and the similarity
//! service health check. The health tick also sweeps closed rate-limit
//! windows.
//!
//! Each pass runs on its own `tokio::time::interval`. A failing pass is
//! logged and retried at the next tick; it never stops the loop.

use lostfound_core::expiry::SchedulerConfig;
use lostfound_core::ttl_store::RateLimiter;
use lostfound_workflow::Reconciler;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Run the reconciliation loop until `cancel` is triggered.
pub async fn run(
    reconciler: Reconciler,
    rate_limiter: RateLimiter,
    config: SchedulerConfig,
    cancel: CancellationToken,
) {
    tracing::info!(
        match_interval_secs = config.match_interval.as_secs(),
        expiry_interval_secs = config.expiry_interval.as_secs(),
        health_check_interval_secs = config.health_check_interval.as_secs(),
        "Reconciliation scheduler started"
    );

    let mut matching = tokio::time::interval(config.match_interval);
    let mut expiry = tokio::time::interval(config.expiry_interval);
    let mut health = tokio::time::interval(config.health_check_interval);
    // A slow pass delays the next one instead of bursting to catch up.
    for interval in [&mut matching, &mut expiry, &mut health] {
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    }

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Reconciliation scheduler stopping");
                break;
            }
            _ = matching.tick() => {
                match reconciler.run_matching_pass().await {
                    Ok(summary) if summary.deferred => {
                        tracing::warn!(
                            lost = summary.lost_items_selected,
                            found = summary.found_items_selected,
                            "Matching pass deferred to next cycle"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!(error = %e, "Matching pass failed"),
                }
            }
            _ = expiry.tick() => {
                if let Err(e) = reconciler.run_expiry_pass().await {
                    tracing::error!(error = %e, "Expiry pass failed");
                }
            }
            _ = health.tick() => {
                reconciler.check_health().await;
                rate_limiter.purge_expired().await;
            }
        }
    }
}
