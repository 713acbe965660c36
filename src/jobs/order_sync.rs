//! Scheduled Order Sync Job
//!
//! Periodically syncs orders for every user holding active provider
//! credentials. Webhooks keep orders fresh between passes; this job catches
//! whatever they missed.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use crate::services::bricklink::PROVIDER;
use crate::services::credentials::CredentialStore;
use crate::services::order_sync::{OrderSyncer, SyncError};

/// Counts for one pass over all users
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub users: usize,
    pub synced: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Syncs every user with active credentials once, sequentially
pub async fn run_order_sync_pass(
    order_syncer: &dyn OrderSyncer,
    credentials: &dyn CredentialStore,
) -> PassSummary {
    let user_ids = match credentials.active_user_ids(PROVIDER).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list users for order sync");
            return PassSummary::default();
        }
    };

    let mut summary = PassSummary {
        users: user_ids.len(),
        ..Default::default()
    };

    for user_id in user_ids {
        match order_syncer.sync_orders(user_id).await {
            Ok(run) => {
                summary.synced += 1;
                tracing::info!(
                    user_id,
                    status = %run.status,
                    orders = run.orders_count,
                    "Scheduled order sync finished"
                );
            }
            Err(SyncError::AlreadyRunning { .. }) => {
                summary.skipped += 1;
            }
            Err(e) => {
                // One user's failure doesn't stop the pass
                summary.failed += 1;
                tracing::error!(user_id, error = %e, "Scheduled order sync failed");
            }
        }
    }

    summary
}

/// Start the scheduled order sync job
///
/// Runs one pass every `period` until `shutdown` fires. A pass in progress
/// finishes before the job exits.
pub fn start_order_sync_job(
    order_syncer: Arc<dyn OrderSyncer>,
    credentials: Arc<dyn CredentialStore>,
    period: Duration,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(interval_secs = period.as_secs(), "Order sync job started");

        let mut interval = interval(period);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Order sync job stopped");
                    break;
                }
                _ = interval.tick() => {
                    let summary = run_order_sync_pass(order_syncer.as_ref(), credentials.as_ref()).await;
                    tracing::info!(
                        users = summary.users,
                        synced = summary.synced,
                        skipped = summary.skipped,
                        failed = summary.failed,
                        "Order sync pass complete"
                    );
                }
            }
        }
    })
}
