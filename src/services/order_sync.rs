//! Order synchronization engine
//!
//! One run pulls every incoming order modified since the user's last
//! completed run and upserts it locally. Each run is recorded in
//! `order_syncs`: created `in_progress`, then finalized exactly once as
//! `completed`, `completed_with_errors` or `failed`. Only completed runs move
//! the cursor forward.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Months, Utc};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::models::order::{OrderSyncRun, SyncStatus, UpsertOutcome};
use crate::services::bricklink::BricklinkError;
use crate::services::bricklink::orders::{BricklinkOrder, decode_order, raw_order_id};
use crate::services::client_cache::{ClientCache, ClientCacheError};
use crate::services::order_normalize::normalize_order;
use crate::services::order_repository::{OrderRepository, RepositoryError};

/// How far back the first sync for a user reaches
pub const INITIAL_LOOKBACK_MONTHS: u32 = 6;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("an order sync is already running for user {user_id}")]
    AlreadyRunning { user_id: i64 },

    #[error("order sync for user {user_id} was cancelled")]
    Cancelled { user_id: i64 },

    #[error(transparent)]
    Client(#[from] ClientCacheError),

    #[error("failed to fetch orders: {0}")]
    Api(#[from] BricklinkError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Orders may have been written but the run row still says `in_progress`
    #[error("failed to finalize sync run {}: {source}", .run.id)]
    FinalizeFailed {
        run: Box<OrderSyncRun>,
        #[source]
        source: RepositoryError,
    },
}

/// Anything that can run an order sync for one user
#[async_trait]
pub trait OrderSyncer: Send + Sync {
    async fn sync_orders(&self, user_id: i64) -> Result<OrderSyncRun, SyncError>;
}

pub struct OrderSyncService {
    clients: Arc<ClientCache>,
    repository: Arc<dyn OrderRepository>,
    in_flight: Mutex<HashSet<i64>>,
}

/// Marks a user as syncing until dropped
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<i64>>,
    user_id: i64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.user_id);
    }
}

#[derive(Debug, Default)]
struct RunTally {
    total: usize,
    created: usize,
    updated: usize,
    failed: usize,
    first_error: Option<String>,
}

impl RunTally {
    fn succeeded(&self) -> usize {
        self.created + self.updated
    }

    fn status(&self) -> SyncStatus {
        if self.failed == 0 {
            SyncStatus::Completed
        } else {
            SyncStatus::CompletedWithErrors
        }
    }

    fn summary(&self) -> Option<String> {
        let first = self.first_error.as_deref()?;
        Some(format!(
            "{} of {} orders failed to sync; first error: {}",
            self.failed, self.total, first
        ))
    }
}

/// Cursor used when the user has no completed run yet
pub fn initial_cursor(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(INITIAL_LOOKBACK_MONTHS))
        .unwrap_or_else(|| now - Duration::days(182))
}

impl OrderSyncService {
    pub fn new(clients: Arc<ClientCache>, repository: Arc<dyn OrderRepository>) -> Self {
        Self {
            clients,
            repository,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Same as `sync_orders`, but gives up before contacting the provider if
    /// `cancel` has fired. Once the fetch starts the run goes to completion.
    pub async fn sync_orders_with_cancellation(
        &self,
        user_id: i64,
        cancel: &CancellationToken,
    ) -> Result<OrderSyncRun, SyncError> {
        let _guard = self.begin(user_id)?;

        let started_at = Utc::now();
        let run = self.repository.create_sync_run(user_id, started_at).await?;
        info!(user_id, run_id = run.id, "Order sync started");

        let cursor = self.cursor(user_id, started_at).await;

        if cancel.is_cancelled() {
            warn!(user_id, run_id = run.id, "Order sync cancelled before fetch");
            self.finish(run, SyncStatus::Failed, 0, Some("sync cancelled".to_string()))
                .await?;
            return Err(SyncError::Cancelled { user_id });
        }

        let client = match self.clients.get_orders_client(user_id).await {
            Ok(client) => client,
            Err(e) => {
                error!(user_id, run_id = run.id, error = %e, "No orders client for user");
                self.finish(run, SyncStatus::Failed, 0, Some(e.to_string())).await?;
                return Err(e.into());
            }
        };

        let raw_orders = match client.get_orders_since(cursor).await {
            Ok(orders) => orders,
            Err(e) => {
                error!(user_id, run_id = run.id, error = %e, "Failed to fetch orders");
                self.finish(run, SyncStatus::Failed, 0, Some(e.to_string())).await?;
                return Err(e.into());
            }
        };

        info!(user_id, run_id = run.id, count = raw_orders.len(), cursor = %cursor, "Fetched orders");

        let mut tally = RunTally {
            total: raw_orders.len(),
            ..Default::default()
        };

        for raw in raw_orders {
            let order_id = raw_order_id(&raw);
            let outcome = match decode_order(raw) {
                Ok(order) => self.store_order(user_id, &order).await,
                Err(e) => Err(match order_id {
                    Some(id) => format!("order {}: malformed payload: {}", id, e),
                    None => format!("malformed order payload: {}", e),
                }),
            };

            match outcome {
                Ok(UpsertOutcome::Created) => tally.created += 1,
                Ok(UpsertOutcome::Updated) => tally.updated += 1,
                Err(message) => {
                    warn!(user_id, order_id = ?order_id, error = %message, "Failed to sync order");
                    tally.failed += 1;
                    tally.first_error.get_or_insert(message);
                }
            }
        }

        let status = tally.status();
        let processed = i32::try_from(tally.succeeded()).unwrap_or(i32::MAX);
        let run = self.finish(run, status, processed, tally.summary()).await?;

        info!(
            user_id,
            run_id = run.id,
            status = %run.status,
            created = tally.created,
            updated = tally.updated,
            failed = tally.failed,
            "Order sync finished"
        );

        Ok(run)
    }

    async fn store_order(&self, user_id: i64, raw: &BricklinkOrder) -> Result<UpsertOutcome, String> {
        let order = normalize_order(raw).map_err(|e| e.to_string())?;
        self.repository
            .upsert(user_id, &order)
            .await
            .map_err(|e| format!("order {}: {}", raw.order_id, e))
    }

    fn begin(&self, user_id: i64) -> Result<InFlightGuard<'_>, SyncError> {
        let mut in_flight = self.in_flight.lock();
        if !in_flight.insert(user_id) {
            warn!(user_id, "Order sync already running, skipping");
            return Err(SyncError::AlreadyRunning { user_id });
        }
        Ok(InFlightGuard {
            in_flight: &self.in_flight,
            user_id,
        })
    }

    async fn cursor(&self, user_id: i64, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.repository.get_last_completed_sync_time(user_id).await {
            Ok(Some(last)) => last,
            Ok(None) => initial_cursor(now),
            Err(e) => {
                warn!(user_id, error = %e, "Could not read last sync time, using initial lookback");
                initial_cursor(now)
            }
        }
    }

    async fn finish(
        &self,
        mut run: OrderSyncRun,
        status: SyncStatus,
        orders_count: i32,
        error_message: Option<String>,
    ) -> Result<OrderSyncRun, SyncError> {
        run.status = status;
        run.orders_count = orders_count;
        run.error_message = error_message;

        self.repository.update_sync_run(&run).await.map_err(|source| {
            error!(user_id = run.user_id, run_id = run.id, error = %source, "Failed to finalize sync run");
            SyncError::FinalizeFailed {
                run: Box::new(run.clone()),
                source,
            }
        })
    }
}

#[async_trait]
impl OrderSyncer for OrderSyncService {
    async fn sync_orders(&self, user_id: i64) -> Result<OrderSyncRun, SyncError> {
        self.sync_orders_with_cancellation(user_id, &CancellationToken::new())
            .await
    }
}
