#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sea_orm::DbErr;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bricksync_backend::config::{ApiConfig, ClientCacheConfig};
use bricksync_backend::models::credentials::CredentialSet;
use bricksync_backend::models::order::{NewOrder, OrderSyncRun, SyncStatus, UpsertOutcome};
use bricksync_backend::services::client_cache::ClientCache;
use bricksync_backend::services::credentials::CredentialStore;
use bricksync_backend::services::order_repository::{OrderRepository, RepositoryError};

/// Credential store backed by a map of user id to credentials
#[derive(Default)]
pub struct InMemoryCredentialStore {
    creds: Mutex<HashMap<i64, CredentialSet>>,
    pub lookups: AtomicUsize,
}

impl InMemoryCredentialStore {
    pub fn with_users(users: &[i64]) -> Self {
        let store = Self::default();
        for user_id in users {
            store.insert(*user_id, test_credentials(*user_id));
        }
        store
    }

    pub fn insert(&self, user_id: i64, creds: CredentialSet) {
        self.creds.lock().insert(user_id, creds);
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn lookup(&self, user_id: i64, _provider: &str) -> Result<Option<CredentialSet>, DbErr> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.creds.lock().get(&user_id).cloned())
    }

    async fn active_user_ids(&self, _provider: &str) -> Result<Vec<i64>, DbErr> {
        let mut ids: Vec<i64> = self.creds.lock().keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[derive(Debug, Clone)]
pub struct StoredOrder {
    pub id: i32,
    pub order: NewOrder,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order repository kept in memory. Upserts for ids listed in
/// `failing_orders` return an error; `fail_finalize` makes run updates fail.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<HashMap<(i64, i64), StoredOrder>>,
    runs: Mutex<Vec<OrderSyncRun>>,
    failing_orders: Mutex<Vec<i64>>,
    fail_finalize: Mutex<bool>,
}

impl InMemoryOrderRepository {
    pub fn fail_upserts_for(&self, order_id: i64) {
        self.failing_orders.lock().push(order_id);
    }

    pub fn fail_finalize(&self) {
        *self.fail_finalize.lock() = true;
    }

    pub fn orders_for(&self, user_id: i64) -> Vec<StoredOrder> {
        let mut rows: Vec<StoredOrder> = self
            .orders
            .lock()
            .iter()
            .filter(|((uid, _), _)| *uid == user_id)
            .map(|(_, row)| row.clone())
            .collect();
        rows.sort_by_key(|row| row.order.bricklink_order_id);
        rows
    }

    pub fn runs_for(&self, user_id: i64) -> Vec<OrderSyncRun> {
        self.runs
            .lock()
            .iter()
            .filter(|run| run.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Seeds a finished run, e.g. to set the cursor
    pub fn push_run(&self, user_id: i64, started_at: DateTime<Utc>, status: SyncStatus) {
        let mut runs = self.runs.lock();
        let id = runs.len() as i32 + 1;
        runs.push(OrderSyncRun {
            id,
            user_id,
            last_sync_time: started_at,
            status,
            orders_count: 0,
            error_message: None,
            created_at: started_at,
            updated_at: Some(started_at),
        });
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_by_provider_order_id(
        &self,
        user_id: i64,
        bricklink_order_id: i64,
    ) -> Result<Option<i32>, RepositoryError> {
        Ok(self
            .orders
            .lock()
            .get(&(user_id, bricklink_order_id))
            .map(|row| row.id))
    }

    async fn upsert(&self, user_id: i64, order: &NewOrder) -> Result<UpsertOutcome, RepositoryError> {
        if self.failing_orders.lock().contains(&order.bricklink_order_id) {
            return Err(DbErr::Custom("unique constraint violated".to_string()).into());
        }

        let now = Utc::now();
        let mut orders = self.orders.lock();
        let next_id = orders.len() as i32 + 1;
        match orders.get_mut(&(user_id, order.bricklink_order_id)) {
            Some(row) => {
                row.order = order.clone();
                row.updated_at = now;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                orders.insert(
                    (user_id, order.bricklink_order_id),
                    StoredOrder {
                        id: next_id,
                        order: order.clone(),
                        created_at: now,
                        updated_at: now,
                    },
                );
                Ok(UpsertOutcome::Created)
            }
        }
    }

    async fn get_last_completed_sync_time(
        &self,
        user_id: i64,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        Ok(self
            .runs
            .lock()
            .iter()
            .filter(|run| run.user_id == user_id && run.status == SyncStatus::Completed)
            .map(|run| run.last_sync_time)
            .max())
    }

    async fn create_sync_run(
        &self,
        user_id: i64,
        started_at: DateTime<Utc>,
    ) -> Result<OrderSyncRun, RepositoryError> {
        let mut runs = self.runs.lock();
        let run = OrderSyncRun {
            id: runs.len() as i32 + 1,
            user_id,
            last_sync_time: started_at,
            status: SyncStatus::InProgress,
            orders_count: 0,
            error_message: None,
            created_at: Utc::now(),
            updated_at: None,
        };
        runs.push(run.clone());
        Ok(run)
    }

    async fn update_sync_run(&self, run: &OrderSyncRun) -> Result<OrderSyncRun, RepositoryError> {
        if *self.fail_finalize.lock() {
            return Err(DbErr::Custom("connection reset".to_string()).into());
        }

        let mut runs = self.runs.lock();
        let stored = runs
            .iter_mut()
            .find(|stored| stored.id == run.id)
            .ok_or_else(|| DbErr::RecordNotFound(format!("order sync {}", run.id)))?;
        stored.status = run.status;
        stored.orders_count = run.orders_count;
        stored.error_message = run.error_message.clone();
        stored.updated_at = Some(Utc::now());
        Ok(stored.clone())
    }
}

pub fn test_credentials(user_id: i64) -> CredentialSet {
    CredentialSet::new(
        format!("consumer-{user_id}"),
        "consumer-secret",
        format!("token-{user_id}"),
        "token-secret",
    )
}

/// Client cache pointed at a mock provider
pub fn client_cache(base_url: &str, store: Arc<dyn CredentialStore>) -> Arc<ClientCache> {
    let api = ApiConfig {
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
    };
    let config = ClientCacheConfig {
        ttl: Duration::from_secs(300),
        max_clients: 10,
        fallback_credentials: None,
    };
    Arc::new(ClientCache::new(store, api, config))
}

/// Successful provider envelope
pub fn envelope(data: Value) -> Value {
    json!({
        "meta": { "code": 200, "message": "OK", "description": "OK" },
        "data": data,
    })
}

/// Failed provider envelope
pub fn error_envelope(code: u16, message: &str, description: &str) -> Value {
    json!({
        "meta": { "code": code, "message": message, "description": description },
        "data": {},
    })
}

pub fn order_json(order_id: i64, date_ordered: &str, grand_total: &str) -> Value {
    json!({
        "order_id": order_id,
        "date_ordered": date_ordered,
        "date_status_changed": date_ordered,
        "seller_name": "brickstore",
        "store_name": "Brick Store",
        "buyer_name": "buyer1",
        "buyer_email": "buyer1@example.com",
        "status": "PAID",
        "total_count": 3,
        "unique_count": 2,
        "total_weight": "120.50",
        "payment": {
            "method": "PayPal",
            "currency_code": "USD",
            "date_paid": date_ordered,
            "status": "Received"
        },
        "cost": {
            "currency_code": "USD",
            "subtotal": grand_total,
            "grand_total": grand_total,
            "shipping": "0.00"
        }
    })
}
