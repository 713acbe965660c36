//! Per-user authenticated client cache
//!
//! One client per `(user, kind)`. Entries expire a fixed TTL after creation
//! (use does not extend them) and the cache holds at most `max_clients`
//! entries across all kinds, evicting the least recently used one when full.
//! A background task sweeps expired entries every TTL/2.

use parking_lot::{Mutex, RwLock};
use sea_orm::DbErr;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::{Instant, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{ApiConfig, ClientCacheConfig};
use crate::models::credentials::CredentialSet;
use crate::models::response::CacheStatsResponse;
use crate::services::bricklink::{BricklinkClient, BricklinkError, PROVIDER};
use crate::services::credentials::CredentialStore;

/// Client flavours. They share credentials but are cached separately so
/// each caller family gets its own connection pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientKind {
    Catalog,
    Orders,
    Base,
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientKind::Catalog => f.write_str("catalog"),
            ClientKind::Orders => f.write_str("orders"),
            ClientKind::Base => f.write_str("base"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientCacheError {
    #[error("client cache is closed")]
    Closed,
    #[error("no active bricklink credentials for user {user_id}")]
    MissingCredentials { user_id: i64 },
    #[error("credential lookup failed for user {user_id}: {source}")]
    CredentialLookup {
        user_id: i64,
        #[source]
        source: DbErr,
    },
    #[error("failed to build {kind} client for user {user_id}: {source}")]
    Build {
        user_id: i64,
        kind: ClientKind,
        #[source]
        source: BricklinkError,
    },
}

type CacheKey = (i64, ClientKind);

struct CachedClient {
    client: Arc<BricklinkClient>,
    expires_at: Instant,
    /// Refreshed on hits while only the read lock is held
    last_used: Mutex<Instant>,
}

pub struct ClientCache {
    entries: Arc<RwLock<HashMap<CacheKey, CachedClient>>>,
    store: Arc<dyn CredentialStore>,
    api: ApiConfig,
    config: ClientCacheConfig,
    closed: AtomicBool,
    shutdown: CancellationToken,
}

impl ClientCache {
    /// Builds the cache and starts its sweeper. Must be called inside a
    /// Tokio runtime.
    pub fn new(store: Arc<dyn CredentialStore>, api: ApiConfig, config: ClientCacheConfig) -> Self {
        let entries = Arc::new(RwLock::new(HashMap::new()));
        let shutdown = CancellationToken::new();

        spawn_sweeper(
            Arc::clone(&entries),
            (config.ttl / 2).max(Duration::from_millis(1)),
            shutdown.clone(),
        );

        info!(
            ttl_secs = config.ttl.as_secs(),
            max_clients = config.max_clients,
            fallback_enabled = config.fallback_credentials.is_some(),
            "Client cache started"
        );

        Self {
            entries,
            store,
            api,
            config,
            closed: AtomicBool::new(false),
            shutdown,
        }
    }

    pub async fn get_catalog_client(&self, user_id: i64) -> Result<Arc<BricklinkClient>, ClientCacheError> {
        self.get(user_id, ClientKind::Catalog).await
    }

    pub async fn get_orders_client(&self, user_id: i64) -> Result<Arc<BricklinkClient>, ClientCacheError> {
        self.get(user_id, ClientKind::Orders).await
    }

    pub async fn get_base_client(&self, user_id: i64) -> Result<Arc<BricklinkClient>, ClientCacheError> {
        self.get(user_id, ClientKind::Base).await
    }

    /// Cached client for `(user_id, kind)`, created on miss or expiry
    pub async fn get(&self, user_id: i64, kind: ClientKind) -> Result<Arc<BricklinkClient>, ClientCacheError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ClientCacheError::Closed);
        }

        let key = (user_id, kind);
        if let Some(client) = self.live_entry(&key, Instant::now()) {
            debug!(user_id, kind = %kind, "Using cached client");
            return Ok(client);
        }

        // Lock is not held across the credential lookup
        let credentials = self.resolve_credentials(user_id).await?;
        let client = BricklinkClient::new(credentials, &self.api)
            .map_err(|source| ClientCacheError::Build { user_id, kind, source })?;
        let client = Arc::new(client);

        let mut entries = self.entries.write();
        if self.closed.load(Ordering::Acquire) {
            return Err(ClientCacheError::Closed);
        }

        let now = Instant::now();
        // Entries the sweeper has not reached yet never count against capacity
        entries.retain(|_, entry| now < entry.expires_at);
        if let Some(existing) = entries.get(&key) {
            // Another caller won the race
            *existing.last_used.lock() = now;
            return Ok(Arc::clone(&existing.client));
        }

        if entries.len() >= self.config.max_clients {
            evict_least_recently_used(&mut entries);
        }

        entries.insert(
            key,
            CachedClient {
                client: Arc::clone(&client),
                expires_at: now + self.config.ttl,
                last_used: Mutex::new(now),
            },
        );
        info!(user_id, kind = %kind, cached_clients = entries.len(), "Created new client");

        Ok(client)
    }

    fn live_entry(&self, key: &CacheKey, now: Instant) -> Option<Arc<BricklinkClient>> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if now >= entry.expires_at {
            return None;
        }
        *entry.last_used.lock() = now;
        Some(Arc::clone(&entry.client))
    }

    async fn resolve_credentials(&self, user_id: i64) -> Result<CredentialSet, ClientCacheError> {
        let fallback = self.config.fallback_credentials.as_ref();

        match self.store.lookup(user_id, PROVIDER).await {
            Ok(Some(credentials)) if !credentials.is_incomplete() => Ok(credentials),
            Ok(found) => {
                if found.is_some() {
                    warn!(user_id, "Stored credentials are incomplete");
                }
                match fallback {
                    Some(fallback) => {
                        warn!(user_id, "No usable credentials, using fallback credentials");
                        Ok(fallback.clone())
                    }
                    None => Err(ClientCacheError::MissingCredentials { user_id }),
                }
            }
            Err(source) => match fallback {
                Some(fallback) => {
                    warn!(user_id, error = %source, "Credential lookup failed, using fallback credentials");
                    Ok(fallback.clone())
                }
                None => Err(ClientCacheError::CredentialLookup { user_id, source }),
            },
        }
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write();
        let dropped = entries.len();
        entries.clear();
        info!(dropped, "Client cache cleared");
    }

    /// Stops the sweeper and drops every client. Later `get` calls fail.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.shutdown.cancel();
        self.clear();
    }

    pub fn stats(&self) -> CacheStatsResponse {
        CacheStatsResponse {
            cached_clients: self.entries.read().len(),
            max_clients: self.config.max_clients,
            cache_ttl_secs: self.config.ttl.as_secs(),
        }
    }
}

impl Drop for ClientCache {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn evict_least_recently_used(entries: &mut HashMap<CacheKey, CachedClient>) {
    let victim = entries
        .iter()
        .min_by_key(|(_, entry)| *entry.last_used.lock())
        .map(|(key, _)| *key);

    if let Some(key) = victim {
        entries.remove(&key);
        debug!(user_id = key.0, kind = %key.1, "Evicted least recently used client");
    }
}

fn remove_expired(entries: &RwLock<HashMap<CacheKey, CachedClient>>, now: Instant) -> usize {
    let mut entries = entries.write();
    let before = entries.len();
    entries.retain(|_, entry| now < entry.expires_at);
    before - entries.len()
}

fn spawn_sweeper(
    entries: Arc<RwLock<HashMap<CacheKey, CachedClient>>>,
    period: Duration,
    shutdown: CancellationToken,
) {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Client cache sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let removed = remove_expired(&entries, Instant::now());
                    if removed > 0 {
                        debug!(removed, "Removed expired clients");
                    }
                }
            }
        }
    });
}
