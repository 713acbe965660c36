use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::services::bricklink::BricklinkError;
use crate::services::bricklink::catalog::CatalogItem;
use crate::services::client_cache::{ClientCache, ClientCacheError};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Client(#[from] ClientCacheError),
    #[error(transparent)]
    Lookup(#[from] BricklinkError),
}

/// Catalog item lookups through the user's catalog client. Item data is
/// the same for every user, so results are cached by item only.
#[derive(Clone)]
pub struct CatalogService {
    clients: Arc<ClientCache>,
    items: Cache<String, CatalogItem>,
}

impl CatalogService {
    pub fn new(clients: Arc<ClientCache>, ttl: Duration) -> Self {
        let items = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(ttl)
            .build();

        Self { clients, items }
    }

    pub async fn get_item(
        &self,
        user_id: i64,
        item_type: &str,
        item_no: &str,
    ) -> Result<CatalogItem, CatalogError> {
        let cache_key = format!("{}_{}", item_type.to_ascii_uppercase(), item_no);

        if let Some(item) = self.items.get(&cache_key).await {
            tracing::debug!("Cache hit for {}", cache_key);
            return Ok(item);
        }

        let client = self.clients.get_catalog_client(user_id).await?;
        let item = client.get_item(item_type, item_no).await?;

        self.items.insert(cache_key, item.clone()).await;
        Ok(item)
    }
}
