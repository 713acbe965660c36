use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Response for POST /api/webhooks/{provider}/{user_id}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub status: String,
    pub notifications: usize,
    pub sync_triggered: bool,
}

/// Response for GET /api/clients/stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatsResponse {
    pub cached_clients: usize,
    pub max_clients: usize,
    pub cache_ttl_secs: u64,
}
