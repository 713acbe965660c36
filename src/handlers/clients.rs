use axum::{Json, extract::State};

use crate::AppState;
use crate::models::response::CacheStatsResponse;

/// GET /api/clients/stats
pub async fn get_client_stats(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    Json(state.clients.stats())
}
