use axum::{
    Json,
    extract::{Path, State},
};

use super::{ApiError, sync_error};
use crate::AppState;
use crate::models::order::OrderSyncRun;
use crate::services::order_sync::OrderSyncer;

/// POST /api/users/{user_id}/orders/sync
pub async fn sync_user_orders(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<OrderSyncRun>, ApiError> {
    tracing::info!(user_id, "Manual order sync requested");

    let run = state.order_sync.sync_orders(user_id).await.map_err(|e| {
        tracing::error!(user_id, error = %e, "Manual order sync failed");
        sync_error(&e)
    })?;

    Ok(Json(run))
}
