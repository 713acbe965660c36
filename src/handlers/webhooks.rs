use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::{ApiError, api_error, client_error, provider_error, sync_error};
use crate::AppState;
use crate::models::response::WebhookAck;
use crate::services::notifications::DispatchError;

/// POST /api/webhooks/{provider}/{user_id}
///
/// The body is ignored; notifications are pulled from the provider.
pub async fn receive_webhook(
    State(state): State<AppState>,
    Path((provider, user_id)): Path<(String, i64)>,
) -> Result<Json<WebhookAck>, ApiError> {
    tracing::info!(provider = %provider, user_id, "Webhook received");

    let outcome = state
        .dispatcher
        .trigger_sync(user_id, &provider)
        .await
        .map_err(|e| {
            tracing::error!(provider = %provider, user_id, error = %e, "Webhook dispatch failed");
            match &e {
                DispatchError::UnknownProvider(_) => api_error(StatusCode::NOT_FOUND, &e),
                DispatchError::Client(inner) => client_error(inner),
                DispatchError::Fetch(inner) => provider_error(inner),
                DispatchError::Sync(inner) => sync_error(inner),
            }
        })?;

    Ok(Json(WebhookAck {
        status: "ok".to_string(),
        notifications: outcome.notifications.len(),
        sync_triggered: outcome.sync_run.is_some(),
    }))
}
