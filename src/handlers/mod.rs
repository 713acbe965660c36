pub mod catalog;
pub mod clients;
pub mod orders;
pub mod webhooks;

use axum::{Json, http::StatusCode};

use crate::models::response::ErrorResponse;
use crate::services::bricklink::BricklinkError;
use crate::services::client_cache::ClientCacheError;
use crate::services::order_sync::SyncError;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (status, Json(ErrorResponse::new(error.to_string())))
}

fn client_error(e: &ClientCacheError) -> ApiError {
    let status = match e {
        ClientCacheError::MissingCredentials { .. } => StatusCode::NOT_FOUND,
        ClientCacheError::Closed => StatusCode::SERVICE_UNAVAILABLE,
        ClientCacheError::CredentialLookup { .. } | ClientCacheError::Build { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    api_error(status, e)
}

fn provider_error(e: &BricklinkError) -> ApiError {
    let status = match e {
        BricklinkError::InvalidItemId { .. } => StatusCode::BAD_REQUEST,
        BricklinkError::ItemLookupFailed { .. } => StatusCode::NOT_FOUND,
        BricklinkError::Transport(_) | BricklinkError::Api { .. } | BricklinkError::Decode { .. } => {
            StatusCode::BAD_GATEWAY
        }
    };
    api_error(status, e)
}

fn sync_error(e: &SyncError) -> ApiError {
    match e {
        SyncError::AlreadyRunning { .. } => api_error(StatusCode::CONFLICT, e),
        SyncError::Cancelled { .. } => api_error(StatusCode::SERVICE_UNAVAILABLE, e),
        SyncError::Client(inner) => client_error(inner),
        SyncError::Api(inner) => provider_error(inner),
        SyncError::Repository(_) | SyncError::FinalizeFailed { .. } => {
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}
