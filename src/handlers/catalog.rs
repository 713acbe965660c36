use axum::{
    Json,
    extract::{Path, State},
};

use super::{ApiError, client_error, provider_error};
use crate::AppState;
use crate::services::bricklink::catalog::CatalogItem;
use crate::services::catalog::CatalogError;

/// GET /api/users/{user_id}/items/{item_type}/{item_no}
pub async fn get_catalog_item(
    State(state): State<AppState>,
    Path((user_id, item_type, item_no)): Path<(i64, String, String)>,
) -> Result<Json<CatalogItem>, ApiError> {
    let item = state
        .catalog
        .get_item(user_id, &item_type, &item_no)
        .await
        .map_err(|e| {
            tracing::warn!(user_id, item_type = %item_type, item_no = %item_no, error = %e, "Catalog lookup failed");
            match &e {
                CatalogError::Client(inner) => client_error(inner),
                CatalogError::Lookup(inner) => provider_error(inner),
            }
        })?;

    Ok(Json(item))
}
