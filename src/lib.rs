// src/lib.rs

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use services::{
    catalog::CatalogService, client_cache::ClientCache, notifications::NotificationDispatcher,
    order_sync::OrderSyncService,
};

#[derive(Clone)]
pub struct AppState {
    pub clients: Arc<ClientCache>,
    pub order_sync: Arc<OrderSyncService>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub catalog: CatalogService,
}

pub mod entities {
    pub mod prelude;
    pub mod order_syncs;
    pub mod orders;
    pub mod user_oauth_credentials;
}

pub mod services {
    pub mod bricklink;
    pub mod catalog;
    pub mod client_cache;
    pub mod credentials;
    pub mod notifications;
    pub mod oauth;
    pub mod order_normalize;
    pub mod order_repository;
    pub mod order_sync;
}

pub mod config;
pub mod handlers;
pub mod jobs;
pub mod models;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(
            "/api/webhooks/{provider}/{user_id}",
            post(handlers::webhooks::receive_webhook),
        )
        .route(
            "/api/users/{user_id}/orders/sync",
            post(handlers::orders::sync_user_orders),
        )
        .route(
            "/api/users/{user_id}/items/{item_type}/{item_no}",
            get(handlers::catalog::get_catalog_item),
        )
        .route("/api/clients/stats", get(handlers::clients::get_client_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
