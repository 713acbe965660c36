use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bricksync_backend::{
    AppState,
    config::AppConfig,
    jobs::order_sync::start_order_sync_job,
    router,
    services::{
        catalog::CatalogService,
        client_cache::ClientCache,
        credentials::{CredentialStore, DbCredentialStore},
        notifications::NotificationDispatcher,
        order_repository::SeaOrmOrderRepository,
        order_sync::{OrderSyncService, OrderSyncer},
    },
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bricksync_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().expect("Invalid configuration");

    // Connect to database
    tracing::info!("Connecting to database...");
    let db = Arc::new(
        Database::connect(&config.database_url)
            .await
            .expect("Failed to connect to database"),
    );

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(db.as_ref(), None)
        .await
        .expect("Failed to run migrations");

    let credentials: Arc<dyn CredentialStore> = Arc::new(DbCredentialStore::new(Arc::clone(&db)));
    let clients = Arc::new(ClientCache::new(
        credentials.clone(),
        config.api.clone(),
        config.client_cache.clone(),
    ));
    let order_sync = Arc::new(OrderSyncService::new(
        clients.clone(),
        Arc::new(SeaOrmOrderRepository::new(db)),
    ));
    let dispatcher = Arc::new(NotificationDispatcher::new(
        clients.clone(),
        order_sync.clone() as Arc<dyn OrderSyncer>,
    ));
    let catalog = CatalogService::new(clients.clone(), config.item_cache_ttl);

    let shutdown = CancellationToken::new();

    // Start background jobs
    let order_sync_job = match config.order_sync_interval {
        Some(period) => Some(start_order_sync_job(
            order_sync.clone(),
            credentials.clone(),
            period,
            shutdown.clone(),
        )),
        None => {
            tracing::info!("ORDER_SYNC_INTERVAL_SECS not set - scheduled order sync disabled");
            None
        }
    };

    let state = AppState {
        clients: clients.clone(),
        order_sync,
        dispatcher,
        catalog,
    };

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .expect("Failed to bind server address");

    tracing::info!(
        "Server listening on {}",
        listener.local_addr().expect("Listener has no local address")
    );

    let signal = shutdown.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutdown signal received");
            signal.cancel();
        })
        .await
        .expect("Server error");

    if let Some(job) = order_sync_job {
        if let Err(e) = job.await {
            tracing::error!("Order sync job ended abnormally: {}", e);
        }
    }
    clients.close();
    tracing::info!("Shutdown complete");
}
