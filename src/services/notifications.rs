//! Webhook-triggered notification handling
//!
//! A provider webhook carries no payload worth trusting, only the hint that
//! something changed. The dispatcher pulls the user's unread notifications
//! and runs a single order sync if any of them concern orders.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::notification::{Notification, NotificationType};
use crate::models::order::OrderSyncRun;
use crate::services::bricklink::{BricklinkError, PROVIDER};
use crate::services::client_cache::{ClientCache, ClientCacheError};
use crate::services::order_sync::{OrderSyncer, SyncError};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("unsupported provider: {0}")]
    UnknownProvider(String),
    #[error(transparent)]
    Client(#[from] ClientCacheError),
    #[error("failed to fetch notifications: {0}")]
    Fetch(#[from] BricklinkError),
    #[error(transparent)]
    Sync(#[from] SyncError),
}

#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    pub notifications: Vec<Notification>,
    /// Set when this dispatch ran an order sync
    pub sync_run: Option<OrderSyncRun>,
    /// Order notifications arrived while a sync for the user was running
    pub sync_already_running: bool,
}

pub struct NotificationDispatcher {
    clients: Arc<ClientCache>,
    order_syncer: Arc<dyn OrderSyncer>,
}

impl NotificationDispatcher {
    pub fn new(clients: Arc<ClientCache>, order_syncer: Arc<dyn OrderSyncer>) -> Self {
        Self {
            clients,
            order_syncer,
        }
    }

    pub async fn trigger_sync(&self, user_id: i64, provider: &str) -> Result<DispatchOutcome, DispatchError> {
        if !provider.eq_ignore_ascii_case(PROVIDER) {
            warn!(user_id, provider = %provider, "Webhook for unsupported provider");
            return Err(DispatchError::UnknownProvider(provider.to_string()));
        }

        let client = self.clients.get_base_client(user_id).await?;
        let notifications: Vec<Notification> = client
            .get_notifications()
            .await?
            .into_iter()
            .map(|n| n.into_notification(user_id))
            .collect();

        info!(user_id, count = notifications.len(), "Fetched notifications");

        let mut order_related = false;
        for notification in &notifications {
            match &notification.kind {
                kind if kind.is_order_related() => {
                    debug!(user_id, resource_id = ?notification.resource_id, kind = ?kind, "Order notification");
                    order_related = true;
                }
                NotificationType::MessageNew => {
                    info!(user_id, resource_id = ?notification.resource_id, "New message notification")
                }
                NotificationType::FeedbackNew => {
                    info!(user_id, resource_id = ?notification.resource_id, "New feedback notification")
                }
                other => debug!(user_id, kind = ?other, "Ignoring notification"),
            }
        }

        let mut outcome = DispatchOutcome {
            notifications,
            ..Default::default()
        };

        if !order_related {
            return Ok(outcome);
        }

        match self.order_syncer.sync_orders(user_id).await {
            Ok(run) => outcome.sync_run = Some(run),
            Err(SyncError::AlreadyRunning { .. }) => {
                info!(user_id, "Order sync already in progress, notification covered");
                outcome.sync_already_running = true;
            }
            Err(e) => return Err(e.into()),
        }

        Ok(outcome)
    }
}
