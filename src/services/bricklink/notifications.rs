use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::{BricklinkClient, BricklinkError, PROVIDER};
use crate::models::notification::{Notification, NotificationType};

pub const NOTIFICATIONS_ENDPOINT: &str = "/notifications";

/// Unread push notification. The provider has shipped both `type` and
/// `event_type`, and numeric as well as string ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BricklinkNotification {
    #[serde(default, deserialize_with = "string_or_number")]
    pub notification_id: Option<String>,
    #[serde(rename = "type", alias = "event_type")]
    pub event_type: String,
    pub resource_type: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub resource_id: Option<String>,
    pub message: Option<String>,
    #[serde(alias = "timestamp")]
    pub date_created: Option<DateTime<Utc>>,
}

impl BricklinkNotification {
    pub fn into_notification(self, user_id: i64) -> Notification {
        let kind = NotificationType::from_provider(&self.event_type);
        let id = self
            .notification_id
            .or_else(|| self.resource_id.clone())
            .unwrap_or_default();

        Notification {
            id,
            provider: PROVIDER.to_string(),
            kind,
            resource_type: self.resource_type,
            resource_id: self.resource_id,
            message: self.message,
            date_created: self.date_created,
            user_id,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl BricklinkClient {
    pub async fn get_notifications(&self) -> Result<Vec<BricklinkNotification>, BricklinkError> {
        let response = self.get(NOTIFICATIONS_ENDPOINT).await.inspect_err(|e| {
            tracing::error!(error = %e, "Failed to fetch notifications from BrickLink");
        })?;

        let notifications: Vec<BricklinkNotification> = response.data("notifications")?;
        tracing::debug!(count = notifications.len(), "Fetched BrickLink notifications");
        Ok(notifications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_event_type_and_numeric_ids() {
        let json = r#"{"event_type":"Order","resource_id":3986441,"timestamp":"2024-01-15T08:20:02.177Z"}"#;
        let raw: BricklinkNotification = serde_json::from_str(json).unwrap();

        assert_eq!(raw.event_type, "Order");
        assert_eq!(raw.resource_id.as_deref(), Some("3986441"));
        assert!(raw.date_created.is_some());

        let notification = raw.into_notification(42);
        assert_eq!(notification.id, "3986441");
        assert_eq!(notification.provider, "bricklink");
        assert_eq!(notification.user_id, 42);
        assert!(notification.kind.is_order_related());
    }

    #[test]
    fn test_decodes_detailed_shape() {
        let json = r#"{
            "notification_id": 77,
            "type": "MESSAGE_NEW",
            "resource_type": "message",
            "resource_id": "m-1",
            "message": "Hello"
        }"#;
        let notification = serde_json::from_str::<BricklinkNotification>(json)
            .unwrap()
            .into_notification(1);

        assert_eq!(notification.id, "77");
        assert_eq!(notification.kind, NotificationType::MessageNew);
        assert_eq!(notification.message.as_deref(), Some("Hello"));
        assert!(notification.date_created.is_none());
    }
}
