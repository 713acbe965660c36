use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of event a provider notification reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    OrderNew,
    OrderStatusChanged,
    OrderItemsChanged,
    MessageNew,
    FeedbackNew,
    Other(String),
}

impl NotificationType {
    /// Maps the provider's event name. Accepts both the detailed
    /// (`ORDER_NEW`) and the coarse (`Order`) spellings.
    pub fn from_provider(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ORDER_NEW" => NotificationType::OrderNew,
            "ORDER_STATUS_CHANGED" | "ORDER" => NotificationType::OrderStatusChanged,
            "ORDER_ITEMS_CHANGED" => NotificationType::OrderItemsChanged,
            "MESSAGE_NEW" | "MESSAGE" => NotificationType::MessageNew,
            "FEEDBACK_NEW" | "FEEDBACK" => NotificationType::FeedbackNew,
            _ => NotificationType::Other(raw.to_string()),
        }
    }

    pub fn is_order_related(&self) -> bool {
        matches!(
            self,
            NotificationType::OrderNew
                | NotificationType::OrderStatusChanged
                | NotificationType::OrderItemsChanged
        )
    }
}

/// Provider-neutral notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub provider: String,
    pub kind: NotificationType,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub message: Option<String>,
    pub date_created: Option<DateTime<Utc>>,
    pub user_id: i64,
}
