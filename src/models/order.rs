use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::entities::order_syncs;

/// A provider order flattened into the `orders` row shape.
///
/// Every `Option` stays `None` when the source field, or the sub-object that
/// carries it, was missing from the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub bricklink_order_id: i64,
    pub date_ordered: DateTime<Utc>,
    pub date_status_changed: Option<DateTime<Utc>>,
    pub seller_name: Option<String>,
    pub store_name: Option<String>,
    pub buyer_name: String,
    pub buyer_email: Option<String>,
    pub buyer_order_count: Option<i32>,
    pub status: String,
    pub is_invoiced: Option<bool>,
    pub require_insurance: Option<bool>,
    pub remarks: Option<String>,
    pub total_count: Option<i32>,
    pub unique_count: Option<i32>,
    pub total_weight: Option<Decimal>,
    pub is_filed: Option<bool>,
    pub drive_thru_sent: Option<bool>,
    pub payment: PaymentFields,
    pub shipping: ShippingFields,
    pub cost: CostFields,
    pub display_cost: CostFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentFields {
    pub method: Option<String>,
    pub currency_code: Option<String>,
    pub status: Option<String>,
    pub date_paid: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShippingFields {
    pub method_id: Option<i32>,
    pub method: Option<String>,
    pub tracking_link: Option<String>,
    pub address_name: Option<String>,
    pub address_full: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostFields {
    pub currency_code: Option<String>,
    pub subtotal: Option<Decimal>,
    pub grand_total: Option<Decimal>,
    pub etc1: Option<Decimal>,
    pub etc2: Option<Decimal>,
    pub insurance: Option<Decimal>,
    pub shipping: Option<Decimal>,
    pub credit: Option<Decimal>,
    pub coupon: Option<Decimal>,
    pub vat_rate: Option<Decimal>,
    pub vat_amount: Option<Decimal>,
}

/// Outcome of a single upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Lifecycle of one sync attempt. Only `InProgress` is non-terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    InProgress,
    Completed,
    Failed,
    CompletedWithErrors,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::InProgress => "in_progress",
            SyncStatus::Completed => "completed",
            SyncStatus::Failed => "failed",
            SyncStatus::CompletedWithErrors => "completed_with_errors",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SyncStatus::InProgress)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown sync status: {0}")]
pub struct UnknownSyncStatus(pub String);

impl FromStr for SyncStatus {
    type Err = UnknownSyncStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(SyncStatus::InProgress),
            "completed" => Ok(SyncStatus::Completed),
            "failed" => Ok(SyncStatus::Failed),
            "completed_with_errors" => Ok(SyncStatus::CompletedWithErrors),
            other => Err(UnknownSyncStatus(other.to_string())),
        }
    }
}

/// One recorded order sync attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSyncRun {
    pub id: i32,
    pub user_id: i64,
    /// When the attempt started; the next cursor once this run is `completed`
    pub last_sync_time: DateTime<Utc>,
    pub status: SyncStatus,
    pub orders_count: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<order_syncs::Model> for OrderSyncRun {
    type Error = UnknownSyncStatus;

    fn try_from(model: order_syncs::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            last_sync_time: model.last_sync_time.with_timezone(&Utc),
            status: model.sync_status.parse()?,
            orders_count: model.orders_count,
            error_message: model.error_message,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.map(|t| t.with_timezone(&Utc)),
        })
    }
}
