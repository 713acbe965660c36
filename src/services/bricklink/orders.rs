use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::{BricklinkClient, BricklinkError};

pub const ORDERS_ENDPOINT: &str = "/orders";

/// Order as returned by `GET /orders`. Dates and money stay as the
/// provider's strings; normalization happens in the sync engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BricklinkOrder {
    pub order_id: i64,
    #[serde(default)]
    pub date_ordered: String,
    pub date_status_changed: Option<String>,
    pub seller_name: Option<String>,
    pub store_name: Option<String>,
    #[serde(default)]
    pub buyer_name: String,
    pub buyer_email: Option<String>,
    pub buyer_order_count: Option<i32>,
    pub require_insurance: Option<bool>,
    #[serde(default)]
    pub status: String,
    pub is_invoiced: Option<bool>,
    pub remarks: Option<String>,
    pub total_count: Option<i32>,
    pub unique_count: Option<i32>,
    pub total_weight: Option<String>,
    pub is_filed: Option<bool>,
    pub drive_thru_sent: Option<bool>,
    pub payment: Option<OrderPayment>,
    pub shipping: Option<OrderShipping>,
    pub cost: Option<OrderCost>,
    pub disp_cost: Option<OrderCost>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderPayment {
    pub method: Option<String>,
    pub currency_code: Option<String>,
    pub date_paid: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderShipping {
    pub method_id: Option<i32>,
    pub method: Option<String>,
    pub tracking_link: Option<String>,
    pub address: Option<ShippingAddress>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: Option<ShippingName>,
    pub full: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShippingName {
    pub full: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderCost {
    pub currency_code: Option<String>,
    pub subtotal: Option<String>,
    pub grand_total: Option<String>,
    pub etc1: Option<String>,
    pub etc2: Option<String>,
    pub insurance: Option<String>,
    pub shipping: Option<String>,
    pub credit: Option<String>,
    pub coupon: Option<String>,
    pub vat_rate: Option<String>,
    pub vat_amount: Option<String>,
}

/// Which side of the trade the listed orders are on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderDirection {
    /// Orders received as a seller
    #[default]
    In,
    /// Orders placed as a buyer
    Out,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::In => f.write_str("in"),
            OrderDirection::Out => f.write_str("out"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrdersOptions {
    pub updated_after: Option<DateTime<Utc>>,
    /// Comma separated provider statuses; empty means all
    pub status: String,
    pub direction: OrderDirection,
}

impl OrdersOptions {
    pub fn updated_since(cursor: DateTime<Utc>) -> Self {
        Self {
            updated_after: Some(cursor),
            ..Default::default()
        }
    }
}

/// `/orders` path and query. The provider only understands day granularity
/// for `updated_after`.
pub fn orders_endpoint(options: Option<&OrdersOptions>) -> String {
    let Some(options) = options else {
        return ORDERS_ENDPOINT.to_string();
    };

    let mut params = Vec::new();
    if let Some(after) = options.updated_after {
        params.push(format!("updated_after={}", after.format("%Y-%m-%d")));
    }
    if !options.status.is_empty() {
        params.push(format!("status={}", urlencoding::encode(&options.status)));
    }
    params.push(format!("direction={}", options.direction));

    format!("{}?{}", ORDERS_ENDPOINT, params.join("&"))
}

/// Decodes one element of the `/orders` data array
pub fn decode_order(value: Value) -> Result<BricklinkOrder, serde_json::Error> {
    serde_json::from_value(value)
}

/// `order_id` of an order that may not decode, for error reporting
pub fn raw_order_id(value: &Value) -> Option<i64> {
    value.get("order_id").and_then(Value::as_i64)
}

impl BricklinkClient {
    pub async fn get_orders(&self) -> Result<Vec<BricklinkOrder>, BricklinkError> {
        self.get_orders_with_options(None).await
    }

    /// All orders decoded; one malformed order fails the whole call
    pub async fn get_orders_with_options(
        &self,
        options: Option<&OrdersOptions>,
    ) -> Result<Vec<BricklinkOrder>, BricklinkError> {
        self.get_order_values(options)
            .await?
            .into_iter()
            .map(decode_order)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| BricklinkError::Decode { what: "orders", source })
    }

    /// The `data` array with each order left undecoded
    pub async fn get_order_values(
        &self,
        options: Option<&OrdersOptions>,
    ) -> Result<Vec<Value>, BricklinkError> {
        let endpoint = orders_endpoint(options);
        tracing::info!(endpoint = %endpoint, "Fetching orders from BrickLink");

        let response = self.get(&endpoint).await.inspect_err(|e| {
            tracing::error!(endpoint = %endpoint, error = %e, "Failed to get orders from BrickLink API");
        })?;

        let orders: Vec<Value> = response.data("orders")?;
        tracing::info!(count = orders.len(), "Fetched orders from BrickLink");
        Ok(orders)
    }

    /// Incoming orders modified since `cursor`, undecoded so the caller can
    /// skip a malformed order and keep the rest
    pub async fn get_orders_since(&self, cursor: DateTime<Utc>) -> Result<Vec<Value>, BricklinkError> {
        self.get_order_values(Some(&OrdersOptions::updated_since(cursor)))
            .await
    }
}
