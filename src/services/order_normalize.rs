//! Provider order -> `NewOrder` flattening
//!
//! Absent sub-objects and absent or empty fields become `None`, never zero or
//! an empty string. Only an unreadable `date_ordered` rejects the order.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::warn;

use crate::models::order::{CostFields, NewOrder, PaymentFields, ShippingFields};
use crate::services::bricklink::orders::{BricklinkOrder, OrderCost};

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("order {order_id}: unparseable date_ordered {value:?}")]
    InvalidOrderDate { order_id: i64, value: String },
}

const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Full timestamps (RFC 3339, or naive and taken as UTC) and bare dates
/// (midnight UTC)
pub fn parse_order_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in NAIVE_TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
}

/// Money or weight string to `Decimal`. Malformed input is logged and
/// dropped rather than failing the order.
pub fn parse_decimal(order_id: i64, field: &'static str, raw: Option<&str>) -> Option<Decimal> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    match Decimal::from_str(raw).or_else(|_| Decimal::from_scientific(raw)) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(order_id, field, value = %raw, error = %e, "Ignoring malformed decimal");
            None
        }
    }
}

fn optional_date(order_id: i64, field: &'static str, raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    let parsed = parse_order_date(raw);
    if parsed.is_none() && !raw.trim().is_empty() {
        warn!(order_id, field, value = %raw, "Ignoring unparseable date");
    }
    parsed
}

fn cost_fields(order_id: i64, cost: Option<&OrderCost>) -> CostFields {
    let Some(cost) = cost else {
        return CostFields::default();
    };
    let money = |field: &'static str, raw: &Option<String>| parse_decimal(order_id, field, raw.as_deref());

    CostFields {
        currency_code: cost.currency_code.clone(),
        subtotal: money("subtotal", &cost.subtotal),
        grand_total: money("grand_total", &cost.grand_total),
        etc1: money("etc1", &cost.etc1),
        etc2: money("etc2", &cost.etc2),
        insurance: money("insurance", &cost.insurance),
        shipping: money("shipping", &cost.shipping),
        credit: money("credit", &cost.credit),
        coupon: money("coupon", &cost.coupon),
        vat_rate: money("vat_rate", &cost.vat_rate),
        vat_amount: money("vat_amount", &cost.vat_amount),
    }
}

pub fn normalize_order(raw: &BricklinkOrder) -> Result<NewOrder, NormalizeError> {
    let order_id = raw.order_id;
    let date_ordered =
        parse_order_date(&raw.date_ordered).ok_or_else(|| NormalizeError::InvalidOrderDate {
            order_id,
            value: raw.date_ordered.clone(),
        })?;

    let payment = raw
        .payment
        .as_ref()
        .map(|p| PaymentFields {
            method: p.method.clone(),
            currency_code: p.currency_code.clone(),
            status: p.status.clone(),
            date_paid: optional_date(order_id, "date_paid", p.date_paid.as_deref()),
        })
        .unwrap_or_default();

    let shipping = raw
        .shipping
        .as_ref()
        .map(|s| {
            let address = s.address.as_ref();
            ShippingFields {
                method_id: s.method_id,
                method: s.method.clone(),
                tracking_link: s.tracking_link.clone(),
                address_name: address
                    .and_then(|a| a.name.as_ref())
                    .and_then(|n| n.full.clone()),
                address_full: address.and_then(|a| a.full.clone()),
                country_code: address.and_then(|a| a.country_code.clone()),
            }
        })
        .unwrap_or_default();

    Ok(NewOrder {
        bricklink_order_id: order_id,
        date_ordered,
        date_status_changed: optional_date(
            order_id,
            "date_status_changed",
            raw.date_status_changed.as_deref(),
        ),
        seller_name: raw.seller_name.clone(),
        store_name: raw.store_name.clone(),
        buyer_name: raw.buyer_name.clone(),
        buyer_email: raw.buyer_email.clone(),
        buyer_order_count: raw.buyer_order_count,
        status: raw.status.clone(),
        is_invoiced: raw.is_invoiced,
        require_insurance: raw.require_insurance,
        remarks: raw.remarks.clone(),
        total_count: raw.total_count,
        unique_count: raw.unique_count,
        total_weight: parse_decimal(order_id, "total_weight", raw.total_weight.as_deref()),
        is_filed: raw.is_filed,
        drive_thru_sent: raw.drive_thru_sent,
        payment,
        shipping,
        cost: cost_fields(order_id, raw.cost.as_ref()),
        display_cost: cost_fields(order_id, raw.disp_cost.as_ref()),
    })
}
