//! SeaORM Entity for orders table
//!
//! Flattened BrickLink store orders. `(bricklink_order_id, user_id)` is unique.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i64,
    pub bricklink_order_id: i64,
    pub date_ordered: DateTimeWithTimeZone,
    pub date_status_changed: Option<DateTimeWithTimeZone>,
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
    // Payment
    pub payment_method: Option<String>,
    pub payment_currency_code: Option<String>,
    pub payment_status: Option<String>,
    pub date_paid: Option<DateTimeWithTimeZone>,
    // Shipping
    pub shipping_method_id: Option<i32>,
    pub shipping_method: Option<String>,
    pub tracking_link: Option<String>,
    pub shipping_address_name: Option<String>,
    pub shipping_address_full: Option<String>,
    pub shipping_country_code: Option<String>,
    // Cost in the seller's currency
    pub currency_code: Option<String>,
    pub subtotal: Option<Decimal>,
    /// Grand total
    pub total_price: Option<Decimal>,
    pub etc1: Option<Decimal>,
    pub etc2: Option<Decimal>,
    pub insurance_cost: Option<Decimal>,
    pub shipping_cost: Option<Decimal>,
    pub credit_amount: Option<Decimal>,
    pub coupon_amount: Option<Decimal>,
    pub vat_rate: Option<Decimal>,
    pub vat_amount: Option<Decimal>,
    // Cost in the buyer's display currency
    pub display_currency_code: Option<String>,
    pub display_subtotal: Option<Decimal>,
    pub display_grand_total: Option<Decimal>,
    pub display_etc1: Option<Decimal>,
    pub display_etc2: Option<Decimal>,
    pub display_insurance: Option<Decimal>,
    pub display_shipping: Option<Decimal>,
    pub display_credit: Option<Decimal>,
    pub display_coupon: Option<Decimal>,
    pub display_vat_rate: Option<Decimal>,
    pub display_vat_amount: Option<Decimal>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
