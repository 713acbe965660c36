//! SeaORM Entity for order_syncs table
//!
//! One row per order sync attempt. `last_sync_time` is the moment the attempt
//! started and becomes the cursor for the next run once the row is `completed`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "order_syncs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i64,
    pub last_sync_time: DateTimeWithTimeZone,
    /// in_progress | completed | failed | completed_with_errors
    pub sync_status: String,
    pub orders_count: i32,
    pub error_message: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
