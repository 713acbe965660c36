use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use std::sync::Arc;

use crate::entities::{order_syncs, orders, prelude::*};
use crate::models::order::{NewOrder, OrderSyncRun, SyncStatus, UnknownSyncStatus, UpsertOutcome};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Db(#[from] DbErr),
    #[error("corrupt sync run row: {0}")]
    Corrupt(#[from] UnknownSyncStatus),
}

/// Persistence used by the order sync engine
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Local row id of the order, if it was synced before
    async fn find_by_provider_order_id(
        &self,
        user_id: i64,
        bricklink_order_id: i64,
    ) -> Result<Option<i32>, RepositoryError>;

    /// Insert, or overwrite every mutable field of the existing row
    async fn upsert(&self, user_id: i64, order: &NewOrder) -> Result<UpsertOutcome, RepositoryError>;

    /// Start time of the user's most recent `completed` run
    async fn get_last_completed_sync_time(
        &self,
        user_id: i64,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError>;

    /// New `in_progress` run starting at `started_at`
    async fn create_sync_run(
        &self,
        user_id: i64,
        started_at: DateTime<Utc>,
    ) -> Result<OrderSyncRun, RepositoryError>;

    /// Persist status, count and error message of `run`
    async fn update_sync_run(&self, run: &OrderSyncRun) -> Result<OrderSyncRun, RepositoryError>;
}

pub struct SeaOrmOrderRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmOrderRepository {
    pub fn new(db: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { db: db.into() }
    }

    async fn find_order(&self, user_id: i64, bricklink_order_id: i64) -> Result<Option<orders::Model>, DbErr> {
        Orders::find()
            .filter(orders::Column::BricklinkOrderId.eq(bricklink_order_id))
            .filter(orders::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
    }
}

/// Copies every provider-sourced column onto the active model
fn apply_order_fields(model: &mut orders::ActiveModel, order: &NewOrder) {
    model.date_ordered = Set(order.date_ordered.into());
    model.date_status_changed = Set(order.date_status_changed.map(Into::into));
    model.seller_name = Set(order.seller_name.clone());
    model.store_name = Set(order.store_name.clone());
    model.buyer_name = Set(order.buyer_name.clone());
    model.buyer_email = Set(order.buyer_email.clone());
    model.buyer_order_count = Set(order.buyer_order_count);
    model.status = Set(order.status.clone());
    model.is_invoiced = Set(order.is_invoiced);
    model.require_insurance = Set(order.require_insurance);
    model.remarks = Set(order.remarks.clone());
    model.total_count = Set(order.total_count);
    model.unique_count = Set(order.unique_count);
    model.total_weight = Set(order.total_weight);
    model.is_filed = Set(order.is_filed);
    model.drive_thru_sent = Set(order.drive_thru_sent);

    model.payment_method = Set(order.payment.method.clone());
    model.payment_currency_code = Set(order.payment.currency_code.clone());
    model.payment_status = Set(order.payment.status.clone());
    model.date_paid = Set(order.payment.date_paid.map(Into::into));

    model.shipping_method_id = Set(order.shipping.method_id);
    model.shipping_method = Set(order.shipping.method.clone());
    model.tracking_link = Set(order.shipping.tracking_link.clone());
    model.shipping_address_name = Set(order.shipping.address_name.clone());
    model.shipping_address_full = Set(order.shipping.address_full.clone());
    model.shipping_country_code = Set(order.shipping.country_code.clone());

    let cost = &order.cost;
    model.currency_code = Set(cost.currency_code.clone());
    model.subtotal = Set(cost.subtotal);
    model.total_price = Set(cost.grand_total);
    model.etc1 = Set(cost.etc1);
    model.etc2 = Set(cost.etc2);
    model.insurance_cost = Set(cost.insurance);
    model.shipping_cost = Set(cost.shipping);
    model.credit_amount = Set(cost.credit);
    model.coupon_amount = Set(cost.coupon);
    model.vat_rate = Set(cost.vat_rate);
    model.vat_amount = Set(cost.vat_amount);

    let display = &order.display_cost;
    model.display_currency_code = Set(display.currency_code.clone());
    model.display_subtotal = Set(display.subtotal);
    model.display_grand_total = Set(display.grand_total);
    model.display_etc1 = Set(display.etc1);
    model.display_etc2 = Set(display.etc2);
    model.display_insurance = Set(display.insurance);
    model.display_shipping = Set(display.shipping);
    model.display_credit = Set(display.credit);
    model.display_coupon = Set(display.coupon);
    model.display_vat_rate = Set(display.vat_rate);
    model.display_vat_amount = Set(display.vat_amount);
}

#[async_trait]
impl OrderRepository for SeaOrmOrderRepository {
    async fn find_by_provider_order_id(
        &self,
        user_id: i64,
        bricklink_order_id: i64,
    ) -> Result<Option<i32>, RepositoryError> {
        let order = self.find_order(user_id, bricklink_order_id).await?;
        Ok(order.map(|m| m.id))
    }

    async fn upsert(&self, user_id: i64, order: &NewOrder) -> Result<UpsertOutcome, RepositoryError> {
        let now = Utc::now();

        match self.find_order(user_id, order.bricklink_order_id).await? {
            Some(existing) => {
                let mut active_model: orders::ActiveModel = existing.into();
                apply_order_fields(&mut active_model, order);
                active_model.updated_at = Set(Some(now.into()));
                active_model.update(self.db.as_ref()).await?;

                tracing::debug!(user_id, order_id = order.bricklink_order_id, "Updated order");
                Ok(UpsertOutcome::Updated)
            }
            None => {
                let mut active_model = orders::ActiveModel {
                    user_id: Set(user_id),
                    bricklink_order_id: Set(order.bricklink_order_id),
                    created_at: Set(now.into()),
                    updated_at: Set(Some(now.into())),
                    ..Default::default()
                };
                apply_order_fields(&mut active_model, order);
                active_model.insert(self.db.as_ref()).await?;

                tracing::debug!(user_id, order_id = order.bricklink_order_id, "Created order");
                Ok(UpsertOutcome::Created)
            }
        }
    }

    async fn get_last_completed_sync_time(
        &self,
        user_id: i64,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        let last = OrderSyncs::find()
            .filter(order_syncs::Column::UserId.eq(user_id))
            .filter(order_syncs::Column::SyncStatus.eq(SyncStatus::Completed.as_str()))
            .order_by_desc(order_syncs::Column::LastSyncTime)
            .one(self.db.as_ref())
            .await?;

        Ok(last.map(|run| run.last_sync_time.with_timezone(&Utc)))
    }

    async fn create_sync_run(
        &self,
        user_id: i64,
        started_at: DateTime<Utc>,
    ) -> Result<OrderSyncRun, RepositoryError> {
        let run = order_syncs::ActiveModel {
            user_id: Set(user_id),
            last_sync_time: Set(started_at.into()),
            sync_status: Set(SyncStatus::InProgress.as_str().to_string()),
            orders_count: Set(0),
            error_message: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
            ..Default::default()
        };

        let model = run.insert(self.db.as_ref()).await?;
        Ok(OrderSyncRun::try_from(model)?)
    }

    async fn update_sync_run(&self, run: &OrderSyncRun) -> Result<OrderSyncRun, RepositoryError> {
        let active_model = order_syncs::ActiveModel {
            id: Set(run.id),
            sync_status: Set(run.status.as_str().to_string()),
            orders_count: Set(run.orders_count),
            error_message: Set(run.error_message.clone()),
            updated_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };

        let model = active_model.update(self.db.as_ref()).await?;
        Ok(OrderSyncRun::try_from(model)?)
    }
}
