use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Audit log of order sync attempts, one row per attempt
        manager
            .create_table(
                Table::create()
                    .table(OrderSyncs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderSyncs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderSyncs::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(OrderSyncs::LastSyncTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderSyncs::SyncStatus)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderSyncs::OrdersCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(OrderSyncs::ErrorMessage).text().null())
                    .col(
                        ColumnDef::new(OrderSyncs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(OrderSyncs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Cursor lookup: latest completed run per user
        manager
            .create_index(
                Index::create()
                    .name("idx_order_syncs_user_status_time")
                    .table(OrderSyncs::Table)
                    .col(OrderSyncs::UserId)
                    .col(OrderSyncs::SyncStatus)
                    .col(OrderSyncs::LastSyncTime)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderSyncs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum OrderSyncs {
    Table,
    Id,
    UserId,
    LastSyncTime,
    SyncStatus,
    OrdersCount,
    ErrorMessage,
    CreatedAt,
    UpdatedAt,
}
