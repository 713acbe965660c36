use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Money columns share one precision
fn money(col: Orders) -> ColumnDef {
    ColumnDef::new(col).decimal_len(14, 4).null().to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Orders::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Orders::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Orders::BricklinkOrderId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Orders::DateOrdered)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::DateStatusChanged)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    // Parties
                    .col(ColumnDef::new(Orders::SellerName).string().null())
                    .col(ColumnDef::new(Orders::StoreName).string().null())
                    .col(ColumnDef::new(Orders::BuyerName).string().not_null())
                    .col(ColumnDef::new(Orders::BuyerEmail).string().null())
                    .col(ColumnDef::new(Orders::BuyerOrderCount).integer().null())
                    // Order details
                    .col(ColumnDef::new(Orders::Status).string_len(50).not_null())
                    .col(ColumnDef::new(Orders::IsInvoiced).boolean().null())
                    .col(ColumnDef::new(Orders::RequireInsurance).boolean().null())
                    .col(ColumnDef::new(Orders::Remarks).text().null())
                    .col(ColumnDef::new(Orders::TotalCount).integer().null())
                    .col(ColumnDef::new(Orders::UniqueCount).integer().null())
                    .col(money(Orders::TotalWeight))
                    .col(ColumnDef::new(Orders::IsFiled).boolean().null())
                    .col(ColumnDef::new(Orders::DriveThruSent).boolean().null())
                    // Payment
                    .col(ColumnDef::new(Orders::PaymentMethod).string().null())
                    .col(ColumnDef::new(Orders::PaymentCurrencyCode).string_len(3).null())
                    .col(ColumnDef::new(Orders::PaymentStatus).string().null())
                    .col(ColumnDef::new(Orders::DatePaid).timestamp_with_time_zone().null())
                    // Shipping
                    .col(ColumnDef::new(Orders::ShippingMethodId).integer().null())
                    .col(ColumnDef::new(Orders::ShippingMethod).string().null())
                    .col(ColumnDef::new(Orders::TrackingLink).text().null())
                    .col(ColumnDef::new(Orders::ShippingAddressName).string().null())
                    .col(ColumnDef::new(Orders::ShippingAddressFull).text().null())
                    .col(ColumnDef::new(Orders::ShippingCountryCode).string_len(2).null())
                    // Cost
                    .col(ColumnDef::new(Orders::CurrencyCode).string_len(3).null())
                    .col(money(Orders::Subtotal))
                    .col(money(Orders::TotalPrice))
                    .col(money(Orders::Etc1))
                    .col(money(Orders::Etc2))
                    .col(money(Orders::InsuranceCost))
                    .col(money(Orders::ShippingCost))
                    .col(money(Orders::CreditAmount))
                    .col(money(Orders::CouponAmount))
                    .col(money(Orders::VatRate))
                    .col(money(Orders::VatAmount))
                    // Display cost (buyer's currency)
                    .col(ColumnDef::new(Orders::DisplayCurrencyCode).string_len(3).null())
                    .col(money(Orders::DisplaySubtotal))
                    .col(money(Orders::DisplayGrandTotal))
                    .col(money(Orders::DisplayEtc1))
                    .col(money(Orders::DisplayEtc2))
                    .col(money(Orders::DisplayInsurance))
                    .col(money(Orders::DisplayShipping))
                    .col(money(Orders::DisplayCredit))
                    .col(money(Orders::DisplayCoupon))
                    .col(money(Orders::DisplayVatRate))
                    .col(money(Orders::DisplayVatAmount))
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Orders::UpdatedAt).timestamp_with_time_zone().null())
                    .to_owned(),
            )
            .await?;

        // One row per provider order per user
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_bricklink_order_id_user_id")
                    .table(Orders::Table)
                    .col(Orders::BricklinkOrderId)
                    .col(Orders::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_user_id_date_ordered")
                    .table(Orders::Table)
                    .col(Orders::UserId)
                    .col(Orders::DateOrdered)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(Iden, Clone, Copy)]
enum Orders {
    Table,
    Id,
    UserId,
    BricklinkOrderId,
    DateOrdered,
    DateStatusChanged,
    SellerName,
    StoreName,
    BuyerName,
    BuyerEmail,
    BuyerOrderCount,
    Status,
    IsInvoiced,
    RequireInsurance,
    Remarks,
    TotalCount,
    UniqueCount,
    TotalWeight,
    IsFiled,
    DriveThruSent,
    PaymentMethod,
    PaymentCurrencyCode,
    PaymentStatus,
    DatePaid,
    ShippingMethodId,
    ShippingMethod,
    TrackingLink,
    ShippingAddressName,
    ShippingAddressFull,
    ShippingCountryCode,
    CurrencyCode,
    Subtotal,
    TotalPrice,
    Etc1,
    Etc2,
    InsuranceCost,
    ShippingCost,
    CreditAmount,
    CouponAmount,
    VatRate,
    VatAmount,
    DisplayCurrencyCode,
    DisplaySubtotal,
    DisplayGrandTotal,
    DisplayEtc1,
    DisplayEtc2,
    DisplayInsurance,
    DisplayShipping,
    DisplayCredit,
    DisplayCoupon,
    DisplayVatRate,
    DisplayVatAmount,
    CreatedAt,
    UpdatedAt,
}
