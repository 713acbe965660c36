use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Per-user OAuth1 credentials, one active row per (user, provider)
        manager
            .create_table(
                Table::create()
                    .table(UserOauthCredentials::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserOauthCredentials::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserOauthCredentials::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserOauthCredentials::Provider)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserOauthCredentials::ConsumerKey).text().not_null())
                    .col(ColumnDef::new(UserOauthCredentials::ConsumerSecret).text().not_null())
                    .col(ColumnDef::new(UserOauthCredentials::Token).text().not_null())
                    .col(ColumnDef::new(UserOauthCredentials::TokenSecret).text().not_null())
                    .col(
                        ColumnDef::new(UserOauthCredentials::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(UserOauthCredentials::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(UserOauthCredentials::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_oauth_credentials_user_provider")
                    .table(UserOauthCredentials::Table)
                    .col(UserOauthCredentials::UserId)
                    .col(UserOauthCredentials::Provider)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserOauthCredentials::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum UserOauthCredentials {
    Table,
    Id,
    UserId,
    Provider,
    ConsumerKey,
    ConsumerSecret,
    Token,
    TokenSecret,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
