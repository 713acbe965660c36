pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_user_oauth_credentials;
mod m20250601_000002_create_orders;
mod m20250601_000003_create_order_syncs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_user_oauth_credentials::Migration),
            Box::new(m20250601_000002_create_orders::Migration),
            Box::new(m20250601_000003_create_order_syncs::Migration),
        ]
    }
}
