//! `SeaORM` entity prelude

pub use super::order_syncs::Entity as OrderSyncs;
pub use super::orders::Entity as Orders;
pub use super::user_oauth_credentials::Entity as UserOauthCredentials;
