use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::entities::{prelude::*, user_oauth_credentials};
use crate::models::credentials::CredentialSet;

/// Read-only access to stored provider credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Active credential set for the user, `None` when nothing is stored
    async fn lookup(&self, user_id: i64, provider: &str) -> Result<Option<CredentialSet>, DbErr>;

    /// Users holding active credentials for the provider
    async fn active_user_ids(&self, provider: &str) -> Result<Vec<i64>, DbErr>;
}

pub struct DbCredentialStore {
    db: Arc<DatabaseConnection>,
}

impl DbCredentialStore {
    pub fn new(db: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { db: db.into() }
    }
}

#[async_trait]
impl CredentialStore for DbCredentialStore {
    async fn lookup(&self, user_id: i64, provider: &str) -> Result<Option<CredentialSet>, DbErr> {
        let row = UserOauthCredentials::find()
            .filter(user_oauth_credentials::Column::UserId.eq(user_id))
            .filter(user_oauth_credentials::Column::Provider.eq(provider))
            .filter(user_oauth_credentials::Column::IsActive.eq(true))
            .order_by_desc(user_oauth_credentials::Column::Id)
            .one(self.db.as_ref())
            .await?;

        Ok(row.map(|m| CredentialSet::new(m.consumer_key, m.consumer_secret, m.token, m.token_secret)))
    }

    async fn active_user_ids(&self, provider: &str) -> Result<Vec<i64>, DbErr> {
        let rows = UserOauthCredentials::find()
            .filter(user_oauth_credentials::Column::Provider.eq(provider))
            .filter(user_oauth_credentials::Column::IsActive.eq(true))
            .all(self.db.as_ref())
            .await?;

        let ids: BTreeSet<i64> = rows.into_iter().map(|m| m.user_id).collect();
        Ok(ids.into_iter().collect())
    }
}
