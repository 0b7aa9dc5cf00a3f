use chrono::Utc;
use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{Asset, EngineError, ResultEngine, Transaction, assets, transactions, users};

use super::{Engine, with_tx};

impl Engine {
    /// Register a user. Adding an existing username is a no-op.
    pub async fn new_user(&self, username: &str) -> ResultEngine<()> {
        let username = username.trim();
        if username.is_empty() {
            return Err(EngineError::InvalidName(
                "username must not be empty".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            if users::Entity::find_by_id(username.to_string())
                .one(&db_tx)
                .await?
                .is_none()
            {
                users::ActiveModel {
                    username: ActiveValue::Set(username.to_string()),
                    created_at: ActiveValue::Set(Utc::now()),
                }
                .insert(&db_tx)
                .await?;
                tracing::info!(username, "user created");
            }
            Ok(())
        })
    }

    pub(crate) async fn require_user<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
    ) -> ResultEngine<()> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {user_id}")))?;
        Ok(())
    }

    /// Any asset by id, whoever owns it. Ownership is the caller's concern.
    pub(super) async fn load_asset<C: ConnectionTrait>(
        &self,
        db: &C,
        asset_id: Uuid,
    ) -> ResultEngine<Asset> {
        let model = assets::Entity::find_by_id(asset_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("asset {asset_id}")))?;
        Asset::try_from(model)
    }

    pub(super) async fn load_optional_asset<C: ConnectionTrait>(
        &self,
        db: &C,
        asset_id: Option<Uuid>,
    ) -> ResultEngine<Option<Asset>> {
        match asset_id {
            Some(id) => Ok(Some(self.load_asset(db, id).await?)),
            None => Ok(None),
        }
    }

    /// An asset owned by `user_id`; foreign and missing ids look the same.
    pub(super) async fn require_owned_asset<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        asset_id: Uuid,
    ) -> ResultEngine<Asset> {
        let model = assets::Entity::find_by_id(asset_id.to_string())
            .filter(assets::Column::UserId.eq(user_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("asset {asset_id}")))?;
        Asset::try_from(model)
    }

    /// A transaction owned by `user_id`; foreign and missing ids look the same.
    pub(super) async fn require_transaction<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .filter(transactions::Column::UserId.eq(user_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("transaction {transaction_id}")))?;
        Transaction::try_from(model)
    }
}
