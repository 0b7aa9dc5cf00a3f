use chrono::Utc;
use sea_orm::{ActiveValue, Condition, PaginatorTrait, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    Asset, AssetDetails, EngineError, NewAssetCmd, OPENING_BALANCE_CATEGORY, ResultEngine,
    Transaction, TransactionKind, assets, transactions,
    util::{normalize_name_key, normalize_required_name},
};

use super::{Engine, with_tx};

impl Engine {
    /// Return an asset of the user.
    pub async fn asset(&self, user_id: &str, asset_id: Uuid) -> ResultEngine<Asset> {
        with_tx!(self, |db_tx| {
            self.require_owned_asset(&db_tx, user_id, asset_id).await
        })
    }

    /// Lists the user's assets, ordered by kind then name.
    pub async fn list_assets(
        &self,
        user_id: &str,
        include_inactive: bool,
    ) -> ResultEngine<Vec<Asset>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let mut query = assets::Entity::find()
                .filter(assets::Column::UserId.eq(user_id.to_string()))
                .order_by_asc(assets::Column::Kind)
                .order_by_asc(assets::Column::NameNorm)
                .order_by_asc(assets::Column::CreatedAt);
            if !include_inactive {
                query = query.filter(assets::Column::IsActive.eq(true));
            }
            query
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Asset::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Add a new asset.
    ///
    /// The asset starts at zero. A non-zero `opening_balance` is recorded as an
    /// `OPENING_BALANCE` transaction dated `opened_at`:
    /// - if `opening_balance > 0`: a REFILL into the asset
    /// - if `opening_balance < 0`: a WASTE out of it
    ///
    /// so the balance stays equal to the replay of the ledger.
    pub async fn new_asset(&self, cmd: NewAssetCmd) -> ResultEngine<Asset> {
        let name = normalize_required_name(&cmd.name, "asset")?;
        let currency = cmd.currency.unwrap_or(self.config.default_currency);
        let details = cmd.details.unwrap_or_else(|| AssetDetails::empty(cmd.kind));

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, &cmd.user_id).await?;

            let asset = Asset::new(
                cmd.user_id.clone(),
                cmd.kind,
                name,
                currency,
                details,
                Utc::now(),
            )?;
            assets::ActiveModel::try_from(&asset)?.insert(&db_tx).await?;

            if !cmd.opening_balance.is_zero() {
                let (kind, from, to, amount) = if cmd.opening_balance.is_positive() {
                    (TransactionKind::Refill, None, Some(&asset), cmd.opening_balance)
                } else {
                    let amount = cmd.opening_balance.checked_neg().ok_or_else(|| {
                        EngineError::InvalidAmount("opening balance too large".to_string())
                    })?;
                    (TransactionKind::Waste, Some(&asset), None, amount)
                };
                let tx = Transaction::new(
                    cmd.user_id.clone(),
                    kind,
                    amount,
                    currency,
                    from.map(|asset| asset.id),
                    to.map(|asset| asset.id),
                    Some(OPENING_BALANCE_CATEGORY.to_string()),
                    Some(format!("opening balance for {}", asset.reference())),
                    cmd.opened_at,
                )?;
                self.record_transaction(&db_tx, &tx, from, to).await?;
            }

            let asset = self.load_asset(&db_tx, asset.id).await?;
            tracing::debug!(
                user_id = %cmd.user_id,
                asset_id = %asset.id,
                reference = %asset.reference(),
                "asset created"
            );
            Ok(asset)
        })
    }

    /// Retire or reactivate an asset. Retired assets keep their history and
    /// balance but are skipped by reference resolution.
    pub async fn set_asset_active(
        &self,
        user_id: &str,
        asset_id: Uuid,
        is_active: bool,
    ) -> ResultEngine<Asset> {
        with_tx!(self, |db_tx| {
            let mut asset = self.require_owned_asset(&db_tx, user_id, asset_id).await?;
            asset.is_active = is_active;
            asset.updated_at = Utc::now();
            assets::ActiveModel {
                id: ActiveValue::Set(asset.id.to_string()),
                is_active: ActiveValue::Set(asset.is_active),
                updated_at: ActiveValue::Set(asset.updated_at),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            Ok(asset)
        })
    }

    pub async fn rename_asset(
        &self,
        user_id: &str,
        asset_id: Uuid,
        name: &str,
    ) -> ResultEngine<Asset> {
        let name = normalize_required_name(name, "asset")?;
        with_tx!(self, |db_tx| {
            let mut asset = self.require_owned_asset(&db_tx, user_id, asset_id).await?;
            asset.name = name;
            asset.updated_at = Utc::now();
            assets::ActiveModel {
                id: ActiveValue::Set(asset.id.to_string()),
                name: ActiveValue::Set(asset.name.clone()),
                name_norm: ActiveValue::Set(normalize_name_key(&asset.name)),
                updated_at: ActiveValue::Set(asset.updated_at),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            Ok(asset)
        })
    }

    /// Replace the kind-specific attributes. The variant must match the kind.
    pub async fn update_asset_details(
        &self,
        user_id: &str,
        asset_id: Uuid,
        details: AssetDetails,
    ) -> ResultEngine<Asset> {
        with_tx!(self, |db_tx| {
            let mut asset = self.require_owned_asset(&db_tx, user_id, asset_id).await?;
            details.validate_for(asset.kind)?;
            asset.details = details;
            asset.updated_at = Utc::now();
            assets::ActiveModel {
                id: ActiveValue::Set(asset.id.to_string()),
                details: ActiveValue::Set(asset.details.to_json()?),
                updated_at: ActiveValue::Set(asset.updated_at),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            Ok(asset)
        })
    }

    /// Hard-delete an asset no transaction references. Use
    /// [`Engine::set_asset_active`] to retire one that has history.
    pub async fn delete_asset(&self, user_id: &str, asset_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let asset = self.require_owned_asset(&db_tx, user_id, asset_id).await?;
            let references = transactions::Entity::find()
                .filter(
                    Condition::any()
                        .add(transactions::Column::FromAssetId.eq(asset.id.to_string()))
                        .add(transactions::Column::ToAssetId.eq(asset.id.to_string())),
                )
                .count(&db_tx)
                .await?;
            if references > 0 {
                return Err(EngineError::AssetInUse(format!(
                    "{} is referenced by {references} transaction(s)",
                    asset.reference()
                )));
            }
            assets::Entity::delete_by_id(asset.id.to_string())
                .exec(&db_tx)
                .await?;
            tracing::debug!(user_id, %asset_id, "asset deleted");
            Ok(())
        })
    }
}
