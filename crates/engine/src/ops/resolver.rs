use chrono::Utc;
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, prelude::*};

use crate::{
    Asset, AssetDetails, AssetRef, AssetSelector, Currency, EngineError, ResultEngine, assets,
    util::normalize_name_key,
};

use super::{Engine, with_tx};

/// What to do when a reference matches no active asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ResolveMode {
    /// Fail with `UnknownAsset`.
    Strict,
    /// Create the asset in the given currency.
    CreateMissing(Currency),
}

impl Engine {
    /// Resolve a `TYPE: Name` token among the user's active assets.
    pub async fn resolve_asset(&self, user_id: &str, token: &str) -> ResultEngine<Asset> {
        let reference: AssetRef = token.parse()?;
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            self.resolve_asset_ref(&db_tx, user_id, &reference, ResolveMode::Strict)
                .await
        })
    }

    pub(super) async fn resolve_asset_ref<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        reference: &AssetRef,
        mode: ResolveMode,
    ) -> ResultEngine<Asset> {
        let matches: Vec<assets::Model> = assets::Entity::find()
            .filter(assets::Column::UserId.eq(user_id.to_string()))
            .filter(assets::Column::Kind.eq(reference.kind.code()))
            .filter(assets::Column::NameNorm.eq(normalize_name_key(&reference.name)))
            .filter(assets::Column::IsActive.eq(true))
            .order_by_asc(assets::Column::CreatedAt)
            .all(db)
            .await?;

        let mut matches = matches.into_iter();
        match (matches.next(), matches.next(), mode) {
            (Some(model), None, _) => Asset::try_from(model),
            (Some(_), Some(_), _) => Err(EngineError::AmbiguousAsset(format!(
                "{reference} matches {} active assets",
                2 + matches.len()
            ))),
            (None, _, ResolveMode::Strict) => Err(EngineError::UnknownAsset(reference.to_string())),
            (None, _, ResolveMode::CreateMissing(currency)) => {
                let asset = Asset::new(
                    user_id.to_string(),
                    reference.kind,
                    reference.name.clone(),
                    currency,
                    AssetDetails::empty(reference.kind),
                    Utc::now(),
                )?;
                assets::ActiveModel::try_from(&asset)?.insert(db).await?;
                tracing::debug!(
                    user_id,
                    asset_id = %asset.id,
                    %reference,
                    "asset created on resolve"
                );
                Ok(asset)
            }
        }
    }

    pub(super) async fn resolve_selector<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        selector: &AssetSelector,
        mode: ResolveMode,
    ) -> ResultEngine<Asset> {
        match selector {
            AssetSelector::Id(asset_id) => {
                self.load_asset(db, *asset_id).await.map_err(|err| match err {
                    EngineError::KeyNotFound(_) => {
                        EngineError::UnknownAsset(format!("asset {asset_id}"))
                    }
                    other => other,
                })
            }
            AssetSelector::Ref(reference) => {
                self.resolve_asset_ref(db, user_id, reference, mode).await
            }
        }
    }

    pub(super) async fn resolve_optional_selector<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        selector: Option<&AssetSelector>,
        mode: ResolveMode,
    ) -> ResultEngine<Option<Asset>> {
        match selector {
            Some(selector) => Ok(Some(
                self.resolve_selector(db, user_id, selector, mode).await?,
            )),
            None => Ok(None),
        }
    }
}
