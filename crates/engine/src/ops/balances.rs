use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    Condition, ConnectionTrait, QueryFilter, QueryOrder, prelude::*, sea_query::Expr,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Asset, AssetRef, BalanceDirection, BalancePlan, EngineError, Leg, MoneyCents, ResultEngine,
    Transaction, assets, transaction_legs, transactions,
};

use super::{Engine, retry_on_conflict, with_tx};

/// An asset whose stored balance disagrees with the replay of its ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BalanceDrift {
    pub asset_id: Uuid,
    pub reference: AssetRef,
    pub stored: MoneyCents,
    pub replayed: MoneyCents,
}

impl Engine {
    /// Writes every changed balance of `plan`, each conditional on the version
    /// it was read at.
    pub(super) async fn persist_plan<C: ConnectionTrait>(
        &self,
        db: &C,
        plan: &BalancePlan,
    ) -> ResultEngine<()> {
        let now = Utc::now();
        for (asset_id, balance) in plan.changed() {
            let result = assets::Entity::update_many()
                .col_expr(assets::Column::BalanceMinor, Expr::value(balance.after.cents()))
                .col_expr(assets::Column::Version, Expr::value(balance.version + 1))
                .col_expr(assets::Column::UpdatedAt, Expr::value(now))
                .filter(assets::Column::Id.eq(asset_id.to_string()))
                .filter(assets::Column::Version.eq(balance.version))
                .exec(db)
                .await?;
            if result.rows_affected != 1 {
                return Err(EngineError::Conflict(format!(
                    "asset {asset_id} changed since version {}",
                    balance.version
                )));
            }
        }
        Ok(())
    }

    /// Replays every transaction of `user_id` from zero balances.
    async fn replay<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
    ) -> ResultEngine<(Vec<Asset>, BTreeMap<Uuid, MoneyCents>)> {
        let asset_models: Vec<assets::Model> = assets::Entity::find()
            .filter(assets::Column::UserId.eq(user_id.to_string()))
            .order_by_asc(assets::Column::CreatedAt)
            .all(db)
            .await?;
        let assets = asset_models
            .into_iter()
            .map(Asset::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        let mut replayed: BTreeMap<Uuid, MoneyCents> =
            assets.iter().map(|asset| (asset.id, MoneyCents::ZERO)).collect();

        let tx_models: Vec<transactions::Model> = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id.to_string()))
            .order_by_asc(transactions::Column::OccurredAt)
            .order_by_asc(transactions::Column::CreatedAt)
            .order_by_asc(transactions::Column::Id)
            .all(db)
            .await?;

        for model in tx_models {
            let tx = Transaction::try_from(model)?;
            for leg in transaction_legs(&tx, BalanceDirection::Apply)? {
                let balance = replayed.get_mut(&leg.asset_id).ok_or_else(|| {
                    EngineError::OwnershipViolation(format!(
                        "transaction {} touches foreign asset {}",
                        tx.id, leg.asset_id
                    ))
                })?;
                *balance = balance.checked_add(leg.delta).ok_or_else(|| {
                    EngineError::InvalidAmount(format!(
                        "balance overflow on asset {}",
                        leg.asset_id
                    ))
                })?;
            }
        }

        Ok((assets, replayed))
    }

    fn drifts(assets: &[Asset], replayed: &BTreeMap<Uuid, MoneyCents>) -> Vec<BalanceDrift> {
        assets
            .iter()
            .filter_map(|asset| {
                let expected = replayed.get(&asset.id).copied().unwrap_or_default();
                (expected != asset.balance).then(|| BalanceDrift {
                    asset_id: asset.id,
                    reference: asset.reference(),
                    stored: asset.balance,
                    replayed: expected,
                })
            })
            .collect()
    }

    /// Assets whose stored balance differs from the ledger replay. Read-only.
    pub async fn balance_drift(&self, user_id: &str) -> ResultEngine<Vec<BalanceDrift>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let (assets, replayed) = self.replay(&db_tx, user_id).await?;
            Ok(Self::drifts(&assets, &replayed))
        })
    }

    /// Balance of one asset counting only the transactions that occurred at or
    /// before `at`, replayed from zero.
    pub async fn balance_at(
        &self,
        user_id: &str,
        asset_id: Uuid,
        at: DateTime<Utc>,
    ) -> ResultEngine<MoneyCents> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let asset = self.require_owned_asset(&db_tx, user_id, asset_id).await?;
            let asset_key = asset.id.to_string();

            let models: Vec<transactions::Model> = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id))
                .filter(transactions::Column::OccurredAt.lte(at))
                .filter(
                    Condition::any()
                        .add(transactions::Column::FromAssetId.eq(asset_key.clone()))
                        .add(transactions::Column::ToAssetId.eq(asset_key)),
                )
                .all(&db_tx)
                .await?;

            let mut balance = MoneyCents::ZERO;
            for model in models {
                let tx = Transaction::try_from(model)?;
                for leg in transaction_legs(&tx, BalanceDirection::Apply)? {
                    if leg.asset_id == asset.id {
                        balance = balance.checked_add(leg.delta).ok_or_else(|| {
                            EngineError::InvalidAmount(format!(
                                "balance overflow on asset {}",
                                asset.id
                            ))
                        })?;
                    }
                }
            }
            Ok(balance)
        })
    }

    /// Rebuilds the balances of every asset of `user_id` (archived included)
    /// from the ledger and returns the drifts that were corrected.
    pub async fn recompute_balances(&self, user_id: &str) -> ResultEngine<Vec<BalanceDrift>> {
        retry_on_conflict!(self, "recompute_balances", self.try_recompute_balances(user_id))
    }

    async fn try_recompute_balances(&self, user_id: &str) -> ResultEngine<Vec<BalanceDrift>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let (assets, replayed) = self.replay(&db_tx, user_id).await?;
            let drifts = Self::drifts(&assets, &replayed);

            let mut plan = BalancePlan::new();
            for asset in &assets {
                plan.seed(asset);
            }
            let corrections = drifts
                .iter()
                .map(|drift| {
                    let delta = drift.replayed.checked_sub(drift.stored).ok_or_else(|| {
                        EngineError::InvalidAmount(format!(
                            "balance overflow on asset {}",
                            drift.asset_id
                        ))
                    })?;
                    Ok(Leg {
                        asset_id: drift.asset_id,
                        delta,
                    })
                })
                .collect::<ResultEngine<Vec<_>>>()?;
            plan.apply(&corrections)?;
            self.persist_plan(&db_tx, &plan).await?;

            if !drifts.is_empty() {
                tracing::info!(user_id, corrected = drifts.len(), "balances recomputed");
            }
            Ok(drifts)
        })
    }
}
