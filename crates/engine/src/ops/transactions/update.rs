use sea_orm::ActiveModelTrait;

use crate::{
    Asset, AssetPatch, BalanceDirection, BalancePlan, ResultEngine, Transaction,
    UpdateTransactionCmd, transaction_legs, transactions, util::apply_optional_text_patch,
    validate_transaction,
};

use super::super::{Engine, ResolveMode, retry_on_conflict, with_tx};

impl Engine {
    /// Update an existing transaction.
    ///
    /// The old effect is reversed and the new one applied in the same DB
    /// transaction, so a failure at any step (resolution, validation,
    /// persistence) leaves the transaction and every balance as they were.
    ///
    /// Unknown ids and transactions of other users return `KeyNotFound`.
    pub async fn update_transaction(&self, cmd: UpdateTransactionCmd) -> ResultEngine<Transaction> {
        retry_on_conflict!(self, "update_transaction", self.try_update_transaction(&cmd))
    }

    async fn try_update_transaction(
        &self,
        cmd: &UpdateTransactionCmd,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let existing = self
                .require_transaction(&db_tx, &cmd.user_id, cmd.transaction_id)
                .await?;
            let old_from = self
                .load_optional_asset(&db_tx, existing.from_asset_id)
                .await?;
            let old_to = self.load_optional_asset(&db_tx, existing.to_asset_id).await?;

            let mut plan = BalancePlan::new();
            for asset in [&old_from, &old_to].into_iter().flatten() {
                plan.seed(asset);
            }
            plan.apply(&transaction_legs(&existing, BalanceDirection::Reverse)?)?;

            let new_from = self
                .patched_asset(&db_tx, &cmd.user_id, &cmd.from_asset, old_from)
                .await?;
            let new_to = self
                .patched_asset(&db_tx, &cmd.user_id, &cmd.to_asset, old_to)
                .await?;

            let kind = cmd.kind.unwrap_or(existing.kind);
            let amount = cmd.amount.unwrap_or(existing.amount);
            validate_transaction(&cmd.user_id, kind, amount, new_from.as_ref(), new_to.as_ref())?;

            let updated = Transaction {
                id: existing.id,
                user_id: existing.user_id.clone(),
                kind,
                amount,
                currency: cmd.currency.unwrap_or(existing.currency),
                from_asset_id: new_from.as_ref().map(|asset| asset.id),
                to_asset_id: new_to.as_ref().map(|asset| asset.id),
                category: apply_optional_text_patch(existing.category, cmd.category.as_deref()),
                description: apply_optional_text_patch(
                    existing.description,
                    cmd.description.as_deref(),
                ),
                occurred_at: cmd.occurred_at.unwrap_or(existing.occurred_at),
                created_at: existing.created_at,
            };

            for asset in [&new_from, &new_to].into_iter().flatten() {
                plan.seed(asset);
            }
            plan.apply(&transaction_legs(&updated, BalanceDirection::Apply)?)?;

            transactions::ActiveModel::from(&updated)
                .update(&db_tx)
                .await?;
            self.persist_plan(&db_tx, &plan).await?;

            tracing::debug!(
                user_id = %updated.user_id,
                transaction_id = %updated.id,
                "transaction updated"
            );
            Ok(updated)
        })
    }

    async fn patched_asset<C: sea_orm::ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        patch: &AssetPatch,
        current: Option<Asset>,
    ) -> ResultEngine<Option<Asset>> {
        match patch {
            AssetPatch::Keep => Ok(current),
            AssetPatch::Clear => Ok(None),
            AssetPatch::Set(selector) => Ok(Some(
                self.resolve_selector(db, user_id, selector, ResolveMode::Strict)
                    .await?,
            )),
        }
    }
}
