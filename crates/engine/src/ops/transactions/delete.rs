use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{BalanceDirection, BalancePlan, ResultEngine, transaction_legs, transactions};

use super::super::{Engine, retry_on_conflict, with_tx};

impl Engine {
    /// Delete a transaction, reversing its effect on the balances.
    pub async fn delete_transaction(
        &self,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<()> {
        retry_on_conflict!(
            self,
            "delete_transaction",
            self.try_delete_transaction(user_id, transaction_id)
        )
    }

    async fn try_delete_transaction(
        &self,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let existing = self
                .require_transaction(&db_tx, user_id, transaction_id)
                .await?;

            let mut plan = BalancePlan::new();
            for asset_id in [existing.from_asset_id, existing.to_asset_id]
                .into_iter()
                .flatten()
            {
                plan.seed(&self.load_asset(&db_tx, asset_id).await?);
            }
            plan.apply(&transaction_legs(&existing, BalanceDirection::Reverse)?)?;

            transactions::Entity::delete_by_id(existing.id.to_string())
                .exec(&db_tx)
                .await?;
            self.persist_plan(&db_tx, &plan).await?;

            tracing::debug!(user_id, %transaction_id, "transaction deleted");
            Ok(())
        })
    }
}
