//! Ledger writes and reads.
//!
//! Every write folds the transaction's legs into a [`BalancePlan`] seeded with
//! the touched assets, then persists the transaction row and the planned
//! balances inside the caller's DB transaction.

use sea_orm::{ActiveModelTrait, ConnectionTrait};
use uuid::Uuid;

use crate::{
    Asset, BalanceDirection, BalancePlan, ResultEngine, Transaction, transaction_legs,
    transactions,
};

use super::{Engine, with_tx};

mod create;
mod delete;
mod list;
mod update;

pub use list::TransactionListFilter;

impl Engine {
    /// Return a transaction of the user.
    pub async fn transaction(
        &self,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            self.require_transaction(&db_tx, user_id, transaction_id)
                .await
        })
    }

    /// Inserts an already validated transaction and applies its legs to
    /// `from`/`to`.
    pub(in crate::ops) async fn record_transaction<C: ConnectionTrait>(
        &self,
        db: &C,
        tx: &Transaction,
        from: Option<&Asset>,
        to: Option<&Asset>,
    ) -> ResultEngine<()> {
        let mut plan = BalancePlan::new();
        for asset in [from, to].into_iter().flatten() {
            plan.seed(asset);
        }
        plan.apply(&transaction_legs(tx, BalanceDirection::Apply)?)?;

        transactions::ActiveModel::from(tx).insert(db).await?;
        self.persist_plan(db, &plan).await
    }
}
