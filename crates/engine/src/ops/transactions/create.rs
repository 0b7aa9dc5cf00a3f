use sea_orm::ConnectionTrait;

use crate::{
    CreateTransactionCmd, ResultEngine, Transaction, util::normalize_optional_text,
    validate_transaction,
};

use super::super::{Engine, ResolveMode, retry_on_conflict, with_tx};

impl Engine {
    /// Create a transaction and apply it to the balances of its assets.
    ///
    /// Asset references are resolved strictly among the user's active assets.
    /// Errors come in order: resolution, then validation.
    pub async fn create_transaction(&self, cmd: CreateTransactionCmd) -> ResultEngine<Transaction> {
        retry_on_conflict!(
            self,
            "create_transaction",
            self.try_create_transaction(&cmd, ResolveMode::Strict)
        )
    }

    /// One attempt at [`Engine::create_transaction`] in its own DB transaction.
    pub(crate) async fn try_create_transaction(
        &self,
        cmd: &CreateTransactionCmd,
        mode: ResolveMode,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            self.create_transaction_in(&db_tx, cmd, mode).await
        })
    }

    async fn create_transaction_in<C: ConnectionTrait>(
        &self,
        db: &C,
        cmd: &CreateTransactionCmd,
        mode: ResolveMode,
    ) -> ResultEngine<Transaction> {
        self.require_user(db, &cmd.user_id).await?;
        let currency = cmd.currency.unwrap_or(self.config.default_currency);

        let from = self
            .resolve_optional_selector(db, &cmd.user_id, cmd.from_asset.as_ref(), mode)
            .await?;
        let to = self
            .resolve_optional_selector(db, &cmd.user_id, cmd.to_asset.as_ref(), mode)
            .await?;

        validate_transaction(&cmd.user_id, cmd.kind, cmd.amount, from.as_ref(), to.as_ref())?;

        let tx = Transaction::new(
            cmd.user_id.clone(),
            cmd.kind,
            cmd.amount,
            currency,
            from.as_ref().map(|asset| asset.id),
            to.as_ref().map(|asset| asset.id),
            normalize_optional_text(cmd.category.as_deref()),
            normalize_optional_text(cmd.description.as_deref()),
            cmd.occurred_at,
        )?;
        self.record_transaction(db, &tx, from.as_ref(), to.as_ref())
            .await?;

        tracing::debug!(
            user_id = %tx.user_id,
            transaction_id = %tx.id,
            kind = tx.kind.as_str(),
            amount = %tx.amount,
            "transaction created"
        );
        Ok(tx)
    }
}
