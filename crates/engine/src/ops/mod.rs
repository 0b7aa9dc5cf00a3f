use sea_orm::DatabaseConnection;

use crate::{LedgerConfig, ResultEngine};

mod access;
mod assets;
mod balances;
mod resolver;
mod summary;
mod transactions;

pub use balances::BalanceDrift;
pub(crate) use resolver::ResolveMode;
pub use summary::{CurrencyTotals, DaySummary, MonthSummary};
pub use transactions::TransactionListFilter;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = sea_orm::TransactionTrait::begin(&$self.database).await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

/// Re-run a mutation while its balance writes keep losing version races, up to
/// `max_conflict_retries` extra attempts.
macro_rules! retry_on_conflict {
    ($self:expr, $label:literal, $op:expr) => {{
        let mut attempt: u32 = 0;
        loop {
            match $op.await {
                Err($crate::EngineError::Conflict(reason))
                    if attempt < $self.config.max_conflict_retries =>
                {
                    attempt += 1;
                    tracing::warn!(attempt, %reason, "{}: balance conflict, retrying", $label);
                }
                other => break other,
            }
        }
    }};
}

pub(crate) use retry_on_conflict;
pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    pub(crate) database: DatabaseConnection,
    pub(crate) config: LedgerConfig,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    config: LedgerConfig,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the default ledger configuration.
    pub fn config(mut self, config: LedgerConfig) -> EngineBuilder {
        self.config = config;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            config: self.config,
        })
    }
}
