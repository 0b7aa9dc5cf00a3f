//! Ledger engine.
//!
//! Keeps a user's asset balances consistent with their transaction log:
//! every create/update/delete validates the transaction, folds its legs into
//! the touched balances and persists both inside one database transaction.
//! Bulk CSV import/export sits on top of the same operations.

pub use asset_ref::AssetRef;
pub use assets::{
    Asset, AssetDetails, AssetKind, BrokerageAccountType, BrokerageDetails, CardDetails,
    CashDetails, CreditCardDetails, DepositDetails,
};
pub use bulk::{CSV_HEADERS, ImportReport, LedgerRow, RowFailure};
pub use categories::{
    OPENING_BALANCE_CATEGORY, RefillCategory, SuggestedCategory, WasteCategory,
    suggested_categories,
};
pub use commands::{
    AssetPatch, AssetSelector, CreateTransactionCmd, NewAssetCmd, UpdateTransactionCmd,
};
pub use config::LedgerConfig;
pub use currency::Currency;
pub use error::{EngineError, ErrorKind};
pub use legs::{BalanceDirection, BalancePlan, Leg, PlannedBalance, legs_for, transaction_legs};
pub use money::MoneyCents;
pub use ops::{
    BalanceDrift, CurrencyTotals, DaySummary, Engine, EngineBuilder, MonthSummary,
    TransactionListFilter,
};
pub use transactions::{Transaction, TransactionKind};
pub use validation::{validate_amount, validate_structure, validate_transaction};

mod asset_ref;
mod assets;
mod bulk;
mod categories;
mod commands;
mod config;
mod currency;
mod error;
mod legs;
mod money;
mod ops;
mod transactions;
mod users;
mod util;
mod validation;

type ResultEngine<T> = Result<T, EngineError>;
