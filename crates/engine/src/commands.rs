//! Command structs for engine operations.
//!
//! These types group parameters for write operations (new asset, create and
//! update transaction), keeping call sites readable and avoiding long
//! argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{AssetDetails, AssetKind, AssetRef, Currency, MoneyCents, TransactionKind};

/// How a command points at an asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetSelector {
    /// By stable id; ownership is checked by the validator.
    Id(Uuid),
    /// By `TYPE: Name`; resolved among the user's active assets.
    Ref(AssetRef),
}

impl From<Uuid> for AssetSelector {
    fn from(value: Uuid) -> Self {
        Self::Id(value)
    }
}

impl From<AssetRef> for AssetSelector {
    fn from(value: AssetRef) -> Self {
        Self::Ref(value)
    }
}

/// Change to one asset side of an existing transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AssetPatch {
    #[default]
    Keep,
    Clear,
    Set(AssetSelector),
}

/// Create an asset.
#[derive(Clone, Debug)]
pub struct NewAssetCmd {
    pub user_id: String,
    pub kind: AssetKind,
    pub name: String,
    /// Defaults to the configured currency.
    pub currency: Option<Currency>,
    /// Defaults to [`AssetDetails::empty`] for `kind`.
    pub details: Option<AssetDetails>,
    /// Recorded as an opening REFILL (or WASTE when negative).
    pub opening_balance: MoneyCents,
    pub opened_at: DateTime<Utc>,
}

impl NewAssetCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, kind: AssetKind, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
            name: name.into(),
            currency: None,
            details: None,
            opening_balance: MoneyCents::ZERO,
            opened_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    #[must_use]
    pub fn details(mut self, details: AssetDetails) -> Self {
        self.details = Some(details);
        self
    }

    #[must_use]
    pub fn opening_balance(mut self, balance: MoneyCents) -> Self {
        self.opening_balance = balance;
        self
    }

    #[must_use]
    pub fn opened_at(mut self, opened_at: DateTime<Utc>) -> Self {
        self.opened_at = opened_at;
        self
    }
}

/// Create a transaction.
#[derive(Clone, Debug)]
pub struct CreateTransactionCmd {
    pub user_id: String,
    pub kind: TransactionKind,
    pub amount: MoneyCents,
    /// Defaults to the configured currency.
    pub currency: Option<Currency>,
    pub from_asset: Option<AssetSelector>,
    pub to_asset: Option<AssetSelector>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl CreateTransactionCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        kind: TransactionKind,
        amount: MoneyCents,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
            amount,
            currency: None,
            from_asset: None,
            to_asset: None,
            category: None,
            description: None,
            occurred_at,
        }
    }

    /// A REFILL into `to`.
    #[must_use]
    pub fn refill(
        user_id: impl Into<String>,
        amount: MoneyCents,
        to: impl Into<AssetSelector>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self::new(user_id, TransactionKind::Refill, amount, occurred_at).to(to)
    }

    /// A WASTE out of `from`.
    #[must_use]
    pub fn waste(
        user_id: impl Into<String>,
        amount: MoneyCents,
        from: impl Into<AssetSelector>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self::new(user_id, TransactionKind::Waste, amount, occurred_at).from(from)
    }

    /// A TRANSFER from `from` to `to`.
    #[must_use]
    pub fn transfer(
        user_id: impl Into<String>,
        amount: MoneyCents,
        from: impl Into<AssetSelector>,
        to: impl Into<AssetSelector>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self::new(user_id, TransactionKind::Transfer, amount, occurred_at)
            .from(from)
            .to(to)
    }

    #[must_use]
    pub fn from(mut self, asset: impl Into<AssetSelector>) -> Self {
        self.from_asset = Some(asset.into());
        self
    }

    #[must_use]
    pub fn to(mut self, asset: impl Into<AssetSelector>) -> Self {
        self.to_asset = Some(asset.into());
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Update an existing transaction.
///
/// Every field is a patch: `None` / [`AssetPatch::Keep`] leaves the stored
/// value untouched. For `category` and `description`, `Some("")` clears.
#[derive(Clone, Debug)]
pub struct UpdateTransactionCmd {
    pub user_id: String,
    pub transaction_id: Uuid,
    pub kind: Option<TransactionKind>,
    pub amount: Option<MoneyCents>,
    pub currency: Option<Currency>,
    pub from_asset: AssetPatch,
    pub to_asset: AssetPatch,
    pub category: Option<String>,
    pub description: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, transaction_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            transaction_id,
            kind: None,
            amount: None,
            currency: None,
            from_asset: AssetPatch::Keep,
            to_asset: AssetPatch::Keep,
            category: None,
            description: None,
            occurred_at: None,
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: MoneyCents) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    #[must_use]
    pub fn from_asset(mut self, patch: AssetPatch) -> Self {
        self.from_asset = patch;
        self
    }

    #[must_use]
    pub fn to_asset(mut self, patch: AssetPatch) -> Self {
        self.to_asset = patch;
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }
}
