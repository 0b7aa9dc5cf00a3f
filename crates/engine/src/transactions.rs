//! Transaction primitives.
//!
//! A `Transaction` moves money into, out of, or between a user's assets.
//! The amount is always positive; the direction follows from the kind and
//! from which of `from_asset_id`/`to_asset_id` is set.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError, MoneyCents, ResultEngine,
    util::{parse_optional_uuid, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    /// Money enters `to_asset` from outside the ledger.
    Refill,
    /// Money leaves `from_asset` to outside the ledger.
    Waste,
    /// Money moves from `from_asset` to `to_asset`.
    Transfer,
}

impl TransactionKind {
    /// Storage code.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Refill => "REFILL",
            Self::Waste => "WASTE",
            Self::Transfer => "TRANSFER",
        }
    }

    /// Label used in CSV files.
    pub fn label(self) -> &'static str {
        match self {
            Self::Refill => "Refill",
            Self::Waste => "Waste",
            Self::Transfer => "Transfer",
        }
    }

    /// Whether the kind requires `(from_asset, to_asset)`.
    pub fn required_assets(self) -> (bool, bool) {
        match self {
            Self::Refill => (false, true),
            Self::Waste => (true, false),
            Self::Transfer => (true, true),
        }
    }
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "REFILL" => Ok(Self::Refill),
            "WASTE" => Ok(Self::Waste),
            "TRANSFER" => Ok(Self::Transfer),
            _ => Err(EngineError::InvalidKind(format!(
                "invalid transaction type: {}",
                value.trim()
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: String,
    pub kind: TransactionKind,
    pub amount: MoneyCents,
    pub currency: Currency,
    pub from_asset_id: Option<Uuid>,
    pub to_asset_id: Option<Uuid>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: String,
        kind: TransactionKind,
        amount: MoneyCents,
        currency: Currency,
        from_asset_id: Option<Uuid>,
        to_asset_id: Option<Uuid>,
        category: Option<String>,
        description: Option<String>,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(format!(
                "amount must be > 0, got {amount}"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            amount,
            currency,
            from_asset_id,
            to_asset_id,
            category,
            description,
            occurred_at,
            created_at: Utc::now(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub currency: String,
    pub from_asset_id: Option<String>,
    pub to_asset_id: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub occurred_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Username",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            user_id: ActiveValue::Set(tx.user_id.clone()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount.cents()),
            currency: ActiveValue::Set(tx.currency.code().to_string()),
            from_asset_id: ActiveValue::Set(tx.from_asset_id.map(|id| id.to_string())),
            to_asset_id: ActiveValue::Set(tx.to_asset_id.map(|id| id.to_string())),
            category: ActiveValue::Set(tx.category.clone()),
            description: ActiveValue::Set(tx.description.clone()),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            user_id: model.user_id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount: MoneyCents::new(model.amount_minor),
            currency: Currency::try_from(model.currency.as_str())?,
            from_asset_id: parse_optional_uuid(model.from_asset_id.as_deref(), "asset")?,
            to_asset_id: parse_optional_uuid(model.to_asset_id.as_deref(), "asset")?,
            category: model.category,
            description: model.description,
            occurred_at: model.occurred_at,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parsing_is_case_insensitive() {
        assert_eq!(TransactionKind::try_from("refill").unwrap(), TransactionKind::Refill);
        assert_eq!(TransactionKind::try_from(" Waste ").unwrap(), TransactionKind::Waste);
        assert_eq!(
            TransactionKind::try_from("TRANSFER").unwrap(),
            TransactionKind::Transfer
        );
        assert_eq!(
            TransactionKind::try_from("changing_balance").unwrap_err(),
            EngineError::InvalidKind("invalid transaction type: changing_balance".to_string())
        );
    }

    #[test]
    fn new_rejects_non_positive_amounts() {
        let build = |cents| {
            Transaction::new(
                "alice".to_string(),
                TransactionKind::Refill,
                MoneyCents::new(cents),
                Currency::Rub,
                None,
                Some(Uuid::new_v4()),
                None,
                None,
                Utc::now(),
            )
        };
        assert!(build(1).is_ok());
        assert!(matches!(build(0), Err(EngineError::InvalidAmount(_))));
        assert!(matches!(build(-100), Err(EngineError::InvalidAmount(_))));
    }
}
