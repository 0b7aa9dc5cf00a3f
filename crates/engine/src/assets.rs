//! The module contains `Asset` struct and its implementation.
//!
//! An asset is anything that holds money for a user: cash, a debit card, a
//! credit card, a deposit or a brokerage account. All kinds share the same
//! record; the kind-specific attributes live in [`AssetDetails`], whose variant
//! must always agree with [`AssetKind`].

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AssetRef, Currency, EngineError, MoneyCents, ResultEngine,
    util::{normalize_name_key, parse_uuid},
};

/// Discriminant of an asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetKind {
    Cash,
    DebitCard,
    Deposit,
    CreditCard,
    Brokerage,
}

impl AssetKind {
    /// Canonical code, as written in `TYPE: Name` tokens and in the database.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::DebitCard => "DEBIT_CARD",
            Self::Deposit => "DEPOSIT",
            Self::CreditCard => "CREDIT_CARD",
            Self::Brokerage => "BROKERAGE",
        }
    }

    /// Human label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::DebitCard => "Debit Card",
            Self::Deposit => "Deposit",
            Self::CreditCard => "Credit Card",
            Self::Brokerage => "Brokerage Account",
        }
    }
}

impl core::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for AssetKind {
    type Error = EngineError;

    /// Accepts codes and labels, case-insensitively; spaces, hyphens and
    /// underscores are interchangeable (`debit card` == `DEBIT_CARD`).
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let key: String = value
            .trim()
            .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("_")
            .to_ascii_uppercase();
        match key.as_str() {
            "CASH" => Ok(Self::Cash),
            "DEBIT_CARD" => Ok(Self::DebitCard),
            "DEPOSIT" => Ok(Self::Deposit),
            "CREDIT_CARD" => Ok(Self::CreditCard),
            "BROKERAGE" | "BROKERAGE_ACCOUNT" => Ok(Self::Brokerage),
            _ => Err(EngineError::InvalidKind(format!(
                "unknown asset type: {}",
                value.trim()
            ))),
        }
    }
}

/// Brokerage account flavours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BrokerageAccountType {
    /// Plain brokerage account.
    Brokerage,
    /// Individual investment account.
    Iis,
    /// Individual retirement account.
    Ira,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CashDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_4_digits: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditCardDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_4_digits: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_limit: Option<MoneyCents>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace_period_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_day: Option<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepositDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    /// Yearly rate in basis points (`450` = 4.50%).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_rate_bps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_months: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renewal_date: Option<NaiveDate>,
    pub is_capitalized: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerageDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broker_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<BrokerageAccountType>,
}

/// Kind-specific asset attributes.
///
/// Stored as JSON in the `details` column, tagged with the same code as the
/// asset kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetDetails {
    Cash(CashDetails),
    DebitCard(CardDetails),
    Deposit(DepositDetails),
    CreditCard(CreditCardDetails),
    Brokerage(BrokerageDetails),
}

impl AssetDetails {
    /// Details with every attribute unset, as created by import resolution.
    #[must_use]
    pub fn empty(kind: AssetKind) -> Self {
        match kind {
            AssetKind::Cash => Self::Cash(CashDetails::default()),
            AssetKind::DebitCard => Self::DebitCard(CardDetails::default()),
            AssetKind::Deposit => Self::Deposit(DepositDetails::default()),
            AssetKind::CreditCard => Self::CreditCard(CreditCardDetails::default()),
            AssetKind::Brokerage => Self::Brokerage(BrokerageDetails::default()),
        }
    }

    #[must_use]
    pub fn kind(&self) -> AssetKind {
        match self {
            Self::Cash(_) => AssetKind::Cash,
            Self::DebitCard(_) => AssetKind::DebitCard,
            Self::Deposit(_) => AssetKind::Deposit,
            Self::CreditCard(_) => AssetKind::CreditCard,
            Self::Brokerage(_) => AssetKind::Brokerage,
        }
    }

    /// Checks the attributes against `kind` and their own value ranges.
    pub fn validate_for(&self, kind: AssetKind) -> ResultEngine<()> {
        if self.kind() != kind {
            return Err(EngineError::InvalidDetails(format!(
                "{} details given for a {} asset",
                self.kind(),
                kind
            )));
        }
        match self {
            Self::Cash(_) | Self::Brokerage(_) => Ok(()),
            Self::DebitCard(card) => validate_last_4(card.last_4_digits.as_deref()),
            Self::CreditCard(card) => {
                validate_last_4(card.last_4_digits.as_deref())?;
                if card.credit_limit.is_some_and(MoneyCents::is_negative) {
                    return Err(EngineError::InvalidDetails(
                        "credit_limit must be >= 0".to_string(),
                    ));
                }
                if let Some(day) = card.billing_day
                    && !(1..=31).contains(&day)
                {
                    return Err(EngineError::InvalidDetails(format!(
                        "billing_day must be in 1..=31, got {day}"
                    )));
                }
                Ok(())
            }
            Self::Deposit(deposit) => {
                if deposit.term_months == Some(0) {
                    return Err(EngineError::InvalidDetails(
                        "term_months must be > 0".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    pub(crate) fn to_json(&self) -> ResultEngine<String> {
        serde_json::to_string(self)
            .map_err(|err| EngineError::InvalidDetails(format!("cannot encode details: {err}")))
    }

    fn from_json(raw: &str) -> ResultEngine<Self> {
        serde_json::from_str(raw)
            .map_err(|err| EngineError::InvalidDetails(format!("cannot decode details: {err}")))
    }
}

fn validate_last_4(value: Option<&str>) -> ResultEngine<()> {
    match value {
        Some(digits) if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) => {
            Err(EngineError::InvalidDetails(format!(
                "last_4_digits must be 4 digits, got \"{digits}\""
            )))
        }
        _ => Ok(()),
    }
}

/// An asset owned by a single user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub user_id: String,
    pub kind: AssetKind,
    pub name: String,
    pub currency: Currency,
    pub balance: MoneyCents,
    pub is_active: bool,
    pub details: AssetDetails,
    /// Optimistic concurrency counter, bumped on every balance write.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Asset {
    /// A new, active, zero-balance asset.
    pub fn new(
        user_id: String,
        kind: AssetKind,
        name: String,
        currency: Currency,
        details: AssetDetails,
        now: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        details.validate_for(kind)?;
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            name,
            currency,
            balance: MoneyCents::ZERO,
            is_active: true,
            details,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// The `TYPE: Name` reference of this asset.
    #[must_use]
    pub fn reference(&self) -> AssetRef {
        AssetRef::new(self.kind, self.name.clone())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub name: String,
    pub name_norm: String,
    pub currency: String,
    pub balance_minor: i64,
    pub is_active: bool,
    pub details: String,
    pub version: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
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

impl TryFrom<&Asset> for ActiveModel {
    type Error = EngineError;

    fn try_from(value: &Asset) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            kind: ActiveValue::Set(value.kind.code().to_string()),
            name: ActiveValue::Set(value.name.clone()),
            name_norm: ActiveValue::Set(normalize_name_key(&value.name)),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            balance_minor: ActiveValue::Set(value.balance.cents()),
            is_active: ActiveValue::Set(value.is_active),
            details: ActiveValue::Set(value.details.to_json()?),
            version: ActiveValue::Set(value.version),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        })
    }
}

impl TryFrom<Model> for Asset {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let kind = AssetKind::try_from(model.kind.as_str())?;
        let details = AssetDetails::from_json(&model.details)?;
        if details.kind() != kind {
            return Err(EngineError::InvalidDetails(format!(
                "stored details of asset {} do not match its kind",
                model.id
            )));
        }
        Ok(Self {
            id: parse_uuid(&model.id, "asset")?,
            user_id: model.user_id,
            kind,
            name: model.name,
            currency: Currency::try_from(model.currency.as_str())?,
            balance: MoneyCents::new(model.balance_minor),
            is_active: model.is_active,
            details,
            version: model.version,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_accepts_codes_and_labels() {
        assert_eq!(AssetKind::try_from("debit_card").unwrap(), AssetKind::DebitCard);
        assert_eq!(AssetKind::try_from("Debit Card").unwrap(), AssetKind::DebitCard);
        assert_eq!(AssetKind::try_from("credit-card").unwrap(), AssetKind::CreditCard);
        assert_eq!(
            AssetKind::try_from("Brokerage Account").unwrap(),
            AssetKind::Brokerage
        );
        assert!(AssetKind::try_from("SAVINGS").is_err());
    }

    #[test]
    fn details_json_keeps_kind_tag() {
        let details = AssetDetails::DebitCard(CardDetails {
            bank_name: Some("Sberbank".to_string()),
            last_4_digits: Some("1234".to_string()),
        });
        let raw = details.to_json().unwrap();
        assert_eq!(
            raw,
            r#"{"kind":"DEBIT_CARD","bank_name":"Sberbank","last_4_digits":"1234"}"#
        );
        assert_eq!(AssetDetails::from_json(&raw).unwrap(), details);
    }

    #[test]
    fn details_must_match_kind() {
        let details = AssetDetails::empty(AssetKind::Cash);
        assert!(details.validate_for(AssetKind::Cash).is_ok());
        assert_eq!(
            details.validate_for(AssetKind::Deposit).unwrap_err(),
            EngineError::InvalidDetails("CASH details given for a DEPOSIT asset".to_string())
        );
    }

    #[test]
    fn credit_card_details_are_range_checked() {
        let bad_day = AssetDetails::CreditCard(CreditCardDetails {
            billing_day: Some(32),
            ..Default::default()
        });
        assert!(bad_day.validate_for(AssetKind::CreditCard).is_err());

        let bad_digits = AssetDetails::CreditCard(CreditCardDetails {
            last_4_digits: Some("12a4".to_string()),
            ..Default::default()
        });
        assert!(bad_digits.validate_for(AssetKind::CreditCard).is_err());

        let ok = AssetDetails::CreditCard(CreditCardDetails {
            bank_name: Some("Tinkoff".to_string()),
            last_4_digits: Some("5678".to_string()),
            credit_limit: Some(MoneyCents::new(10_000_000)),
            grace_period_days: Some(55),
            billing_day: Some(1),
        });
        assert!(ok.validate_for(AssetKind::CreditCard).is_ok());
    }
}
