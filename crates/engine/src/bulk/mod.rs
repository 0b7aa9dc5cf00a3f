//! CSV bulk import and export.
//!
//! One file row per transaction, columns in [`CSV_HEADERS`] order. Assets are
//! written as `TYPE: Name` tokens, amounts with two decimals and dates as
//! `YYYY-MM-DD HH:MM` (UTC).

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use csv::{ByteRecord, StringRecord};
use serde::{Deserialize, Serialize};

use crate::{
    AssetRef, AssetSelector, CreateTransactionCmd, Currency, EngineError, ErrorKind, MoneyCents,
    ResultEngine, TransactionKind, util::normalize_optional_text,
};

mod export;
mod import;

pub const CSV_HEADERS: [&str; 8] = [
    "Date",
    "Type",
    "Category",
    "Amount",
    "Currency",
    "From Asset",
    "To Asset",
    "Description",
];

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One transaction as it appears in a file. Every field is raw text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Category", default)]
    pub category: Option<String>,
    #[serde(rename = "Amount")]
    pub amount: String,
    #[serde(rename = "Currency", default)]
    pub currency: Option<String>,
    #[serde(rename = "From Asset", default)]
    pub from_asset: Option<String>,
    #[serde(rename = "To Asset", default)]
    pub to_asset: Option<String>,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
}

/// A row that was not imported.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    /// 1-based index among data rows (the header is not counted).
    pub row_index: usize,
    pub row: LedgerRow,
    pub kind: ErrorKind,
    pub message: String,
}

/// Outcome of an import batch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub created_count: usize,
    pub skipped_count: usize,
    /// In input order.
    pub errors: Vec<RowFailure>,
}

impl ImportReport {
    fn record(&mut self, row_index: usize, row: LedgerRow, outcome: ResultEngine<()>) {
        match outcome {
            Ok(()) => self.created_count += 1,
            Err(err) => {
                tracing::warn!(row_index, kind = ?err.kind(), "import row rejected: {err}");
                self.skipped_count += 1;
                self.errors.push(RowFailure {
                    row_index,
                    row,
                    kind: err.kind(),
                    message: err.to_string(),
                });
            }
        }
    }
}

/// Column positions of a file header. Matching is case-insensitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Columns {
    date: usize,
    kind: usize,
    category: Option<usize>,
    amount: usize,
    currency: Option<usize>,
    from_asset: Option<usize>,
    to_asset: Option<usize>,
    description: Option<usize>,
}

impl Columns {
    fn from_header(header: &StringRecord) -> ResultEngine<Self> {
        let find = |name: &str| {
            header
                .iter()
                .position(|column| column.trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| {
            find(name).ok_or_else(|| {
                EngineError::InvalidHeader(format!("missing required column \"{name}\""))
            })
        };

        Ok(Self {
            date: required("Date")?,
            kind: required("Type")?,
            category: find("Category"),
            amount: required("Amount")?,
            currency: find("Currency"),
            from_asset: find("From Asset"),
            to_asset: find("To Asset"),
            description: find("Description"),
        })
    }

    /// The row as text; bytes that are not UTF-8 become U+FFFD.
    fn row(&self, record: &ByteRecord) -> LedgerRow {
        let field = |idx: usize| record.get(idx).map(String::from_utf8_lossy);
        let text = |idx: usize| field(idx).unwrap_or_default().trim().to_string();
        let optional = |idx: Option<usize>| {
            idx.and_then(|idx| field(idx))
                .and_then(|value| normalize_optional_text(Some(value.as_ref())))
        };
        LedgerRow {
            date: text(self.date),
            kind: text(self.kind),
            category: optional(self.category),
            amount: text(self.amount),
            currency: optional(self.currency),
            from_asset: optional(self.from_asset),
            to_asset: optional(self.to_asset),
            description: optional(self.description),
        }
    }
}

/// Parses `YYYY-MM-DD HH:MM` (seconds allowed) or a bare `YYYY-MM-DD`, read as
/// midnight. Always UTC.
pub(crate) fn parse_row_date(raw: &str) -> ResultEngine<DateTime<Utc>> {
    let raw = raw.trim();
    let parsed = NaiveDateTime::parse_from_str(raw, DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|date| date.and_time(NaiveTime::MIN))
        })
        .map_err(|_| EngineError::InvalidDate(format!("invalid date: \"{raw}\"")))?;
    Ok(parsed.and_utc())
}

pub(crate) fn format_row_date(value: DateTime<Utc>) -> String {
    value.format(DATE_FORMAT).to_string()
}

fn parse_token(raw: Option<&str>) -> ResultEngine<Option<AssetSelector>> {
    raw.map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| AssetRef::from_str(token).map(AssetSelector::Ref))
        .transpose()
}

impl LedgerRow {
    /// The creation command this row stands for. Blank currency falls back to
    /// `default_currency`.
    pub fn to_command(
        &self,
        user_id: &str,
        default_currency: Currency,
    ) -> ResultEngine<CreateTransactionCmd> {
        let occurred_at = parse_row_date(&self.date)?;
        let kind = TransactionKind::try_from(self.kind.as_str())?;
        let amount = MoneyCents::from_str(&self.amount)?;
        let currency = match normalize_optional_text(self.currency.as_deref()) {
            Some(code) => Currency::try_from(code.as_str())?,
            None => default_currency,
        };

        let mut cmd =
            CreateTransactionCmd::new(user_id, kind, amount, occurred_at).currency(currency);
        cmd.from_asset = parse_token(self.from_asset.as_deref())?;
        cmd.to_asset = parse_token(self.to_asset.as_deref())?;
        cmd.category = normalize_optional_text(self.category.as_deref());
        cmd.description = normalize_optional_text(self.description.as_deref());
        Ok(cmd)
    }
}
