use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{QueryFilter, QueryOrder, prelude::*};
use serde::Serialize;

use crate::{
    Currency, EngineError, MoneyCents, ResultEngine, Transaction, TransactionKind, transactions,
};

use super::{Engine, with_tx};

/// Income and expense of one currency over a month.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CurrencyTotals {
    /// Sum of REFILL amounts.
    pub income: MoneyCents,
    /// Sum of WASTE amounts, positive.
    pub expense: MoneyCents,
    /// `income - expense`.
    pub balance: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    /// Newest first.
    pub transactions: Vec<Transaction>,
    /// Signed per-currency total: REFILL adds, WASTE subtracts. TRANSFER
    /// counts as 0, it is not subtracted like spending.
    pub totals: BTreeMap<Currency, MoneyCents>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    /// Days with at least one transaction, newest first.
    pub days: Vec<DaySummary>,
    pub totals: BTreeMap<Currency, CurrencyTotals>,
}

fn month_bounds(year: i32, month: u32) -> ResultEngine<(DateTime<Utc>, DateTime<Utc>)> {
    let invalid = || EngineError::InvalidDate(format!("invalid month: {year}-{month:02}"));
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;
    Ok((
        start.and_time(chrono::NaiveTime::MIN).and_utc(),
        end.and_time(chrono::NaiveTime::MIN).and_utc(),
    ))
}

fn overflow() -> EngineError {
    EngineError::InvalidAmount("month total overflow".to_string())
}

fn summarize(year: i32, month: u32, txs: Vec<Transaction>) -> ResultEngine<MonthSummary> {
    let mut days: Vec<DaySummary> = Vec::new();
    let mut totals: BTreeMap<Currency, CurrencyTotals> = BTreeMap::new();

    for tx in txs {
        let date = tx.occurred_at.date_naive();
        if days.last().is_none_or(|day| day.date != date) {
            days.push(DaySummary {
                date,
                transactions: Vec::new(),
                totals: BTreeMap::new(),
            });
        }

        let signed = match tx.kind {
            TransactionKind::Refill => tx.amount,
            TransactionKind::Waste => -tx.amount,
            TransactionKind::Transfer => MoneyCents::ZERO,
        };
        let month_totals = totals.entry(tx.currency).or_default();
        match tx.kind {
            TransactionKind::Refill => {
                month_totals.income = month_totals
                    .income
                    .checked_add(tx.amount)
                    .ok_or_else(overflow)?;
            }
            TransactionKind::Waste => {
                month_totals.expense = month_totals
                    .expense
                    .checked_add(tx.amount)
                    .ok_or_else(overflow)?;
            }
            TransactionKind::Transfer => {}
        }

        if let Some(day) = days.last_mut() {
            let day_total = day.totals.entry(tx.currency).or_default();
            *day_total = day_total.checked_add(signed).ok_or_else(overflow)?;
            day.transactions.push(tx);
        }
    }

    for month_totals in totals.values_mut() {
        month_totals.balance = month_totals
            .income
            .checked_sub(month_totals.expense)
            .ok_or_else(overflow)?;
    }

    Ok(MonthSummary {
        year,
        month,
        days,
        totals,
    })
}

impl Engine {
    /// The user's transactions of one calendar month (UTC), grouped by day.
    ///
    /// Totals are kept per currency; nothing is converted.
    pub async fn month_summary(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> ResultEngine<MonthSummary> {
        let (start, end) = month_bounds(year, month)?;
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let models: Vec<transactions::Model> = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id.to_string()))
                .filter(transactions::Column::OccurredAt.gte(start))
                .filter(transactions::Column::OccurredAt.lt(end))
                .order_by_desc(transactions::Column::OccurredAt)
                .order_by_desc(transactions::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            let txs = models
                .into_iter()
                .map(Transaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            summarize(year, month, txs)
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use uuid::Uuid;

    use super::*;

    fn tx(
        kind: TransactionKind,
        cents: i64,
        currency: Currency,
        day: u32,
        hour: u32,
    ) -> Transaction {
        let (from, to) = match kind {
            TransactionKind::Refill => (None, Some(Uuid::new_v4())),
            TransactionKind::Waste => (Some(Uuid::new_v4()), None),
            TransactionKind::Transfer => (Some(Uuid::new_v4()), Some(Uuid::new_v4())),
        };
        Transaction::new(
            "alice".to_string(),
            kind,
            MoneyCents::new(cents),
            currency,
            from,
            to,
            None,
            None,
            Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn bounds_wrap_december() {
        let (start, end) = month_bounds(2025, 12).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        assert!(matches!(month_bounds(2025, 13), Err(EngineError::InvalidDate(_))));
    }

    #[test]
    fn days_and_totals() {
        // Newest first, as loaded.
        let txs = vec![
            tx(TransactionKind::Transfer, 1_000_000, Currency::Rub, 12, 18),
            tx(TransactionKind::Waste, 350_000, Currency::Rub, 12, 9),
            tx(TransactionKind::Waste, 2_000, Currency::Usd, 5, 10),
            tx(TransactionKind::Refill, 5_000_000, Currency::Rub, 5, 8),
        ];
        let summary = summarize(2026, 3, txs).unwrap();

        assert_eq!(summary.days.len(), 2);
        let latest = &summary.days[0];
        assert_eq!(latest.date, NaiveDate::from_ymd_opt(2026, 3, 12).unwrap());
        assert_eq!(latest.transactions.len(), 2);
        assert_eq!(latest.totals[&Currency::Rub], MoneyCents::new(-350_000));

        let first = &summary.days[1];
        assert_eq!(first.totals[&Currency::Rub], MoneyCents::new(5_000_000));
        assert_eq!(first.totals[&Currency::Usd], MoneyCents::new(-2_000));

        assert_eq!(
            summary.totals[&Currency::Rub],
            CurrencyTotals {
                income: MoneyCents::new(5_000_000),
                expense: MoneyCents::new(350_000),
                balance: MoneyCents::new(4_650_000),
            }
        );
        assert_eq!(summary.totals[&Currency::Usd].balance, MoneyCents::new(-2_000));
    }
}
