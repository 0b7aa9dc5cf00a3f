//! Transaction legs.
//!
//! A [`Leg`] is a single balance change applied to one asset as part of a
//! [`Transaction`](crate::Transaction):
//! - positive deltas increase the asset balance
//! - negative deltas decrease the asset balance
//!
//! Legs are derived, never stored: the kind, amount and asset pair of a
//! transaction fully determine them. Every balance change the engine makes
//! goes through a [`BalancePlan`], which folds legs over a snapshot of the
//! touched assets in memory before anything is written.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Asset, EngineError, MoneyCents, ResultEngine, Transaction, TransactionKind};

/// Whether a transaction's effect is being added or taken back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceDirection {
    Apply,
    Reverse,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    pub asset_id: Uuid,
    pub delta: MoneyCents,
}

/// Legs implied by a transaction of `kind` moving `amount`.
///
/// REFILL credits `to`, WASTE debits `from`, TRANSFER does both. The asset
/// pair must already have the shape the kind requires.
pub fn legs_for(
    kind: TransactionKind,
    amount: MoneyCents,
    from_asset_id: Option<Uuid>,
    to_asset_id: Option<Uuid>,
    direction: BalanceDirection,
) -> ResultEngine<Vec<Leg>> {
    let missing = |side: &str| {
        EngineError::InvalidTransactionStructure(format!(
            "{} requires {side}_asset",
            kind.as_str()
        ))
    };
    let debit = amount
        .checked_neg()
        .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))?;

    let mut legs = match kind {
        TransactionKind::Refill => vec![Leg {
            asset_id: to_asset_id.ok_or_else(|| missing("to"))?,
            delta: amount,
        }],
        TransactionKind::Waste => vec![Leg {
            asset_id: from_asset_id.ok_or_else(|| missing("from"))?,
            delta: debit,
        }],
        TransactionKind::Transfer => vec![
            Leg {
                asset_id: from_asset_id.ok_or_else(|| missing("from"))?,
                delta: debit,
            },
            Leg {
                asset_id: to_asset_id.ok_or_else(|| missing("to"))?,
                delta: amount,
            },
        ],
    };

    if direction == BalanceDirection::Reverse {
        for leg in &mut legs {
            leg.delta = -leg.delta;
        }
    }
    Ok(legs)
}

/// Legs of an existing transaction.
pub fn transaction_legs(tx: &Transaction, direction: BalanceDirection) -> ResultEngine<Vec<Leg>> {
    legs_for(
        tx.kind,
        tx.amount,
        tx.from_asset_id,
        tx.to_asset_id,
        direction,
    )
}

/// Balance of one asset before and after a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlannedBalance {
    pub before: MoneyCents,
    pub after: MoneyCents,
    /// Version read with `before`; the write is conditional on it.
    pub version: i64,
}

/// In-memory fold of legs over a snapshot of asset balances.
#[derive(Clone, Debug, Default)]
pub struct BalancePlan {
    balances: BTreeMap<Uuid, PlannedBalance>,
}

impl BalancePlan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the snapshot of an asset. Re-seeding an asset is a no-op so
    /// legs already applied are kept.
    pub fn seed(&mut self, asset: &Asset) {
        self.balances.entry(asset.id).or_insert(PlannedBalance {
            before: asset.balance,
            after: asset.balance,
            version: asset.version,
        });
    }

    pub fn apply(&mut self, legs: &[Leg]) -> ResultEngine<()> {
        for leg in legs {
            let entry = self.balances.get_mut(&leg.asset_id).ok_or_else(|| {
                EngineError::KeyNotFound(format!("asset {} not loaded", leg.asset_id))
            })?;
            entry.after = entry.after.checked_add(leg.delta).ok_or_else(|| {
                EngineError::InvalidAmount(format!("balance overflow on asset {}", leg.asset_id))
            })?;
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, asset_id: &Uuid) -> Option<&PlannedBalance> {
        self.balances.get(asset_id)
    }

    /// Assets whose balance actually changes, in id order.
    pub fn changed(&self) -> impl Iterator<Item = (&Uuid, &PlannedBalance)> {
        self.balances
            .iter()
            .filter(|(_, balance)| balance.before != balance.after)
    }
}
