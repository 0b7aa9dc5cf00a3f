//! Structural validation of transactions.
//!
//! | kind     | from_asset | to_asset |
//! |----------|------------|----------|
//! | REFILL   | absent     | present  |
//! | WASTE    | present    | absent   |
//! | TRANSFER | present    | present  |
//!
//! Checks run in a fixed order (structure, amount, distinct assets,
//! ownership) so callers always see the same error for the same input.

use crate::{Asset, EngineError, MoneyCents, ResultEngine, TransactionKind};

/// Checks which asset fields a transaction of `kind` may carry.
pub fn validate_structure(kind: TransactionKind, has_from: bool, has_to: bool) -> ResultEngine<()> {
    let (needs_from, needs_to) = kind.required_assets();
    let describe = |needed: bool| if needed { "required" } else { "not allowed" };

    if has_from != needs_from {
        return Err(EngineError::InvalidTransactionStructure(format!(
            "from_asset is {} for {}",
            describe(needs_from),
            kind.as_str()
        )));
    }
    if has_to != needs_to {
        return Err(EngineError::InvalidTransactionStructure(format!(
            "to_asset is {} for {}",
            describe(needs_to),
            kind.as_str()
        )));
    }
    Ok(())
}

pub fn validate_amount(amount: MoneyCents) -> ResultEngine<()> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount(format!(
            "amount must be > 0, got {amount}"
        )));
    }
    Ok(())
}

/// Full validation of a transaction owned by `user_id`.
pub fn validate_transaction(
    user_id: &str,
    kind: TransactionKind,
    amount: MoneyCents,
    from: Option<&Asset>,
    to: Option<&Asset>,
) -> ResultEngine<()> {
    validate_structure(kind, from.is_some(), to.is_some())?;
    validate_amount(amount)?;

    if let (Some(from), Some(to)) = (from, to)
        && from.id == to.id
    {
        return Err(EngineError::SelfTransfer(format!(
            "from_asset and to_asset are both {}",
            from.reference()
        )));
    }

    for asset in [from, to].into_iter().flatten() {
        if asset.user_id != user_id {
            return Err(EngineError::OwnershipViolation(format!(
                "asset {} does not belong to {user_id}",
                asset.id
            )));
        }
    }
    Ok(())
}
