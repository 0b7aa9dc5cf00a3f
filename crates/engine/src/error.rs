//! The module contains the errors the engine can throw.
//!
//! Ledger errors map one to one to the failure kinds a caller has to tell
//! apart:
//!
//! - [`InvalidAssetReference`] a `TYPE: Name` token that cannot be parsed.
//! - [`UnknownAsset`] / [`AmbiguousAsset`] a reference that resolves to zero
//!   or to more than one active asset.
//! - [`InvalidTransactionStructure`], [`InvalidAmount`], [`SelfTransfer`],
//!   [`OwnershipViolation`] raised by the transaction validator.
//! - [`Database`] wraps every storage failure.
//!
//! Every variant has a stable [`ErrorKind`], which is what import reports
//! carry per rejected row.
//!
//!  [`InvalidAssetReference`]: EngineError::InvalidAssetReference
//!  [`UnknownAsset`]: EngineError::UnknownAsset
//!  [`AmbiguousAsset`]: EngineError::AmbiguousAsset
//!  [`InvalidTransactionStructure`]: EngineError::InvalidTransactionStructure
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`SelfTransfer`]: EngineError::SelfTransfer
//!  [`OwnershipViolation`]: EngineError::OwnershipViolation
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid asset reference \"{0}\"")]
    InvalidAssetReference(String),
    #[error("Unknown asset: {0}")]
    UnknownAsset(String),
    #[error("Ambiguous asset: {0}")]
    AmbiguousAsset(String),
    #[error("Invalid transaction structure: {0}")]
    InvalidTransactionStructure(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Self transfer: {0}")]
    SelfTransfer(String),
    #[error("Ownership violation: {0}")]
    OwnershipViolation(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid kind: {0}")]
    InvalidKind(String),
    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("Invalid asset details: {0}")]
    InvalidDetails(String),
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),
    #[error("Asset in use: {0}")]
    AssetInUse(String),
    #[error("Concurrent modification: {0}")]
    Conflict(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Stable, serializable classification of an [`EngineError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidAssetReference,
    UnknownAsset,
    AmbiguousAsset,
    InvalidTransactionStructure,
    InvalidAmount,
    SelfTransfer,
    OwnershipViolation,
    KeyNotFound,
    InvalidDate,
    InvalidKind,
    InvalidCurrency,
    InvalidName,
    InvalidId,
    InvalidCursor,
    InvalidDetails,
    InvalidHeader,
    InvalidEncoding,
    AssetInUse,
    Conflict,
    Csv,
    Persistence,
}

impl EngineError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAssetReference(_) => ErrorKind::InvalidAssetReference,
            Self::UnknownAsset(_) => ErrorKind::UnknownAsset,
            Self::AmbiguousAsset(_) => ErrorKind::AmbiguousAsset,
            Self::InvalidTransactionStructure(_) => ErrorKind::InvalidTransactionStructure,
            Self::InvalidAmount(_) => ErrorKind::InvalidAmount,
            Self::SelfTransfer(_) => ErrorKind::SelfTransfer,
            Self::OwnershipViolation(_) => ErrorKind::OwnershipViolation,
            Self::KeyNotFound(_) => ErrorKind::KeyNotFound,
            Self::InvalidDate(_) => ErrorKind::InvalidDate,
            Self::InvalidKind(_) => ErrorKind::InvalidKind,
            Self::InvalidCurrency(_) => ErrorKind::InvalidCurrency,
            Self::InvalidName(_) => ErrorKind::InvalidName,
            Self::InvalidId(_) => ErrorKind::InvalidId,
            Self::InvalidCursor(_) => ErrorKind::InvalidCursor,
            Self::InvalidDetails(_) => ErrorKind::InvalidDetails,
            Self::InvalidHeader(_) => ErrorKind::InvalidHeader,
            Self::InvalidEncoding(_) => ErrorKind::InvalidEncoding,
            Self::AssetInUse(_) => ErrorKind::AssetInUse,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Csv(_) => ErrorKind::Csv,
            Self::Database(_) => ErrorKind::Persistence,
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAssetReference(a), Self::InvalidAssetReference(b)) => a == b,
            (Self::UnknownAsset(a), Self::UnknownAsset(b)) => a == b,
            (Self::AmbiguousAsset(a), Self::AmbiguousAsset(b)) => a == b,
            (Self::InvalidTransactionStructure(a), Self::InvalidTransactionStructure(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::SelfTransfer(a), Self::SelfTransfer(b)) => a == b,
            (Self::OwnershipViolation(a), Self::OwnershipViolation(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidDate(a), Self::InvalidDate(b)) => a == b,
            (Self::InvalidKind(a), Self::InvalidKind(b)) => a == b,
            (Self::InvalidCurrency(a), Self::InvalidCurrency(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::InvalidCursor(a), Self::InvalidCursor(b)) => a == b,
            (Self::InvalidDetails(a), Self::InvalidDetails(b)) => a == b,
            (Self::InvalidHeader(a), Self::InvalidHeader(b)) => a == b,
            (Self::InvalidEncoding(a), Self::InvalidEncoding(b)) => a == b,
            (Self::AssetInUse(a), Self::AssetInUse(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Csv(a), Self::Csv(b)) => a.to_string() == b.to_string(),
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
