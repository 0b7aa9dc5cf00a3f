//! Human-readable asset references.
//!
//! Import files and the CLI name assets as `TYPE: Name`, e.g.
//! `DEBIT_CARD: Sberbank`. Parsing is purely syntactic; turning a reference
//! into an asset record is done by the resolver (`Engine::resolve_asset_ref`).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{AssetKind, EngineError};

/// A parsed `TYPE: Name` token.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRef {
    pub kind: AssetKind,
    pub name: String,
}

impl AssetRef {
    pub fn new(kind: AssetKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Renders the canonical token (`KIND_CODE: Name`).
impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.code(), self.name)
    }
}

impl FromStr for AssetRef {
    type Err = EngineError;

    /// Splits on the first `:`; the name may itself contain colons.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidAssetReference(token.trim().to_string());

        let (kind, name) = token.split_once(':').ok_or_else(invalid)?;
        let kind = AssetKind::try_from(kind).map_err(|_| invalid())?;
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(kind, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_code_and_label_forms() {
        let token: AssetRef = " debit_card :  Sberbank ".parse().unwrap();
        assert_eq!(token, AssetRef::new(AssetKind::DebitCard, "Sberbank"));

        let token: AssetRef = "Credit Card: Tinkoff Platinum".parse().unwrap();
        assert_eq!(token, AssetRef::new(AssetKind::CreditCard, "Tinkoff Platinum"));
    }

    #[test]
    fn name_may_contain_colons() {
        let token: AssetRef = "BROKERAGE: IIS: long term".parse().unwrap();
        assert_eq!(token.name, "IIS: long term");
    }

    #[test]
    fn rejects_malformed_tokens() {
        for raw in ["Sberbank", "DEBIT_CARD:", "DEBIT_CARD:   ", "WALLET: Main", ": Main"] {
            assert_eq!(
                raw.parse::<AssetRef>().unwrap_err(),
                EngineError::InvalidAssetReference(raw.trim().to_string()),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn display_is_canonical() {
        let token: AssetRef = "cash: Wallet".parse().unwrap();
        assert_eq!(token.to_string(), "CASH: Wallet");
    }
}
