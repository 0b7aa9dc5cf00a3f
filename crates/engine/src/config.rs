//! Engine configuration.
//!
//! Passed explicitly to [`Engine::builder`](crate::Engine::builder); the
//! engine never reads process-wide settings on its own.

use serde::Deserialize;

use crate::Currency;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Currency for transactions and import-created assets that do not name
    /// one.
    pub default_currency: Currency,
    /// Extra attempts after a balance write lost a version race.
    pub max_conflict_retries: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_currency: Currency::Rub,
            max_conflict_retries: 3,
        }
    }
}
