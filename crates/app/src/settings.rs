//! Handles settings for the application.
//!
//! Sources, later ones winning: `moneybook.toml` (or the file given with
//! `--config`), then `MONEYBOOK__*` environment variables
//! (`MONEYBOOK__LEDGER__DEFAULT_CURRENCY=USD`), then command-line flags.
//!
//! ```toml
//! database = { sqlite = "moneybook.db" }
//!
//! [app]
//! level = "debug"
//!
//! [ledger]
//! default_currency = "RUB"
//! max_conflict_retries = 3
//! ```
use config::{Config, ConfigError, Environment, File};
use engine::LedgerConfig;
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "moneybook.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct App {
    /// Log level for the `tracing` env filter.
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    /// Path of the SQLite file, created if missing.
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite("moneybook.db".to_string())
    }
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Self::Memory => String::from("sqlite::memory:"),
            Self::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub ledger: LedgerConfig,
}

impl Settings {
    /// Load settings. A missing default file is fine; a missing explicit
    /// `config_path` is an error.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(
                File::with_name(config_path.unwrap_or(DEFAULT_CONFIG_PATH))
                    .required(config_path.is_some()),
            )
            .add_source(
                Environment::with_prefix("MONEYBOOK")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;
    use engine::Currency;

    use super::*;

    fn from_toml(raw: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn empty_file_uses_defaults() {
        let settings = from_toml("");
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.database, Database::Sqlite("moneybook.db".to_string()));
        assert_eq!(settings.ledger, LedgerConfig::default());
    }

    #[test]
    fn sections_override_defaults() {
        let settings = from_toml(
            r#"
            database = "memory"

            [app]
            level = "debug"

            [ledger]
            default_currency = "USD"
            "#,
        );
        assert_eq!(settings.app.level, "debug");
        assert_eq!(settings.database.url(), "sqlite::memory:");
        assert_eq!(settings.ledger.default_currency, Currency::Usd);
        assert_eq!(settings.ledger.max_conflict_retries, 3);
    }
}
