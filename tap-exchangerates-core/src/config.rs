//! Tap configuration.
//!
//! Config is read from a JSON file (or TOML when the extension is `.toml`).
//! All required keys are checked up front so a broken config reports every
//! missing key at once instead of failing on the first one.

use crate::dates::parse_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Keys that must be present in every config file.
pub const REQUIRED_CONFIG_KEYS: [&str; 4] = ["apikey", "exchanges", "start_date", "schemaless"];

/// Errors from loading or interpreting the config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("config is missing required keys: {}", .0.join(", "))]
    MissingKeys(Vec<String>),

    #[error("invalid start_date '{value}': {source}")]
    InvalidDate {
        value: String,
        source: chrono::ParseError,
    },

    #[error("config lists no exchanges")]
    NoExchanges,
}

/// One base currency and the symbols to quote against it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExchangeSpec {
    pub base: String,
    pub symbols: Vec<String>,
}

impl ExchangeSpec {
    /// Symbols joined the way the provider expects them (`EUR,GBP`).
    pub fn symbols_csv(&self) -> String {
        self.symbols.join(",")
    }
}

/// Static configuration for one run.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct TapConfig {
    pub apikey: String,
    pub exchanges: Vec<ExchangeSpec>,
    pub start_date: String,
    pub schemaless: bool,
}

impl fmt::Debug for TapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TapConfig")
            .field("apikey", &"<redacted>")
            .field("exchanges", &self.exchanges)
            .field("start_date", &self.start_date)
            .field("schemaless", &self.schemaless)
            .finish()
    }
}

impl TapConfig {
    /// Load a config file. `.toml` files are parsed as TOML, anything else as JSON.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(s)?;
        check_required(|key| value.get(key).is_some())?;
        let config: TapConfig = serde_json::from_value(value)?;
        config.validate()
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(s)?;
        check_required(|key| table.contains_key(key))?;
        let config: TapConfig = toml::Value::Table(table).try_into()?;
        config.validate()
    }

    /// The configured start date as a calendar date.
    pub fn start_date(&self) -> Result<NaiveDate, ConfigError> {
        parse_date(&self.start_date).map_err(|source| ConfigError::InvalidDate {
            value: self.start_date.clone(),
            source,
        })
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.exchanges.is_empty() {
            return Err(ConfigError::NoExchanges);
        }
        self.start_date()?;
        Ok(self)
    }
}

fn check_required(has_key: impl Fn(&str) -> bool) -> Result<(), ConfigError> {
    let missing: Vec<String> = REQUIRED_CONFIG_KEYS
        .into_iter()
        .filter(|&key| !has_key(key))
        .map(|key| key.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::MissingKeys(missing))
    }
}
