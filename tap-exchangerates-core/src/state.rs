//! Resumable checkpoint state.
//!
//! The checkpoint is a single date: the last day whose exchanges were all
//! processed. A later run starts from that date again, so delivery is
//! at-least-once for the boundary day.

use crate::config::{ConfigError, TapConfig};
use crate::dates::parse_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to read state {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid state JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid start_date in state '{value}': {source}")]
    InvalidDate {
        value: String,
        source: chrono::ParseError,
    },
}

/// `{"start_date": "YYYY-MM-DD"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub start_date: NaiveDate,
}

impl Checkpoint {
    pub fn new(start_date: NaiveDate) -> Self {
        Self { start_date }
    }

    /// Read a prior state file. Returns `None` when the file carries no `start_date`.
    pub fn from_file(path: &Path) -> Result<Option<Self>, StateError> {
        let content = std::fs::read_to_string(path).map_err(|source| StateError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Parse a prior state document. Unknown keys are ignored.
    pub fn from_json_str(s: &str) -> Result<Option<Self>, StateError> {
        let value: serde_json::Value = serde_json::from_str(s)?;
        let Some(raw) = value.get("start_date").and_then(|v| v.as_str()) else {
            return Ok(None);
        };

        let start_date = parse_date(raw).map_err(|source| StateError::InvalidDate {
            value: raw.to_string(),
            source,
        })?;
        Ok(Some(Self { start_date }))
    }

    /// The state as a JSON value, ready for a STATE message.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({ "start_date": crate::dates::format_date(self.start_date) })
    }
}

/// Pick the date a run starts from: the checkpoint if there is one, else the config.
pub fn resolve_start_date(
    config: &TapConfig,
    state: Option<&Checkpoint>,
) -> Result<NaiveDate, ConfigError> {
    match state {
        Some(checkpoint) => Ok(checkpoint.start_date),
        None => config.start_date(),
    }
}
