//! Record shaping.
//!
//! Typed mode flattens a payload into `{CODE: rate, ..., BASE: 1.0, date: ts}`.
//! Schemaless mode passes the provider's document through untouched.

use crate::data::RatePayload;
use crate::dates::{format_date, DATE_FORMAT};
use chrono::NaiveDate;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordMode {
    /// Flatten rates to top-level keys and add the base and a timestamp.
    Typed,
    /// Emit the provider payload as received.
    Schemaless,
}

impl RecordMode {
    pub fn from_schemaless(schemaless: bool) -> Self {
        if schemaless {
            RecordMode::Schemaless
        } else {
            RecordMode::Typed
        }
    }
}

/// True when the payload reports exactly the requested date.
pub fn matches_date(payload: &RatePayload, date: NaiveDate) -> bool {
    payload.date == format_date(date)
}

/// Flatten a payload into one record.
///
/// Every rate becomes a top-level key (null stays null), the base currency
/// maps to `1.0`, and `date` becomes a midnight UTC timestamp
/// (`YYYY-MM-DDT00:00:00Z`).
pub fn flatten(payload: &RatePayload) -> Result<Map<String, Value>, chrono::ParseError> {
    let date = NaiveDate::parse_from_str(&payload.date, DATE_FORMAT)?;

    let mut record: Map<String, Value> = payload
        .rates
        .iter()
        .map(|(code, rate)| (code.clone(), rate.clone().map_or(Value::Null, Value::Number)))
        .collect();
    record.insert(payload.base.clone(), Value::from(1.0));
    record.insert(
        "date".to_string(),
        Value::String(date.format("%Y-%m-%dT00:00:00Z").to_string()),
    );
    Ok(record)
}

/// Shape a payload for emission under the given mode.
///
/// Only typed mode reads the payload date, so only typed mode can fail.
pub fn shape(payload: &RatePayload, mode: RecordMode) -> Result<Value, chrono::ParseError> {
    match mode {
        RecordMode::Schemaless => Ok(payload.raw.clone()),
        RecordMode::Typed => flatten(payload).map(Value::Object),
    }
}
