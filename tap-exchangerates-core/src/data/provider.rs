//! Rate provider trait and structured error types.
//!
//! The RateProvider trait abstracts over the HTTP source so the sync loop can
//! be driven by a scripted provider in tests.

use crate::config::ExchangeSpec;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Provider response for one (date, base) pair.
///
/// `raw` is the response document exactly as received. The typed fields are
/// read out of it; rates keep the provider's number representation and may
/// be null.
#[derive(Debug, Clone, PartialEq)]
pub struct RatePayload {
    pub base: String,
    pub date: String,
    pub rates: BTreeMap<String, Option<Number>>,
    pub raw: Value,
}

#[derive(Deserialize)]
struct PayloadFields {
    base: String,
    date: String,
    rates: BTreeMap<String, Option<Number>>,
}

impl RatePayload {
    /// Read the typed fields out of a decoded response, keeping the document.
    pub fn from_value(raw: Value) -> Result<Self, serde_json::Error> {
        let fields = PayloadFields::deserialize(&raw)?;
        Ok(Self {
            base: fields.base,
            date: fields.date,
            rates: fields.rates,
            raw,
        })
    }

    pub fn from_json_str(body: &str) -> Result<Self, serde_json::Error> {
        Self::from_value(serde_json::from_str(body)?)
    }

    /// The quoted rate for `code`, if present and not null.
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code)?.as_ref()?.as_f64()
    }
}

/// Errors from fetching rates.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    /// Whether another attempt may succeed: 429, 5xx and transport failures.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http { status, .. } => *status == 429 || *status >= 500,
            FetchError::Transport { .. } => true,
            FetchError::Decode { .. } | FetchError::Client(_) => false,
        }
    }

    /// Whether this is a request-level failure (HTTP status or transport).
    ///
    /// These end a sync through the checkpoint-flushing path; everything
    /// else is treated as an unexpected failure.
    pub fn is_request_error(&self) -> bool {
        matches!(self, FetchError::Http { .. } | FetchError::Transport { .. })
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            FetchError::Http { url, .. }
            | FetchError::Transport { url, .. }
            | FetchError::Decode { url, .. } => Some(url),
            FetchError::Client(_) => None,
        }
    }
}

/// A source of daily exchange rates.
pub trait RateProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the rates quoted against `exchange.base` for one day.
    fn fetch(&self, date: NaiveDate, exchange: &ExchangeSpec) -> Result<RatePayload, FetchError>;
}
