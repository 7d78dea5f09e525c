//! apilayer "exchangerates_data" provider.
//!
//! Fetches one day of rates per request from
//! `GET {base_url}/{date}?base={base}&symbols={csv}` with an `apikey` header.
//! Rate limiting (429) and server errors (5xx) are retried under the
//! configured [`RetryPolicy`]; any other error status fails immediately.

use super::provider::{FetchError, RatePayload, RateProvider};
use super::retry::RetryPolicy;
use crate::config::ExchangeSpec;
use crate::dates::format_date;
use chrono::NaiveDate;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://api.apilayer.com/exchangerates_data";

/// Blocking client for the apilayer exchange-rates API.
pub struct ApilayerProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    apikey: String,
    retry: RetryPolicy,
}

impl ApilayerProvider {
    pub fn new(apikey: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("tap-exchangerates/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            apikey: apikey.into(),
            retry: RetryPolicy::default(),
        })
    }

    /// Point the provider at another host (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Endpoint for one day, without query parameters.
    pub fn endpoint(&self, date: NaiveDate) -> String {
        format!("{}/{}", self.base_url, format_date(date))
    }

    /// One request, no retries.
    fn request_once(&self, url: &str, exchange: &ExchangeSpec) -> Result<RatePayload, FetchError> {
        let resp = self
            .client
            .get(url)
            .header("apikey", &self.apikey)
            .query(&[
                ("base", exchange.base.as_str()),
                ("symbols", exchange.symbols_csv().as_str()),
            ])
            .send()
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        let full_url = resp.url().to_string();
        let body = resp.text().map_err(|source| FetchError::Transport {
            url: full_url.clone(),
            source,
        })?;

        if !status.is_success() {
            warn!(status = status.as_u16(), url = %full_url, body = %body, "provider returned an error status");
            return Err(FetchError::Http {
                url: full_url,
                status: status.as_u16(),
                body,
            });
        }

        RatePayload::from_json_str(&body).map_err(|source| FetchError::Decode {
            url: full_url,
            source,
        })
    }
}

impl RateProvider for ApilayerProvider {
    fn name(&self) -> &str {
        "apilayer_exchangerates"
    }

    fn fetch(&self, date: NaiveDate, exchange: &ExchangeSpec) -> Result<RatePayload, FetchError> {
        let url = self.endpoint(date);
        self.retry
            .run(|| self.request_once(&url, exchange), |err| !err.is_retryable())
    }
}
