//! Sync loop — walks dates, fetches each exchange, evolves the schema, emits
//! records, and checkpoints.
//!
//! Per date, every exchange is fetched in config order. The schema is
//! emitted before the first record that needs a new property. Once all
//! exchanges for a date are done the checkpoint moves to that date and a
//! STATE message is written.
//!
//! A request failure (HTTP error status or transport failure after the
//! retry budget) stops the run: the error is logged, the checkpoint of the
//! last fully completed date is flushed, and the error is returned so the
//! caller can exit non-zero. Any other error is returned without a flush.

use crate::config::{ExchangeSpec, TapConfig};
use crate::data::{FetchError, RateProvider};
use crate::dates::{format_date, Clock, DateWalker};
use crate::output::{Message, MessageSink};
use crate::record::{self, RecordMode};
use crate::schema::SchemaEvolver;
use crate::state::Checkpoint;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, error, info};

/// Errors that end a sync.
#[derive(Debug, Error)]
pub enum TapError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("provider returned unparseable date '{date}': {source}")]
    PayloadDate {
        date: String,
        source: chrono::ParseError,
    },

    #[error("failed to write message: {0}")]
    Output(#[from] std::io::Error),
}

impl TapError {
    /// True for the request-failure path, where the checkpoint has been flushed.
    pub fn is_fatal_http(&self) -> bool {
        matches!(self, TapError::Fetch(err) if err.is_request_error())
    }
}

/// What a finished sync did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    /// The checkpoint written last.
    pub state: Checkpoint,
    pub dates_processed: usize,
    pub records_emitted: usize,
    pub schemas_emitted: usize,
    /// Payloads skipped because they reported a different date.
    pub mismatched_payloads: usize,
}

/// Replicate every configured exchange from `start` through today.
pub fn sync(
    config: &TapConfig,
    start: NaiveDate,
    provider: &dyn RateProvider,
    sink: &mut dyn MessageSink,
    clock: &dyn Clock,
) -> Result<SyncSummary, TapError> {
    info!(
        provider = provider.name(),
        start_date = %format_date(start),
        exchanges = config.exchanges.len(),
        schemaless = config.schemaless,
        "sync starting"
    );

    let mut run = Replication {
        mode: RecordMode::from_schemaless(config.schemaless),
        provider,
        sink,
        schema: SchemaEvolver::new(),
        summary: SyncSummary {
            state: Checkpoint::new(start),
            dates_processed: 0,
            records_emitted: 0,
            schemas_emitted: 0,
            mismatched_payloads: 0,
        },
        last_written: None,
    };

    match run.walk(&config.exchanges, start, clock) {
        Ok(()) => {}
        Err(TapError::Fetch(err)) if err.is_request_error() => {
            log_request_failure(&err);
            run.flush_state()?;
            return Err(TapError::Fetch(err));
        }
        Err(err) => return Err(err),
    }

    run.flush_state()?;
    info!(
        dates = run.summary.dates_processed,
        records = run.summary.records_emitted,
        state = %format_date(run.summary.state.start_date),
        "tap exiting normally"
    );
    Ok(run.summary)
}

fn log_request_failure(err: &FetchError) {
    match err {
        FetchError::Http { url, status, body } => {
            error!(url = %url, status, body = %body, "request failed, giving up");
        }
        other => {
            error!(url = other.url().unwrap_or("<unknown>"), error = %other, "request failed, giving up");
        }
    }
}

struct Replication<'a> {
    mode: RecordMode,
    provider: &'a dyn RateProvider,
    sink: &'a mut dyn MessageSink,
    schema: SchemaEvolver,
    summary: SyncSummary,
    last_written: Option<Checkpoint>,
}

impl Replication<'_> {
    fn walk(
        &mut self,
        exchanges: &[ExchangeSpec],
        start: NaiveDate,
        clock: &dyn Clock,
    ) -> Result<(), TapError> {
        for date in DateWalker::new(start, clock) {
            for exchange in exchanges {
                self.replicate_exchange(date, exchange)?;
            }

            self.summary.state = Checkpoint::new(date);
            self.summary.dates_processed += 1;
            self.write_state()?;
        }
        Ok(())
    }

    fn replicate_exchange(&mut self, date: NaiveDate, exchange: &ExchangeSpec) -> Result<(), TapError> {
        info!(
            date = %format_date(date),
            base = %exchange.base,
            "replicating exchange rate data"
        );

        let payload = self.provider.fetch(date, exchange)?;

        let delta = self.schema.observe(payload.rates.keys().map(String::as_str));
        if !delta.is_empty() {
            debug!(added = ?delta.added, "new currencies in schema");
        }
        if let Some(schema) = self.schema.pending() {
            self.sink.write_message(&Message::schema(schema))?;
            self.schema.mark_emitted();
            self.summary.schemas_emitted += 1;
        }

        if !record::matches_date(&payload, date) {
            debug!(
                requested = %format_date(date),
                returned = %payload.date,
                base = %exchange.base,
                "payload is for another date, skipping"
            );
            self.summary.mismatched_payloads += 1;
            return Ok(());
        }

        let shaped =
            record::shape(&payload, self.mode).map_err(|source| TapError::PayloadDate {
                date: payload.date.clone(),
                source,
            })?;
        self.sink.write_message(&Message::record(shaped))?;
        self.summary.records_emitted += 1;
        Ok(())
    }

    fn write_state(&mut self) -> Result<(), TapError> {
        self.sink
            .write_message(&Message::state(self.summary.state.to_value()))?;
        self.last_written = Some(self.summary.state);
        Ok(())
    }

    /// Final checkpoint write; skipped when that exact state is already the last one written.
    fn flush_state(&mut self) -> Result<(), TapError> {
        if self.last_written == Some(self.summary.state) {
            return Ok(());
        }
        self.write_state()
    }
}
