//! Exchange-rate tap core — config, checkpoint, fetching, schema evolution, sync loop.
//!
//! This crate contains everything the tap does short of process setup:
//! - Config and checkpoint models (JSON or TOML config, JSON state)
//! - Day-by-day date walker with a live "today" upper bound
//! - Blocking rate provider with a constant-interval, jittered retry policy
//! - Append-only schema evolver with last-emitted snapshot comparison
//! - Record shaping (flattened or schemaless)
//! - Line-oriented SCHEMA / RECORD / STATE output protocol
//! - The sync loop tying it all together with crash-safe checkpointing

pub mod config;
pub mod data;
pub mod dates;
pub mod output;
pub mod record;
pub mod schema;
pub mod state;
pub mod sync;

pub use config::{ConfigError, ExchangeSpec, TapConfig};
pub use data::{ApilayerProvider, FetchError, RatePayload, RateProvider, RetryPolicy};
pub use dates::{Clock, DateWalker, FixedClock, SystemClock};
pub use output::{JsonLinesSink, Message, MessageSink};
pub use record::RecordMode;
pub use schema::{SchemaDelta, SchemaEvolver};
pub use state::{resolve_start_date, Checkpoint, StateError};
pub use sync::{sync, SyncSummary, TapError};
