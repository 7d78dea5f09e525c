//! Rate fetching: provider trait, retry policy, and the apilayer client.

pub mod apilayer;
pub mod provider;
pub mod retry;

pub use apilayer::{ApilayerProvider, DEFAULT_BASE_URL};
pub use provider::{FetchError, RatePayload, RateProvider};
pub use retry::RetryPolicy;
