//! Opseed Bench - request latency harness
//!
//! Times one blocking read repeatedly against a datastore backend and
//! summarises the samples with a streaming mean/standard deviation.

pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod report;
pub mod runner;

// Re-exports
pub use backend::{Getter, RestconfGetter, StoreGetter};
pub use config::{BackendKind, Config, RestconfConfig};
pub use error::BenchError;
pub use report::{TimeUnit, format_summary};
pub use runner::{Summary, run, run_with};
