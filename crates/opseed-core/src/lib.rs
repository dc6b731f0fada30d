//! Opseed Core - Shared infrastructure for the opseed tools
//!
//! Process-wide setup (logging, termination signals), progress reporting
//! and the streaming statistics used by the latency benchmarks.

pub mod logging;
pub mod progress;
pub mod shutdown;
pub mod stats;

// Re-exports for convenience
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use shutdown::{Termination, TerminationSignals};
pub use stats::{StatAccumulator, StatsError};
