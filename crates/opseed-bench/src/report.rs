//! Summary line formatting

use std::fmt;

use opseed_core::{StatAccumulator, StatsError};

/// Nanoseconds per microsecond
const NS_PER_US: f64 = 1_000.0;
/// Nanoseconds per millisecond
const NS_PER_MS: f64 = 1_000_000.0;

/// Display unit for a latency summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Micros,
    Millis,
}

impl TimeUnit {
    /// Microseconds while the mean stays under 1000 µs, milliseconds otherwise.
    pub fn for_mean_ns(mean_ns: f64) -> Self {
        if mean_ns < NS_PER_MS {
            Self::Micros
        } else {
            Self::Millis
        }
    }

    /// Nanoseconds per unit.
    pub fn scale(&self) -> f64 {
        match self {
            Self::Micros => NS_PER_US,
            Self::Millis => NS_PER_MS,
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            Self::Micros => "µ",
            Self::Millis => "m",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.prefix())
    }
}

/// `--- {label} {n} get_data: mean=… µs; σ=… µs ---` for samples in nanoseconds.
pub fn format_summary(label: &str, stats: &StatAccumulator) -> Result<String, StatsError> {
    let stddev = stats.stddev()?;
    let mean = stats.mean();
    let unit = TimeUnit::for_mean_ns(mean);
    let scale = unit.scale();
    Ok(format!(
        "--- {label} {} get_data: mean={:.6} {unit}; σ={:.6} {unit} ---",
        stats.count(),
        mean / scale,
        stddev / scale,
    ))
}
