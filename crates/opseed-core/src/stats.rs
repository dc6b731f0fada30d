//! Streaming mean/variance (Welford's one-pass update)
//!
//! Used to summarise request latencies. The one-pass update keeps the
//! running sum of squared deviations from the current mean, so samples with
//! a large common offset (nanosecond timestamps) don't cancel catastrophically
//! the way `Σx² - (Σx)²/n` does.

use std::time::Duration;

/// Errors from querying an accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsError {
    /// Variance needs strictly more samples than the delta degrees of freedom.
    InsufficientSamples { count: u64, ddof: u64 },
}

impl std::fmt::Display for StatsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientSamples { count, ddof } => write!(
                f,
                "variance needs more than {ddof} sample(s), got {count}"
            ),
        }
    }
}

impl std::error::Error for StatsError {}

/// Running count, mean and sum of squared deviations over a sample stream.
#[derive(Debug, Clone)]
pub struct StatAccumulator {
    ddof: u64,
    n: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl StatAccumulator {
    /// Sample variance (Bessel's correction).
    pub const DEFAULT_DDOF: u64 = 1;

    pub fn new() -> Self {
        Self::with_ddof(Self::DEFAULT_DDOF)
    }

    /// `ddof = 0` gives the population variance.
    pub fn with_ddof(ddof: u64) -> Self {
        Self {
            ddof,
            n: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Fold one sample into the running statistics.
    pub fn include(&mut self, datum: f64) {
        self.n += 1;
        let delta = datum - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (datum - self.mean);
        self.min = self.min.min(datum);
        self.max = self.max.max(datum);
    }

    /// Include a duration as nanoseconds.
    pub fn include_duration(&mut self, elapsed: Duration) {
        self.include(elapsed.as_nanos() as f64);
    }

    pub fn count(&self) -> u64 {
        self.n
    }

    pub fn ddof(&self) -> u64 {
        self.ddof
    }

    /// Running mean; `0.0` before any sample.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// `M2 / (n - ddof)`
    pub fn variance(&self) -> Result<f64, StatsError> {
        if self.n <= self.ddof {
            return Err(StatsError::InsufficientSamples {
                count: self.n,
                ddof: self.ddof,
            });
        }
        Ok(self.m2 / (self.n - self.ddof) as f64)
    }

    pub fn stddev(&self) -> Result<f64, StatsError> {
        self.variance().map(f64::sqrt)
    }

    pub fn min(&self) -> Option<f64> {
        (self.n > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<f64> {
        (self.n > 0).then_some(self.max)
    }
}

impl Default for StatAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Extend<f64> for StatAccumulator {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for datum in iter {
            self.include(datum);
        }
    }
}

impl FromIterator<f64> for StatAccumulator {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = Self::new();
        acc.extend(iter);
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{Rng, SeedableRng};

    /// Reference: mean first, then squared deviations.
    fn two_pass_variance(xs: &[f64], ddof: u64) -> f64 {
        let n = xs.len() as f64;
        let mean = xs.iter().sum::<f64>() / n;
        let ss: f64 = xs.iter().map(|x| (x - mean) * (x - mean)).sum();
        ss / (n - ddof as f64)
    }

    fn assert_close(actual: f64, expected: f64, rel: f64) {
        let scale = expected.abs().max(f64::MIN_POSITIVE);
        assert!(
            (actual - expected).abs() / scale <= rel,
            "actual {actual} vs expected {expected}"
        );
    }

    #[test]
    fn textbook_sequence() {
        let acc: StatAccumulator = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]
            .into_iter()
            .collect();
        assert_eq!(acc.count(), 8);
        assert_eq!(acc.mean(), 5.0);
        assert_close(acc.variance().unwrap(), 32.0 / 7.0, 1e-12);
        assert_close(acc.stddev().unwrap(), (32.0f64 / 7.0).sqrt(), 1e-12);
        assert_eq!(acc.min(), Some(2.0));
        assert_eq!(acc.max(), Some(9.0));
    }

    #[test]
    fn population_variance_with_ddof_zero() {
        let mut acc = StatAccumulator::with_ddof(0);
        acc.extend([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_close(acc.variance().unwrap(), 4.0, 1e-12);
        assert_close(acc.stddev().unwrap(), 2.0, 1e-12);
    }

    #[test]
    fn empty_has_no_variance() {
        let acc = StatAccumulator::new();
        assert_eq!(acc.mean(), 0.0);
        assert_eq!(acc.min(), None);
        assert_eq!(
            acc.variance(),
            Err(StatsError::InsufficientSamples { count: 0, ddof: 1 })
        );
    }

    #[test]
    fn single_sample_has_no_sample_variance() {
        let mut acc = StatAccumulator::new();
        acc.include(42.0);
        assert_eq!(acc.mean(), 42.0);
        let err = acc.stddev().unwrap_err();
        assert_eq!(err, StatsError::InsufficientSamples { count: 1, ddof: 1 });
        assert!(err.to_string().contains("got 1"));
    }

    #[test]
    fn durations_are_nanoseconds() {
        let mut acc = StatAccumulator::new();
        acc.include_duration(Duration::from_micros(3));
        acc.include_duration(Duration::from_micros(5));
        assert_eq!(acc.mean(), 4_000.0);
        assert_close(acc.variance().unwrap(), 2_000_000.0, 1e-12);
    }

    #[test]
    fn huge_offset_matches_jitter_only_variance() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0x5eed);
        let jitter: Vec<f64> = (0..50_000).map(|_| rng.gen_range(0.0..1_000.0)).collect();

        let offset = 1e12;
        let acc: StatAccumulator = jitter.iter().map(|j| offset + j).collect();

        let expected = two_pass_variance(&jitter, 1);
        assert_close(acc.variance().unwrap(), expected, 1e-6);
        assert_close(acc.mean() - offset, jitter.iter().sum::<f64>() / 50_000.0, 1e-6);
    }

    proptest! {
        #[test]
        fn matches_two_pass(
            xs in prop::collection::vec(-1e6f64..1e6, 2..200),
            ddof in 0u64..2,
        ) {
            let mut acc = StatAccumulator::with_ddof(ddof);
            acc.extend(xs.iter().copied());
            let expected = two_pass_variance(&xs, ddof);
            let actual = acc.variance().unwrap();
            prop_assert!(
                (actual - expected).abs() <= 1e-9 * expected.abs().max(1.0),
                "actual {} vs expected {}", actual, expected
            );
        }
    }
}
