//! Benchmark loop

use std::time::{Duration, Instant};

use opseed_core::{ProgressContext, StatAccumulator};
use opseed_store::{Datastore, DatastoreKind, FileStore, Session};

use crate::backend::{Getter, RestconfGetter, StoreGetter};
use crate::config::{BackendKind, Config};
use crate::error::BenchError;
use crate::report::format_summary;

/// Benchmark execution summary
#[derive(Debug)]
pub struct Summary {
    pub label: String,
    /// Per-request latencies in nanoseconds
    pub stats: StatAccumulator,
    /// Wall time of the whole loop, responses logging included
    pub elapsed: Duration,
}

impl Summary {
    /// The one-line report printed at the end of a run.
    pub fn line(&self) -> Result<String, BenchError> {
        Ok(format_summary(&self.label, &self.stats)?)
    }
}

/// Run a benchmark against the configured backend
pub fn run(config: &Config, progress: &ProgressContext) -> Result<Summary, BenchError> {
    match config.backend {
        BackendKind::Store => {
            let store = FileStore::connect(&config.store_dir)?;
            let session = store.start_session(DatastoreKind::Operational)?;
            log::info!(
                "Timing get_data({}) on {} session {}",
                config.path,
                session.datastore(),
                session.id()
            );
            let mut getter = StoreGetter::new(session, config.path.clone());
            let summary = run_with(&mut getter, config.n, config.verbose, progress);
            if let Err(e) = getter.finish() {
                log::warn!("Failed to stop session: {e}");
            }
            summary
        }
        BackendKind::Restconf => {
            let mut getter = RestconfGetter::new(&config.restconf, &config.path)?;
            log::info!("Timing requests to {}", getter.url());
            run_with(&mut getter, config.n, config.verbose, progress)
        }
    }
}

/// Time `n` calls of `getter`, stopping at the first failure.
pub fn run_with<G: Getter + ?Sized>(
    getter: &mut G,
    n: usize,
    verbose: bool,
    progress: &ProgressContext,
) -> Result<Summary, BenchError> {
    let pb = progress.sample_bar(getter.label(), n as u64);
    let mut stats = StatAccumulator::new();
    let start = Instant::now();

    for _ in 0..n {
        let t0 = Instant::now();
        let response = getter.get()?;
        stats.include_duration(t0.elapsed());

        if verbose {
            log::info!("response:\n{response}");
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let elapsed = start.elapsed();
    log::debug!("{n} requests in {:.2}s", elapsed.as_secs_f64());

    Ok(Summary {
        label: getter.label().to_string(),
        stats,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Countdown {
        calls: usize,
        fail_at: Option<usize>,
    }

    impl Getter for Countdown {
        fn label(&self) -> &str {
            "fake"
        }

        fn get(&mut self) -> Result<String, BenchError> {
            self.calls += 1;
            if self.fail_at == Some(self.calls) {
                return Err(BenchError::Http {
                    status: Some(503),
                    message: "unavailable".into(),
                });
            }
            Ok(format!("call {}", self.calls))
        }
    }

    #[test]
    fn times_every_request() {
        let mut getter = Countdown {
            calls: 0,
            fail_at: None,
        };
        let summary = run_with(&mut getter, 25, false, &ProgressContext::hidden()).unwrap();
        assert_eq!(getter.calls, 25);
        assert_eq!(summary.stats.count(), 25);
        assert_eq!(summary.label, "fake");
        assert!(summary.line().unwrap().starts_with("--- fake 25 get_data: mean="));
    }

    #[test]
    fn first_failure_stops_the_loop() {
        let mut getter = Countdown {
            calls: 0,
            fail_at: Some(3),
        };
        let err = run_with(&mut getter, 10, true, &ProgressContext::hidden()).unwrap_err();
        assert_eq!(getter.calls, 3);
        assert!(matches!(err, BenchError::Http { status: Some(503), .. }));
    }

    #[test]
    fn zero_requests_cannot_summarise() {
        let mut getter = Countdown {
            calls: 0,
            fail_at: None,
        };
        let summary = run_with(&mut getter, 0, false, &ProgressContext::hidden()).unwrap();
        assert!(matches!(summary.line(), Err(BenchError::Stats(_))));
    }
}
