//! Keep the seeded session from being reclaimed while idle

use std::time::Duration;

use opseed_store::Session;

use crate::stop::StopSignal;

/// Counters from one keep-alive run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeepAliveStats {
    /// Intervals that elapsed without a stop request
    pub ticks: u64,
    /// Keep-alive calls the store answered with an error
    pub failures: u64,
}

/// Keep-alive loop settings.
#[derive(Debug, Clone, Copy)]
pub struct KeepAlive {
    interval: Duration,
    heartbeat_every: u64,
}

impl KeepAlive {
    pub fn new(interval: Duration, heartbeat_every: u64) -> Self {
        Self {
            interval,
            heartbeat_every: heartbeat_every.max(1),
        }
    }

    /// Run until `stop` is requested.
    ///
    /// Store errors are reported and the loop carries on; only the stop
    /// request ends it.
    pub fn run<S: Session>(&self, session: &S, stop: &StopSignal) -> KeepAliveStats {
        let mut stats = KeepAliveStats::default();
        let mut outage = false;

        while !stop.wait_timeout(self.interval) {
            if stats.ticks % self.heartbeat_every == 0 {
                log::debug!("keeping session {} alive", session.id());
            }
            stats.ticks += 1;

            match session.keepalive() {
                Ok(()) if outage => {
                    log::info!("session {} reachable again", session.id());
                    outage = false;
                }
                Ok(()) => {}
                Err(e) => {
                    stats.failures += 1;
                    // warn on the first failure of an outage, then per heartbeat
                    if !outage || stats.ticks % self.heartbeat_every == 0 {
                        log::warn!(
                            "keep-alive on session {} failed ({} so far): {e}",
                            session.id(),
                            stats.failures
                        );
                    }
                    outage = true;
                }
            }
        }

        log::debug!(
            "keep-alive stopped after {} ticks ({} failures)",
            stats.ticks,
            stats.failures
        );
        stats
    }
}

impl Default for KeepAlive {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opseed_store::{Datastore, DatastoreKind, Fault, MemoryStore, StoreEvent};
    use std::time::Instant;

    fn keepalive_events(store: &MemoryStore) -> Vec<bool> {
        store
            .events()
            .into_iter()
            .filter_map(|e| match e {
                StoreEvent::KeepAlive { ok, .. } => Some(ok),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn pings_until_stopped() {
        let store = MemoryStore::new();
        let sess = store.start_session(DatastoreKind::Operational).unwrap();
        let stop = StopSignal::new();

        let remote = stop.clone();
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(120));
            remote.request_stop();
        });

        let stats = KeepAlive::new(Duration::from_millis(10), 5).run(&sess, &stop);
        stopper.join().unwrap();

        assert!(stats.ticks >= 3, "ticks: {}", stats.ticks);
        assert_eq!(stats.failures, 0);
        assert_eq!(keepalive_events(&store).len() as u64, stats.ticks);
    }

    #[test]
    fn failures_do_not_end_the_loop() {
        let store = MemoryStore::new();
        store.inject(Fault::KeepAliveOutage(3));
        let sess = store.start_session(DatastoreKind::Operational).unwrap();
        let stop = StopSignal::new();

        let remote = stop.clone();
        let watcher = store.clone();
        let stopper = std::thread::spawn(move || {
            // stop only once the store has answered OK again
            while !keepalive_events(&watcher).contains(&true) {
                std::thread::sleep(Duration::from_millis(5));
            }
            remote.request_stop();
        });

        let stats = KeepAlive::new(Duration::from_millis(5), 60).run(&sess, &stop);
        stopper.join().unwrap();

        assert_eq!(stats.failures, 3);
        assert!(stats.ticks >= 4);
        assert_eq!(&keepalive_events(&store)[..4], &[false, false, false, true]);
    }

    #[test]
    fn stop_before_start_exits_without_ticks() {
        let store = MemoryStore::new();
        let sess = store.start_session(DatastoreKind::Operational).unwrap();
        let stop = StopSignal::new();
        stop.request_stop();

        let start = Instant::now();
        let stats = KeepAlive::new(Duration::from_secs(10), 60).run(&sess, &stop);
        assert_eq!(stats, KeepAliveStats::default());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn heartbeat_every_zero_is_clamped() {
        assert_eq!(KeepAlive::new(Duration::from_secs(1), 0).heartbeat_every, 1);
    }
}
