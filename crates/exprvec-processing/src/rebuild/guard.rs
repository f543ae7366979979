use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;

use exprvec_core::ExperimentId;

/// Per-experiment mutual exclusion for rebuilds.
///
/// Rebuilds of one experiment serialize; different experiments never
/// contend. A second caller blocks until the first finishes.
#[derive(Debug, Default)]
pub struct RebuildGuards {
    locks: DashMap<ExperimentId, Arc<Mutex<()>>>,
}

impl RebuildGuards {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, experiment: ExperimentId) -> Arc<Mutex<()>> {
        self.locks
            .entry(experiment)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `f` while holding the lock for `experiment`, blocking until any
    /// other holder finishes.
    pub fn exclusive<R>(&self, experiment: ExperimentId, f: impl FnOnce() -> R) -> R {
        let lock = self.lock_for(experiment);
        let result = {
            // A panicked rebuild leaves no shared state behind the mutex.
            let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        drop(lock);
        self.release(experiment);
        result
    }

    /// Forget the experiment's lock once no caller holds or awaits it.
    fn release(&self, experiment: ExperimentId) {
        self.locks
            .remove_if(&experiment, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Whether a rebuild of `experiment` is currently running.
    pub fn is_running(&self, experiment: ExperimentId) -> bool {
        let Some(lock) = self.locks.get(&experiment).map(|l| Arc::clone(&l)) else {
            return false;
        };
        let running = lock.try_lock().is_err();
        running
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn same_experiment_serializes() {
        let guards = Arc::new(RebuildGuards::new());
        let active = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let guards = Arc::clone(&guards);
                let active = Arc::clone(&active);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    guards.exclusive(ExperimentId(7), || {
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(5));
                        active.fetch_sub(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn different_experiments_do_not_contend() {
        let guards = RebuildGuards::new();
        guards.exclusive(ExperimentId(1), || {
            assert!(guards.is_running(ExperimentId(1)));
            assert!(!guards.is_running(ExperimentId(2)));
            guards.exclusive(ExperimentId(2), || {
                assert!(guards.is_running(ExperimentId(2)));
            });
        });
        assert!(!guards.is_running(ExperimentId(1)));
    }

    #[test]
    fn released_locks_are_forgotten() {
        let guards = Arc::new(RebuildGuards::new());
        for id in 0..50 {
            guards.exclusive(ExperimentId(id), || ());
        }
        assert!(guards.locks.is_empty());

        let waiting = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let guards = Arc::clone(&guards);
                let waiting = Arc::clone(&waiting);
                thread::spawn(move || {
                    guards.exclusive(ExperimentId(1), || {
                        waiting.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(2));
                    })
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(waiting.load(Ordering::SeqCst), 4);
        assert!(guards.locks.is_empty());
    }

    #[test]
    fn panicking_holder_does_not_wedge_the_experiment() {
        let guards = Arc::new(RebuildGuards::new());
        let g = Arc::clone(&guards);
        let _ = thread::spawn(move || g.exclusive(ExperimentId(3), || panic!("boom"))).join();
        assert_eq!(guards.exclusive(ExperimentId(3), || 42), 42);
    }
}
