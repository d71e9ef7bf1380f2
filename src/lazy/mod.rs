//! Single-slot, compute-once memoization.
//!
//! [`LazyValue`] is the one synchronization primitive the metadata model is
//! built on: every expensive derivation (artifact realization, collection
//! resolution) routes through a cell that computes its value exactly once,
//! no matter how many threads ask for it, and then serves that same outcome
//! forever. Failures are outcomes too - a failed computation is captured
//! once and re-raised identically to every current and future caller, never
//! retried.
//!
//! The cell is an explicit state machine:
//!
//! ```text
//! Pending(producer) --first finalize--> Computing(thread) --> Done
//! ```
//!
//! guarded by a [`Mutex`] and [`Condvar`]; the outcome itself lives in a
//! [`OnceLock`] so finalized values can be borrowed without holding a lock.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Condvar, Mutex, OnceLock};
use std::thread::{self, ThreadId};

use anyhow::anyhow;

use crate::core::SharedFailure;

type Producer<T> = Box<dyn FnOnce() -> anyhow::Result<T> + Send>;

enum Phase<T> {
    /// Not yet computed; holds the production function.
    Pending(Producer<T>),
    /// The producer is running on the given thread.
    Computing(ThreadId),
    /// The outcome has been stored.
    Done,
}

/// A thread-safe, compute-once memoization cell with a diagnostic description.
///
/// Constructed either around an eager value ([`LazyValue::finalized`]) or a
/// zero-argument production function ([`LazyValue::deferred`]). The
/// description names the value in panics, failures and log events.
///
/// # Concurrency
///
/// [`finalize_if_not_already`](Self::finalize_if_not_already) runs the
/// producer exactly once even under concurrent invocation; every other
/// caller blocks until the single computation completes, then observes the
/// identical outcome. No caller ever sees a partially-computed value.
///
/// A producer that transitively forces its own cell would otherwise block on
/// itself forever; that re-entrancy is detected by thread id and raised as a
/// cycle diagnostic, which the outer computation captures like any other
/// production failure.
pub struct LazyValue<T> {
    description: String,
    phase: Mutex<Phase<T>>,
    completed: Condvar,
    outcome: OnceLock<Result<T, SharedFailure>>,
}

impl<T> LazyValue<T> {
    /// Creates a cell that will run `producer` on first finalization.
    pub fn deferred(
        description: impl Into<String>,
        producer: impl FnOnce() -> anyhow::Result<T> + Send + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            phase: Mutex::new(Phase::Pending(Box::new(producer))),
            completed: Condvar::new(),
            outcome: OnceLock::new(),
        }
    }

    /// Creates an already-finalized cell holding `value`.
    pub fn finalized(description: impl Into<String>, value: T) -> Self {
        let outcome = OnceLock::new();
        if outcome.set(Ok(value)).is_err() {
            unreachable!("freshly created cell already held an outcome");
        }
        Self {
            description: description.into(),
            phase: Mutex::new(Phase::Done),
            completed: Condvar::new(),
            outcome,
        }
    }

    /// The diagnostic description this cell was created with.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether an outcome (value or failure) has been stored.
    pub fn is_finalized(&self) -> bool {
        self.outcome.get().is_some()
    }

    /// Computes the value if no outcome has been stored yet.
    ///
    /// Exactly one caller runs the producer; concurrent callers block until
    /// it completes. Returns the captured failure if the computation failed,
    /// now or on any earlier call.
    pub fn finalize_if_not_already(&self) -> Result<(), SharedFailure> {
        let mut phase = self.phase.lock().unwrap();
        loop {
            match &*phase {
                Phase::Done => {
                    drop(phase);
                    return self.stored_outcome();
                }
                Phase::Computing(owner) => {
                    if *owner == thread::current().id() {
                        // Forcing the cell from inside its own producer can
                        // never complete; fail loudly instead of deadlocking.
                        panic!(
                            "computation of '{}' depends on its own value",
                            self.description
                        );
                    }
                    phase = self.completed.wait(phase).unwrap();
                }
                Phase::Pending(_) => {
                    let previous =
                        std::mem::replace(&mut *phase, Phase::Computing(thread::current().id()));
                    let Phase::Pending(producer) = previous else {
                        unreachable!("phase changed while the lock was held");
                    };
                    drop(phase);
                    return self.compute(producer);
                }
            }
        }
    }

    /// Returns the memoized value.
    ///
    /// # Panics
    ///
    /// Panics if called before any successful finalization attempt; the
    /// operations of this crate finalize before getting, and external
    /// callers must do the same.
    pub fn get(&self) -> Result<&T, SharedFailure> {
        match self.outcome.get() {
            Some(Ok(value)) => Ok(value),
            Some(Err(failure)) => Err(failure.clone()),
            None => panic!("lazy value '{}' read before it was finalized", self.description),
        }
    }

    /// Finalizes if necessary, then returns the memoized value.
    pub fn force(&self) -> Result<&T, SharedFailure> {
        self.finalize_if_not_already()?;
        self.get()
    }

    fn compute(&self, producer: Producer<T>) -> Result<(), SharedFailure> {
        tracing::trace!(value = %self.description, "computing lazy value");
        let outcome = match panic::catch_unwind(AssertUnwindSafe(producer)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => {
                tracing::debug!(value = %self.description, error = %error, "lazy computation failed");
                Err(SharedFailure::new(error))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::debug!(value = %self.description, panic = %message, "lazy computation panicked");
                Err(SharedFailure::new(anyhow!(
                    "computation of '{}' panicked: {message}",
                    self.description
                )))
            }
        };
        let failure = outcome.as_ref().err().cloned();
        if self.outcome.set(outcome).is_err() {
            unreachable!("lazy value '{}' computed twice", self.description);
        }
        let mut phase = self.phase.lock().unwrap();
        *phase = Phase::Done;
        self.completed.notify_all();
        drop(phase);
        match failure {
            None => Ok(()),
            Some(failure) => Err(failure),
        }
    }

    fn stored_outcome(&self) -> Result<(), SharedFailure> {
        match self.outcome.get() {
            Some(Ok(_)) => Ok(()),
            Some(Err(failure)) => Err(failure.clone()),
            None => unreachable!("phase is Done but no outcome was stored"),
        }
    }
}

impl<T> fmt::Debug for LazyValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.outcome.get() {
            Some(Ok(_)) => "finalized",
            Some(Err(_)) => "failed",
            None => "pending",
        };
        f.debug_struct("LazyValue")
            .field("description", &self.description)
            .field("state", &state)
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier, Weak};
    use std::time::Duration;

    #[test]
    fn test_finalized_cell_serves_value_immediately() {
        let cell = LazyValue::finalized("eager", 7);
        assert!(cell.is_finalized());
        assert_eq!(*cell.get().unwrap(), 7);
        // Finalizing an eager cell is a no-op.
        cell.finalize_if_not_already().unwrap();
        assert_eq!(*cell.get().unwrap(), 7);
    }

    #[test]
    fn test_producer_runs_once_across_repeated_calls() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&runs);
        let cell = LazyValue::deferred("counted", move || {
            counted.fetch_add(1, Ordering::SeqCst);
            Ok(99)
        });

        for _ in 0..5 {
            cell.finalize_if_not_already().unwrap();
            assert_eq!(*cell.get().unwrap(), 99);
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_finalize_computes_once() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&runs);
        let cell = Arc::new(LazyValue::deferred("contended", move || {
            counted.fetch_add(1, Ordering::SeqCst);
            // Widen the race window so other threads pile up on the condvar.
            std::thread::sleep(Duration::from_millis(20));
            Ok(1234)
        }));

        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let cell = Arc::clone(&cell);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    cell.finalize_if_not_already().unwrap();
                    *cell.get().unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1234);
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_captured_once_and_shared() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&runs);
        let cell: LazyValue<u32> = LazyValue::deferred("doomed", move || {
            counted.fetch_add(1, Ordering::SeqCst);
            Err(anyhow!("no such artifact"))
        });

        let first = cell.finalize_if_not_already().unwrap_err();
        let second = cell.finalize_if_not_already().unwrap_err();
        let from_get = cell.get().unwrap_err();
        assert_eq!(first.to_string(), "no such artifact");
        assert_eq!(second.to_string(), "no such artifact");
        assert_eq!(from_get.to_string(), "no such artifact");
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_failure_observed_identically() {
        let cell: Arc<LazyValue<u32>> =
            Arc::new(LazyValue::deferred("shared failure", || Err(anyhow!("backend down"))));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cell = Arc::clone(&cell);
                std::thread::spawn(move || cell.finalize_if_not_already().unwrap_err().to_string())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), "backend down");
        }
    }

    #[test]
    fn test_producer_panic_becomes_shared_failure() {
        let cell: LazyValue<u32> = LazyValue::deferred("explosive", || panic!("kaboom"));
        let failure = cell.finalize_if_not_already().unwrap_err();
        assert!(failure.to_string().contains("panicked"));
        assert!(failure.to_string().contains("kaboom"));
        // Later callers get the captured failure, not a rerun.
        assert!(cell.get().is_err());
    }

    #[test]
    #[should_panic(expected = "read before it was finalized")]
    fn test_get_before_finalize_panics() {
        let cell: LazyValue<u32> = LazyValue::deferred("untouched", || Ok(1));
        let _ = cell.get();
    }

    #[test]
    fn test_self_referential_producer_is_a_cycle_failure() {
        let cell = Arc::new_cyclic(|weak: &Weak<LazyValue<u32>>| {
            let weak = weak.clone();
            LazyValue::deferred("self-referential", move || {
                let cell = weak.upgrade().expect("cell still alive");
                let value = cell.force().map(|value| *value)?;
                Ok(value)
            })
        });
        let failure = cell.finalize_if_not_already().unwrap_err();
        assert!(failure.to_string().contains("depends on its own value"));
    }
}
