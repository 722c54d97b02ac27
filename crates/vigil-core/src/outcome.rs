//! Write-once outcome slots and verdict reduction.
//!
//! A scenario holds a fixed-length, ordered collection of outcome cells, one
//! per independent failure source (setup, each subprocess task, each
//! assertion). Each cell is written by at most one owner, so no lock is
//! needed; contention is designed away rather than synchronized away. An
//! unset cell means success.
//!
//! The [`OutcomeSet::verdict`] reduction is the only place multiple outcomes
//! become one pass/fail judgment, and it reports every recorded cause, not
//! just the first.

use std::sync::{Arc, OnceLock};

use crate::error::{Error, Result};
use crate::scope::Scope;

/// A fixed-size, ordered collection of write-once outcome cells.
#[derive(Debug, Clone)]
pub struct OutcomeSet {
    slots: Arc<[OnceLock<Error>]>,
}

/// A handle to one cell of an [`OutcomeSet`], owned by a single writer.
#[derive(Debug, Clone)]
pub struct OutcomeSlot {
    slots: Arc<[OnceLock<Error>]>,
    index: usize,
}

impl OutcomeSet {
    /// Creates a set with `len` unset cells.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| OnceLock::new()).collect(),
        }
    }

    /// Returns the handle for the cell at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range; slot indices are fixed at scenario
    /// design time.
    #[must_use]
    pub fn slot(&self, index: usize) -> OutcomeSlot {
        assert!(index < self.slots.len(), "outcome slot {index} out of range");
        OutcomeSlot {
            slots: Arc::clone(&self.slots),
            index,
        }
    }

    /// Number of cells that have recorded an error.
    #[must_use]
    pub fn recorded(&self) -> usize {
        self.slots.iter().filter(|slot| slot.get().is_some()).count()
    }

    /// Reduces every cell plus the scope's terminal state to one verdict.
    ///
    /// The scenario fails if the scope expired for an unexpected reason
    /// (deadline, abort) or any cell recorded an error. A scope cancelled
    /// with [`crate::scope::CancelCause::Completed`] contributes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Aggregate`] enumerating every contributing cause, in
    /// scope-then-slot order.
    pub fn verdict(&self, scope: &Scope) -> Result<()> {
        let mut causes = Vec::new();
        if let Some(err) = scope.terminal_error() {
            causes.push(err.to_string());
        }
        for slot in self.slots.iter() {
            if let Some(err) = slot.get() {
                causes.push(err.to_string());
            }
        }
        if causes.is_empty() {
            Ok(())
        } else {
            Err(Error::Aggregate { causes })
        }
    }
}

impl OutcomeSlot {
    /// Records a terminal outcome into this cell.
    ///
    /// At most one write takes effect; a second write is logged and dropped
    /// so a task can never report more than one outcome.
    pub fn record(&self, err: Error) {
        if let Err(err) = self.slots[self.index].set(err) {
            tracing::warn!(slot = self.index, %err, "dropping second outcome for slot");
        }
    }

    /// Records the error of a failed result, passing successes through.
    pub fn capture<T>(&self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.record(err);
                None
            }
        }
    }

    /// Like [`Self::capture`], but drops cancellation and deadline errors.
    ///
    /// Work interrupted by the shared scope fails with the scope's terminal
    /// error; the verdict reduction already reports that once, so echoing it
    /// through a slot would double-count a single cause.
    pub fn capture_scoped<T>(&self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(Error::Cancelled { .. } | Error::DeadlineExceeded { .. }) => None,
            Err(err) => {
                self.record(err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::scope::CancelCause;
    use std::time::Duration;

    #[tokio::test]
    async fn unset_slots_mean_success() {
        let scope = Scope::new(Duration::from_secs(60));
        let outcomes = OutcomeSet::new(4);
        scope.cancel(CancelCause::Completed);
        assert!(outcomes.verdict(&scope).is_ok());
    }

    #[tokio::test]
    async fn first_write_wins_and_second_is_dropped() {
        let outcomes = OutcomeSet::new(1);
        let slot = outcomes.slot(0);
        slot.record(Error::assertion("first"));
        slot.record(Error::assertion("second"));
        assert_eq!(outcomes.recorded(), 1);

        let scope = Scope::new(Duration::from_secs(60));
        scope.cancel(CancelCause::Completed);
        let err = outcomes.verdict(&scope).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("first"));
        assert!(!msg.contains("second"));
    }

    #[tokio::test]
    async fn verdict_enumerates_all_recorded_causes() {
        let outcomes = OutcomeSet::new(3);
        outcomes.slot(0).record(Error::assertion("invalid streams=1"));
        outcomes.slot(2).record(Error::assertion("low score=85 < 90"));

        let scope = Scope::new(Duration::from_secs(60));
        scope.cancel(CancelCause::Completed);
        let msg = outcomes.verdict(&scope).unwrap_err().to_string();
        assert!(msg.contains("2 failure cause(s)"));
        assert!(msg.contains("invalid streams"));
        assert!(msg.contains("low score"));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expiry_fails_even_with_clean_slots() {
        let scope = Scope::new(Duration::from_millis(10));
        scope.cancelled().await;
        let outcomes = OutcomeSet::new(2);
        let msg = outcomes.verdict(&scope).unwrap_err().to_string();
        assert!(msg.contains("deadline exceeded"));
    }

    #[tokio::test]
    async fn concurrent_writers_never_tear_a_slot() {
        let outcomes = OutcomeSet::new(2);
        let mut handles = Vec::new();
        for index in 0..2 {
            let slot = outcomes.slot(index);
            handles.push(tokio::spawn(async move {
                slot.record(Error::subprocess("publisher", format!("task {index}")));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(outcomes.recorded(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn capture_scoped_drops_scope_echoes() {
        let scope = Scope::new(Duration::from_millis(10));
        scope.cancelled().await;

        let outcomes = OutcomeSet::new(1);
        let slot = outcomes.slot(0);
        slot.capture_scoped::<()>(Err(scope.terminal_error().unwrap()));
        assert_eq!(outcomes.recorded(), 0);

        // The deadline still fails the verdict, reported exactly once.
        let msg = outcomes.verdict(&scope).unwrap_err().to_string();
        assert!(msg.contains("1 failure cause(s)"));
    }

    #[tokio::test]
    async fn capture_records_only_failures() {
        let outcomes = OutcomeSet::new(1);
        let slot = outcomes.slot(0);
        assert_eq!(slot.capture(Ok(5)), Some(5));
        assert_eq!(slot.capture::<u32>(Err(Error::parse("bad json"))), None);
        assert_eq!(outcomes.recorded(), 1);
    }
}
