//! Deadline-bounded, cancellable execution scope.
//!
//! A [`Scope`] is shared by every task in one scenario run. It combines a
//! wall-clock budget with a broadcast cancellation signal and a write-once,
//! typed cancellation cause. The cause is set explicitly by whoever cancels;
//! it is never inferred from which task happened to trigger the cancel, so
//! "cancelled because we finished" and "cancelled because we ran out of time"
//! stay distinguishable.

use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Why a scope was cancelled.
///
/// Cancellation is monotonic and the cause is write-once: the first recorded
/// cause wins, later cancels are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCause {
    /// The driver cancelled as part of normal successful shutdown, e.g. the
    /// prober finished naturally and sibling tasks should wind down.
    Completed,
    /// The wall-clock budget elapsed.
    Deadline,
    /// The scope was cancelled for a reason other than completion or the
    /// deadline, e.g. operator interrupt.
    Aborted,
}

/// A cancellable, deadline-bearing execution scope.
///
/// Every blocking wait inside a scenario must select between its own work and
/// [`Scope::cancelled`]; nothing may block past cancellation. Share across
/// tasks with [`Arc`].
#[derive(Debug)]
pub struct Scope {
    token: CancellationToken,
    deadline: Instant,
    budget: Duration,
    cause: Arc<OnceLock<CancelCause>>,
    watchdog: JoinHandle<()>,
}

impl Scope {
    /// Creates a scope with the given total wall-clock budget.
    ///
    /// A watchdog task cancels the scope with [`CancelCause::Deadline`] when
    /// the budget elapses. Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(budget: Duration) -> Self {
        let token = CancellationToken::new();
        let cause = Arc::new(OnceLock::new());
        let deadline = Instant::now() + budget;

        let watchdog = tokio::spawn({
            let token = token.clone();
            let cause = Arc::clone(&cause);
            async move {
                tokio::time::sleep_until(deadline).await;
                let _ = cause.set(CancelCause::Deadline);
                token.cancel();
            }
        });

        Self {
            token,
            deadline,
            budget,
            cause,
            watchdog,
        }
    }

    /// Cancels the scope with the given cause.
    ///
    /// Idempotent: the first recorded cause wins and the signal never
    /// reverts. Propagates to every derived child token.
    pub fn cancel(&self, cause: CancelCause) {
        let _ = self.cause.set(cause);
        self.token.cancel();
    }

    /// Completes when the scope is cancelled, by any cause.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Returns true once the scope has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Remaining wall-clock budget, zero once the deadline has passed.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// The recorded cancellation cause, if the scope has been cancelled.
    #[must_use]
    pub fn cause(&self) -> Option<CancelCause> {
        self.cause.get().copied()
    }

    /// Derives a child token that observes this scope's cancellation.
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// The scope's terminal error, if its cancellation counts as a failure.
    ///
    /// Returns `None` while the scope is live and for a scope cancelled with
    /// [`CancelCause::Completed`]; a completion-cancel is a success signal,
    /// not a failure.
    #[must_use]
    pub fn terminal_error(&self) -> Option<Error> {
        if !self.token.is_cancelled() {
            return None;
        }
        match self.cause.get() {
            Some(CancelCause::Completed) => None,
            Some(CancelCause::Deadline) => Some(Error::DeadlineExceeded {
                budget: self.budget,
            }),
            Some(CancelCause::Aborted) | None => Some(Error::cancelled("scope aborted")),
        }
    }

    /// Runs a fallible future, short-circuiting if the scope is cancelled
    /// first.
    ///
    /// # Errors
    ///
    /// Returns the future's own error, or the scope's terminal error when
    /// cancellation wins the race. A completion-cancel still interrupts the
    /// work and surfaces as [`Error::Cancelled`].
    pub async fn guard<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(self
                .terminal_error()
                .unwrap_or_else(|| Error::cancelled("scope cancelled during request"))),
            res = fut => res,
        }
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.watchdog.abort();
    }
}
