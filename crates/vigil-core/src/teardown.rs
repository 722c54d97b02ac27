//! Deferred teardown stack.
//!
//! Scenarios mutate shared platform configuration during setup and must
//! restore it on every exit path, even after the scenario's own scope has
//! expired. Actions are pushed at registration time and drained strictly
//! last-registered-first at scenario end. They deliberately do not take the
//! scenario scope: cleanup runs on a fresh, never-cancelled footing.
//!
//! Teardown failures are logged, never propagated; by the time cleanup runs
//! every outcome has already been recorded.

use std::future::Future;
use std::pin::Pin;

use crate::error::Result;

type Action = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// A stack of deferred async cleanup actions.
#[derive(Default)]
pub struct Teardown {
    actions: Vec<(String, Action)>,
}

impl Teardown {
    /// Creates an empty teardown stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a cleanup action. Actions run in reverse registration
    /// order: the earliest-registered restore runs last.
    pub fn push<F>(&mut self, label: impl Into<String>, action: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.actions.push((label.into(), Box::pin(action)));
    }

    /// Number of registered actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns true if no actions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Drains the stack, running every action last-registered-first.
    pub async fn run(mut self) {
        while let Some((label, action)) = self.actions.pop() {
            tracing::debug!(%label, "running teardown action");
            if let Err(err) = action.await {
                tracing::warn!(%label, %err, "teardown action failed");
            }
        }
    }
}

impl std::fmt::Debug for Teardown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Teardown")
            .field("actions", &self.actions.len())
            .finish()
    }
}
