//! # vigil-core
//!
//! Core orchestration primitives for the Vigil end-to-end scenario harness.
//!
//! This crate provides the building blocks every scenario is assembled from:
//!
//! - **Outcome Slots**: Write-once error cells, one per independent failure
//!   source, reduced to a single verdict at scenario end
//! - **Scope**: A cancellable, deadline-bounded execution scope shared by all
//!   tasks in one scenario run, with a typed cancellation cause
//! - **Teardown**: A last-registered-runs-first stack of deferred cleanup
//!   actions that execute on every exit path
//! - **Error Types**: The shared failure taxonomy and result alias
//!
//! ## Crate Boundary
//!
//! `vigil-core` knows nothing about HTTP, media tools, or concrete scenarios.
//! All cross-component interaction happens through the types defined here.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use vigil_core::outcome::OutcomeSet;
//! use vigil_core::scope::{CancelCause, Scope};
//!
//! # async fn example() -> vigil_core::error::Result<()> {
//! let scope = Scope::new(Duration::from_secs(60));
//! let outcomes = OutcomeSet::new(2);
//!
//! // ... run tasks, each owning one slot ...
//!
//! scope.cancel(CancelCause::Completed);
//! outcomes.verdict(&scope)
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod observability;
pub mod outcome;
pub mod scope;
pub mod teardown;

pub use error::{Error, Result};
pub use outcome::{OutcomeSet, OutcomeSlot};
pub use scope::{CancelCause, Scope};
pub use teardown::Teardown;
