//! # vigil-scenario
//!
//! The scenario layer of the Vigil harness: the driver contract, the
//! polling reconciler, and the concrete end-to-end scenarios.
//!
//! Each scenario sequences one full run: precondition fetch, setup with a
//! deferred restore, concurrent subprocess execution under a shared
//! [`vigil_core::scope::Scope`], wait-for-all collection, assertions into
//! per-source outcome slots, and the final verdict reduction.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod driver;
pub mod poll;
pub mod record;
pub mod vlive;

pub use driver::{run_scenario, scenarios, Scenario, ScenarioEnv, ScenarioReport};
pub use record::RtmpRecord;
pub use vlive::{ExpectedCodec, VLivePublishProbe};
