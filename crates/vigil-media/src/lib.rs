//! # vigil-media
//!
//! Subprocess task runners for the Vigil scenario harness.
//!
//! Wraps the external media tools as units of concurrent work:
//!
//! - [`Publisher`]: an ffmpeg-style process pushing a stream until killed
//! - [`Prober`]: an ffprobe-style process capturing and analyzing a stream,
//!   with a completion signal independent of the scenario scope
//! - [`ProbeReport`]: the structured metadata parsed from prober output
//! - [`staging`]: input file placement into candidate upload directories
//!
//! Each runner starts its process, runs until natural completion or scope
//! cancellation, and reports exactly one terminal outcome.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod prober;
pub mod publisher;
pub mod report;
pub mod staging;

pub use prober::{ProbeCapture, Prober};
pub use publisher::Publisher;
pub use report::{ProbeFormat, ProbeReport, ProbeStream};
