//! # vigil-api
//!
//! HTTP client for the streaming platform's control API.
//!
//! The harness drives the system under test exclusively through this API:
//! fetching the publish secret, toggling the virtual-live and record
//! features, listing produced record files, and removing artifacts. All
//! endpoints speak JSON wrapped in the platform envelope
//! `{ "code": 0, "data": ... }`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod types;

pub use client::ApiClient;
pub use types::{AudioCodec, RecordFile, SourceCodec, UploadedFile, VideoCodec};
