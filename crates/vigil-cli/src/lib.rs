//! # vigil-cli
//!
//! Command-line runner for the Vigil end-to-end scenario harness.
//!
//! ## Usage
//!
//! - `vigil --list` - List known scenarios
//! - `vigil` - Run every scenario against a local platform
//! - `vigil rtmp_record` - Run only the named scenarios
//!
//! ## Configuration
//!
//! The CLI uses environment variables or command-line flags for settings:
//!
//! - `VIGIL_API_URL` - Control API endpoint (default: `http://localhost:2022`)
//! - `VIGIL_RTMP_URL` - Publish endpoint (default: `rtmp://localhost/live`)
//! - `VIGIL_HTTP_URL` - Playback endpoint (default: `http://localhost:8080`)
//! - `VIGIL_INPUT_FILE` - Media fixture published by the scenarios

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
// CLI uses print! macros intentionally
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use vigil_api::ApiClient;
use vigil_scenario::ScenarioEnv;

/// Vigil - end-to-end scenario runner for a live-media platform.
#[derive(Debug, Parser)]
#[command(name = "vigil")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Control API endpoint.
    #[arg(long, env = "VIGIL_API_URL", default_value = "http://localhost:2022")]
    pub api_url: String,

    /// RTMP publish endpoint.
    #[arg(long, env = "VIGIL_RTMP_URL", default_value = "rtmp://localhost/live")]
    pub rtmp_url: String,

    /// HTTP playback endpoint.
    #[arg(long, env = "VIGIL_HTTP_URL", default_value = "http://localhost:8080")]
    pub http_url: String,

    /// Media fixture the scenarios publish.
    #[arg(
        long,
        env = "VIGIL_INPUT_FILE",
        default_value = "source.200kbps.768x320.flv"
    )]
    pub input_file: PathBuf,

    /// Wall-clock budget for ordinary scenarios, in seconds.
    #[arg(long, default_value_t = 60)]
    pub timeout: u64,

    /// Wall-clock budget for long scenarios, in seconds.
    #[arg(long, default_value_t = 180)]
    pub long_timeout: u64,

    /// Skip the strict codec validation of the staged fixture, for input
    /// files other than the canonical one.
    #[arg(long, env = "VIGIL_ANY_INPUT")]
    pub any_input: bool,

    /// List known scenarios and exit.
    #[arg(long)]
    pub list: bool,

    /// Scenario names to run; all of them when empty.
    pub scenarios: Vec<String>,
}

impl Cli {
    /// Builds the shared scenario environment from the parsed flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the API client cannot be constructed.
    pub fn env(&self) -> anyhow::Result<ScenarioEnv> {
        let api = ApiClient::new(&self.api_url)
            .with_context(|| format!("create API client for {}", self.api_url))?;
        Ok(ScenarioEnv {
            api,
            rtmp_url: self.rtmp_url.clone(),
            http_url: self.http_url.clone(),
            input_file: self.input_file.clone(),
            upload_dirs: upload_dirs(),
            timeout: Duration::from_secs(self.timeout),
            long_timeout: Duration::from_secs(self.long_timeout),
            probe_duration: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(45),
            record_wait: Duration::from_secs(25),
            poll_attempts: 60,
            poll_interval: Duration::from_secs(1),
            publisher_binary: "ffmpeg".to_string(),
            prober_binary: "ffprobe".to_string(),
            vlive_platform: "virtual".to_string(),
            expected_codec: (!self.any_input).then(vigil_scenario::ExpectedCodec::default),
            stream_id: None,
        })
    }

    /// Returns true if the named scenario was selected.
    #[must_use]
    pub fn selected(&self, name: &str) -> bool {
        self.scenarios.is_empty() || self.scenarios.iter().any(|s| s == name)
    }
}

/// Candidate upload directories, covering a containerized platform and a
/// platform started from the repository root or a sibling checkout.
fn upload_dirs() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/data/upload"),
        PathBuf::from("platform/containers/data/upload"),
        PathBuf::from("../platform/containers/data/upload"),
    ]
}
