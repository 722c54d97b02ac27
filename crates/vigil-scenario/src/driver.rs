//! Scenario contract and runner.
//!
//! A scenario is one precondition → setup → execution → collection →
//! assertion → verdict sequence. The driver here owns only the outer frame:
//! naming, timing, span, and the report a CI-style runner consumes. The
//! state machine itself lives in each scenario's `drive`.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::Instrument;
use uuid::Uuid;

use vigil_api::ApiClient;
use vigil_core::error::Result;
use vigil_core::observability::scenario_span;

/// Shared environment every scenario runs against.
#[derive(Debug, Clone)]
pub struct ScenarioEnv {
    /// Control API client.
    pub api: ApiClient,
    /// Base publish endpoint, e.g. `rtmp://localhost/live`.
    pub rtmp_url: String,
    /// Base playback endpoint, e.g. `http://localhost:8080`.
    pub http_url: String,
    /// Input media file staged as the publish/virtual-live source.
    pub input_file: PathBuf,
    /// Candidate upload directories, tried in order.
    pub upload_dirs: Vec<PathBuf>,
    /// Wall-clock budget for ordinary scenarios.
    pub timeout: Duration,
    /// Wall-clock budget for long scenarios (record).
    pub long_timeout: Duration,
    /// Requested probe capture duration.
    pub probe_duration: Duration,
    /// Internal prober timeout.
    pub probe_timeout: Duration,
    /// How long the record worker accumulates before being stopped.
    pub record_wait: Duration,
    /// Attempt budget for record-file polling.
    pub poll_attempts: u32,
    /// Sleep between polling attempts.
    pub poll_interval: Duration,
    /// Publisher binary, `ffmpeg` unless overridden.
    pub publisher_binary: String,
    /// Prober binary, `ffprobe` unless overridden.
    pub prober_binary: String,
    /// Virtual-live platform key in the stream configuration.
    pub vlive_platform: String,
    /// Expected codec metadata for the canonical input file; `None` skips
    /// the detailed codec validation.
    pub expected_codec: Option<crate::vlive::ExpectedCodec>,
    /// Fixed stream id override, mainly for tests; generated when `None`.
    pub stream_id: Option<String>,
}

impl ScenarioEnv {
    /// The stream id for one scenario run: the override, or a fresh
    /// `stream-<uuid>` name that cannot collide across concurrent runs.
    #[must_use]
    pub fn stream_id(&self) -> String {
        self.stream_id
            .clone()
            .unwrap_or_else(|| format!("stream-{}", Uuid::new_v4().simple()))
    }

    /// Publish URL for a stream.
    #[must_use]
    pub fn publish_url(&self, stream_id: &str, secret: &str) -> String {
        format!(
            "{}/{stream_id}?secret={secret}",
            self.rtmp_url.trim_end_matches('/')
        )
    }

    /// HTTP-FLV playback URL for a stream.
    #[must_use]
    pub fn play_url(&self, stream_id: &str) -> String {
        format!(
            "{}/live/{stream_id}.flv",
            self.http_url.trim_end_matches('/')
        )
    }
}

/// Publisher arguments: loop the input file endlessly, copy codecs, push as
/// FLV to the publish URL.
#[must_use]
pub(crate) fn loop_publish_args(input: &Path, publish_url: &str) -> Vec<String> {
    let input = input.to_string_lossy();
    [
        "-re",
        "-stream_loop",
        "-1",
        "-i",
        input.as_ref(),
        "-c",
        "copy",
        "-f",
        "flv",
        publish_url,
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

/// One end-to-end test scenario.
#[async_trait]
pub trait Scenario: Send + Sync {
    /// Stable scenario name, used for filtering and reporting.
    fn name(&self) -> &'static str;

    /// Runs the scenario to its verdict.
    ///
    /// # Errors
    ///
    /// Returns an aggregated error enumerating every concurrent failure
    /// cause when the scenario fails.
    async fn run(&self, env: &ScenarioEnv) -> Result<()>;
}

/// The result of one scenario run, as consumed by a CI-style runner.
#[derive(Debug)]
pub struct ScenarioReport {
    /// Scenario name.
    pub name: &'static str,
    /// Wall-clock time the run took.
    pub elapsed: Duration,
    /// Pass, or the aggregated failure causes.
    pub verdict: Result<()>,
}

impl ScenarioReport {
    /// Returns true if the scenario passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.verdict.is_ok()
    }
}

/// Runs one scenario under its span and reports the outcome.
pub async fn run_scenario(scenario: &dyn Scenario, env: &ScenarioEnv) -> ScenarioReport {
    let name = scenario.name();
    let started = Instant::now();
    let verdict = scenario.run(env).instrument(scenario_span(name)).await;
    let elapsed = started.elapsed();
    match &verdict {
        Ok(()) => tracing::info!(name, ?elapsed, "scenario passed"),
        Err(err) => tracing::error!(name, ?elapsed, %err, "scenario failed"),
    }
    ScenarioReport {
        name,
        elapsed,
        verdict,
    }
}

/// Every scenario the harness knows, in execution order.
#[must_use]
pub fn scenarios() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(crate::vlive::VLivePublishProbe),
        Box::new(crate::record::RtmpRecord),
    ]
}
