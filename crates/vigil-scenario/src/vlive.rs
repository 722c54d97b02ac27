//! Virtual-live publish + probe scenario.
//!
//! Stages the input file as a virtual-live source, enables the feature with
//! a generated stream id, then runs a publisher and a prober concurrently
//! under the shared scope. The prober's natural completion force-cancels the
//! scope so the publisher winds down promptly; the driver then waits for
//! both tasks before asserting on the probe metadata.
//!
//! The enabled virtual-live worker republishes to a derived stream id so it
//! never collides with the scenario's own publisher. Its output is not
//! probed: the worker's ingest of the staged source is verified through the
//! codec metadata returned on attach, and the probe budget goes to the
//! publish/play path the scenario publisher exercises while the worker runs
//! alongside.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use vigil_api::{SourceCodec, UploadedFile};
use vigil_core::error::{Error, Result};
use vigil_core::outcome::OutcomeSet;
use vigil_core::scope::{CancelCause, Scope};
use vigil_core::teardown::Teardown;
use vigil_media::{staging, Prober, Publisher};

use crate::driver::{loop_publish_args, Scenario, ScenarioEnv};

// One outcome slot per independent failure source.
const SLOT_CONTROL: usize = 0;
const SLOT_PUBLISHER: usize = 1;
const SLOT_PROBER: usize = 2;
const SLOT_STREAMS: usize = 3;
const SLOT_SCORE: usize = 4;
const SLOT_DURATION: usize = 5;
const SLOT_COUNT: usize = 6;

const EXPECTED_STREAMS: usize = 2;
const MIN_PROBE_SCORE: i64 = 90;

/// Codec metadata the platform must detect for the canonical input file.
#[derive(Debug, Clone)]
pub struct ExpectedCodec {
    /// Audio codec short name.
    pub audio_codec: String,
    /// Audio channel count.
    pub audio_channels: u32,
    /// Audio sample rate.
    pub audio_sample_rate: String,
    /// Video codec short name.
    pub video_codec: String,
    /// Video codec profile.
    pub video_profile: String,
    /// Frame width.
    pub video_width: u32,
    /// Frame height.
    pub video_height: u32,
}

impl Default for ExpectedCodec {
    /// The canonical 768x320 AAC/H.264 test fixture.
    fn default() -> Self {
        Self {
            audio_codec: "aac".to_string(),
            audio_channels: 2,
            audio_sample_rate: "44100".to_string(),
            video_codec: "h264".to_string(),
            video_profile: "High".to_string(),
            video_width: 768,
            video_height: 320,
        }
    }
}

/// The virtual-live publish + probe scenario.
#[derive(Debug, Default)]
pub struct VLivePublishProbe;

#[async_trait]
impl Scenario for VLivePublishProbe {
    fn name(&self) -> &'static str {
        "vlive_publish_probe"
    }

    async fn run(&self, env: &ScenarioEnv) -> Result<()> {
        let scope = Arc::new(Scope::new(env.timeout));
        let outcomes = OutcomeSet::new(SLOT_COUNT);
        let mut teardown = Teardown::new();
        Self::drive(env, &scope, &outcomes, &mut teardown).await;
        teardown.run().await;
        outcomes.verdict(&scope)
    }
}

impl VLivePublishProbe {
    async fn drive(
        env: &ScenarioEnv,
        scope: &Arc<Scope>,
        outcomes: &OutcomeSet,
        teardown: &mut Teardown,
    ) {
        let control = outcomes.slot(SLOT_CONTROL);

        // Precondition: no point starting subprocesses without credentials.
        let Some(secret) = control.capture_scoped(scope.guard(env.api.publish_secret()).await)
        else {
            return;
        };

        // Setup: stage the input file and attach it as the source.
        let Some(source) = control.capture_scoped(
            scope
                .guard(staging::stage_input(&env.input_file, &env.upload_dirs))
                .await,
        ) else {
            return;
        };
        let Some(upload) =
            control.capture_scoped(scope.guard(env.api.vlive_upload(&source)).await)
        else {
            return;
        };
        let Some(codecs) = control.capture_scoped(
            scope
                .guard(
                    env.api
                        .vlive_attach_source(&env.vlive_platform, std::slice::from_ref(&upload)),
                )
                .await,
        ) else {
            return;
        };
        if control
            .capture(validate_codecs(&upload, &codecs, env.expected_codec.as_ref()))
            .is_none()
        {
            return;
        }

        // Enable the feature, backing up the pre-run configuration first.
        // The restore runs from teardown on a fresh, never-cancelled footing.
        let stream_id = env.stream_id();
        let Some(()) = Self::enable_vlive(env, scope, &control, teardown, &stream_id, &secret).await
        else {
            return;
        };

        // Execution: publisher + prober under the shared scope.
        let publish_url = env.publish_url(&stream_id, &secret);
        let publisher = Publisher::new(loop_publish_args(&env.input_file, &publish_url))
            .with_binary(&env.publisher_binary);
        let prober = Prober::new(env.play_url(&stream_id))
            .with_binary(&env.prober_binary)
            .duration(env.probe_duration)
            .timeout(env.probe_timeout);
        let probe_done = prober.done();

        let publisher_slot = outcomes.slot(SLOT_PUBLISHER);
        let publisher_handle = tokio::spawn({
            let scope = Arc::clone(scope);
            async move {
                publisher_slot.capture_scoped(publisher.run(&scope).await);
            }
        });
        let prober_slot = outcomes.slot(SLOT_PROBER);
        let prober_handle = tokio::spawn({
            let scope = Arc::clone(scope);
            async move { prober_slot.capture_scoped(prober.run(&scope).await) }
        });

        // First-completed-wins: a naturally finished probe force-cancels the
        // scope, as a success signal, so the publisher winds down promptly.
        tokio::select! {
            () = scope.cancelled() => {}
            () = probe_done.cancelled() => scope.cancel(CancelCause::Completed),
        }

        // Collection: every spawned task returns before outcomes are read,
        // even when the scope has already expired.
        let capture = prober_handle.await.ok().flatten();
        let _ = publisher_handle.await;

        // Assertions, one slot each so concurrent failures all surface.
        if let Some(capture) = capture {
            let report = &capture.report;
            tracing::debug!(raw = %capture.raw, "probe raw output");
            if report.streams.len() != EXPECTED_STREAMS {
                outcomes.slot(SLOT_STREAMS).record(Error::assertion(format!(
                    "invalid streams={}, expected {EXPECTED_STREAMS}; {}",
                    report.streams.len(),
                    report.summary()
                )));
            }
            if report.format.probe_score < MIN_PROBE_SCORE {
                outcomes.slot(SLOT_SCORE).record(Error::assertion(format!(
                    "low score={} < {MIN_PROBE_SCORE}; {}",
                    report.format.probe_score,
                    report.summary()
                )));
            }
            if report.measured_duration() < env.probe_duration / 2 {
                outcomes.slot(SLOT_DURATION).record(Error::assertion(format!(
                    "short duration={:?} < half of {:?}; {}",
                    report.measured_duration(),
                    env.probe_duration,
                    report.summary()
                )));
            }
        }
    }

    /// Mutates the virtual-live stream configuration to enabled, registering
    /// the restore of the pre-mutation backup before applying.
    async fn enable_vlive(
        env: &ScenarioEnv,
        scope: &Scope,
        control: &vigil_core::outcome::OutcomeSlot,
        teardown: &mut Teardown,
        stream_id: &str,
        secret: &str,
    ) -> Option<()> {
        let mut conf =
            control.capture_scoped(scope.guard(env.api.vlive_stream_config()).await)?;

        let Some(Value::Object(platform_conf)) = conf.get_mut(&env.vlive_platform) else {
            control.record(Error::setup(format!(
                "no {} entry in virtual-live stream configuration",
                env.vlive_platform
            )));
            return None;
        };
        platform_conf.insert("action".to_string(), json!("update"));

        let backup = Value::Object(platform_conf.clone());
        teardown.push("restore virtual-live config", {
            let api = env.api.clone();
            async move { api.apply_vlive_stream_config(&backup).await }
        });

        // The virtual-live worker publishes its own stream alongside the
        // scenario's publisher, so it gets a derived id.
        platform_conf.insert(
            "secret".to_string(),
            json!(format!("{stream_id}-vlive?secret={secret}")),
        );
        platform_conf.insert("server".to_string(), json!(env.rtmp_url.clone()));
        platform_conf.insert("enabled".to_string(), json!(true));
        let apply = Value::Object(platform_conf.clone());

        control.capture_scoped(scope.guard(env.api.apply_vlive_stream_config(&apply)).await)
    }
}

fn validate_codecs(
    upload: &UploadedFile,
    codecs: &[SourceCodec],
    expected: Option<&ExpectedCodec>,
) -> Result<()> {
    let codec = codecs
        .first()
        .ok_or_else(|| Error::setup("platform returned no codec metadata for the source"))?;
    if codec.uuid != upload.uuid {
        return Err(Error::setup(format!(
            "codec uuid {} does not match upload {}",
            codec.uuid, upload.uuid
        )));
    }
    let Some(expected) = expected else {
        return Ok(());
    };

    let audio = codec
        .audio
        .as_ref()
        .ok_or_else(|| Error::setup("no audio codec detected in source"))?;
    if audio.codec_name != expected.audio_codec
        || audio.channels != expected.audio_channels
        || audio.sample_rate != expected.audio_sample_rate
    {
        return Err(Error::setup(format!("invalid source audio codec {audio:?}")));
    }

    let video = codec
        .video
        .as_ref()
        .ok_or_else(|| Error::setup("no video codec detected in source"))?;
    if video.codec_name != expected.video_codec
        || video.profile != expected.video_profile
        || video.width != expected.video_width
        || video.height != expected.video_height
    {
        return Err(Error::setup(format!("invalid source video codec {video:?}")));
    }
    Ok(())
}
