//! Prober subprocess task runner.
//!
//! Wraps an ffprobe-style process that captures a stream for a bounded
//! duration and prints a JSON report. The prober carries its own completion
//! signal, deliberately separate from the scenario scope's cancellation, so a
//! driver can race "probe naturally finished" against "global deadline" and
//! react to whichever fires first.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use vigil_core::error::{Error, Result};
use vigil_core::scope::Scope;

use crate::report::ProbeReport;

/// Role name used in subprocess error messages.
pub const ROLE: &str = "prober";

/// Everything a successful probe produces: the raw output for diagnostics
/// plus the parsed structured report.
#[derive(Debug, Clone)]
pub struct ProbeCapture {
    /// Raw prober stdout.
    pub raw: String,
    /// Parsed report.
    pub report: ProbeReport,
}

/// A prober process for one stream URL.
#[derive(Debug)]
pub struct Prober {
    binary: String,
    stream_url: String,
    duration: Duration,
    timeout: Duration,
    done: CancellationToken,
}

impl Prober {
    /// Creates a prober for `stream_url` with default bounds.
    #[must_use]
    pub fn new(stream_url: impl Into<String>) -> Self {
        Self {
            binary: "ffprobe".to_string(),
            stream_url: stream_url.into(),
            duration: Duration::from_secs(30),
            timeout: Duration::from_secs(45),
            done: CancellationToken::new(),
        }
    }

    /// Sets the capture duration passed to the prober process.
    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Sets the internal timeout after which a hung prober is killed.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the prober binary, mainly for tests.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// The probe-completed signal.
    ///
    /// Fires when the probe finishes for any internal reason (natural
    /// completion, parse failure, internal timeout), but not when the
    /// scenario scope is cancelled.
    #[must_use]
    pub fn done(&self) -> CancellationToken {
        self.done.clone()
    }

    /// Runs the prober to completion or cancellation.
    ///
    /// Fires the `done` signal on every internal exit path.
    ///
    /// # Errors
    ///
    /// Returns a subprocess error on launch failure, nonzero exit, or
    /// internal timeout; a parse error if the output does not match the
    /// report schema; the scope's terminal error when cancellation wins.
    pub async fn run(&self, scope: &Scope) -> Result<ProbeCapture> {
        let result = self.capture(scope).await;
        if !matches!(result, Err(Error::Cancelled { .. } | Error::DeadlineExceeded { .. })) {
            self.done.cancel();
        }
        result
    }

    async fn capture(&self, scope: &Scope) -> Result<ProbeCapture> {
        tracing::debug!(
            binary = %self.binary,
            url = %self.stream_url,
            duration = ?self.duration,
            "starting prober"
        );
        let micros = self.duration.as_micros().to_string();
        let mut child = Command::new(&self.binary)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                "-analyzeduration",
                &micros,
            ])
            .arg(&self.stream_url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| Error::subprocess(ROLE, format!("spawn {}: {err}", self.binary)))?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::subprocess(ROLE, "failed to capture stdout"))?;
        let reader = tokio::spawn(async move {
            let mut raw = String::new();
            let _ = stdout.read_to_string(&mut raw).await;
            raw
        });

        tokio::select! {
            status = child.wait() => {
                let raw = reader.await.unwrap_or_default();
                let status = status
                    .map_err(|err| Error::subprocess(ROLE, format!("wait failed: {err}")))?;
                if !status.success() {
                    return Err(Error::subprocess(
                        ROLE,
                        format!("exited with status {status}; raw: {raw}"),
                    ));
                }
                let report = ProbeReport::from_json(&raw)?;
                tracing::info!(summary = %report.summary(), "probe complete");
                Ok(ProbeCapture { raw, report })
            }
            () = tokio::time::sleep(self.timeout) => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                reader.abort();
                Err(Error::subprocess(
                    ROLE,
                    format!("timed out after {:?}", self.timeout),
                ))
            }
            () = scope.cancelled() => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                reader.abort();
                Err(scope
                    .terminal_error()
                    .unwrap_or_else(|| Error::cancelled("probe interrupted")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use vigil_core::scope::CancelCause;

    const REPORT: &str = concat!(
        r#"{"streams":[{"codec_type":"video","codec_name":"h264"},"#,
        r#"{"codec_type":"audio","codec_name":"aac"}],"#,
        r#""format":{"probe_score":100,"duration":"12.0"}}"#
    );

    /// Writes an executable script standing in for ffprobe; it ignores the
    /// probe flags and runs the given body.
    fn fake_binary(dir: &tempfile::TempDir, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.path().join("fake-ffprobe");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn natural_completion_parses_report_and_fires_done() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_binary(&dir, &format!("printf '%s' '{REPORT}'"));
        let prober = Prober::new("rtmp://ignored")
            .with_binary(binary)
            .duration(Duration::from_secs(1))
            .timeout(Duration::from_secs(5));
        let done = prober.done();

        let scope = Scope::new(Duration::from_secs(10));
        let capture = prober.run(&scope).await.unwrap();
        assert_eq!(capture.report.streams.len(), 2);
        assert_eq!(capture.report.format.probe_score, 100);
        assert!(capture.raw.contains("h264"));
        assert!(done.is_cancelled());
    }

    #[tokio::test]
    async fn malformed_output_is_a_parse_error_and_fires_done() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_binary(&dir, "printf '%s' 'Input/output error'");
        let prober = Prober::new("rtmp://ignored").with_binary(binary);
        let done = prober.done();

        let scope = Scope::new(Duration::from_secs(10));
        let err = prober.run(&scope).await.unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(done.is_cancelled());
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_subprocess_error() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_binary(&dir, "exit 2");
        let prober = Prober::new("rtmp://ignored").with_binary(binary);

        let scope = Scope::new(Duration::from_secs(10));
        let err = prober.run(&scope).await.unwrap_err();
        assert!(matches!(err, Error::Subprocess { role: "prober", .. }));
    }

    #[tokio::test]
    async fn internal_timeout_kills_a_hung_prober_and_fires_done() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_binary(&dir, "sleep 30");
        let prober = Prober::new("rtmp://ignored")
            .with_binary(binary)
            .timeout(Duration::from_millis(100));
        let done = prober.done();

        let scope = Scope::new(Duration::from_secs(10));
        let err = prober.run(&scope).await.unwrap_err();
        assert!(matches!(err, Error::Subprocess { .. }));
        assert!(err.to_string().contains("timed out"));
        assert!(done.is_cancelled());
    }

    #[tokio::test]
    async fn scope_cancellation_does_not_fire_done() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_binary(&dir, "sleep 30");
        let prober = Prober::new("rtmp://ignored")
            .with_binary(binary)
            .timeout(Duration::from_secs(60));
        let done = prober.done();

        let scope = std::sync::Arc::new(Scope::new(Duration::from_secs(60)));
        let run_scope = std::sync::Arc::clone(&scope);
        let handle = tokio::spawn(async move { prober.run(&run_scope).await });
        tokio::time::sleep(Duration::from_millis(100)).await;
        scope.cancel(CancelCause::Aborted);

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Cancelled { .. }));
        // The done signal reports internal completion only.
        assert!(!done.is_cancelled());
    }
}
