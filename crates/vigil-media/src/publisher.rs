//! Publisher subprocess task runner.
//!
//! Wraps an ffmpeg-style publisher process. The scenario passes the full
//! argument list through unchanged; the runner owns only the lifecycle: start
//! the process, let it run until it exits on its own or the scenario scope is
//! cancelled, and report exactly one outcome.

use std::process::Stdio;

use tokio::process::Command;

use vigil_core::error::{Error, Result};
use vigil_core::scope::Scope;

/// Role name used in subprocess error messages.
pub const ROLE: &str = "publisher";

/// A publisher process with passthrough arguments.
#[derive(Debug, Clone)]
pub struct Publisher {
    binary: String,
    args: Vec<String>,
}

impl Publisher {
    /// Creates a publisher running `ffmpeg` with the given arguments.
    #[must_use]
    pub fn new(args: Vec<String>) -> Self {
        Self {
            binary: "ffmpeg".to_string(),
            args,
        }
    }

    /// Overrides the publisher binary, mainly for tests.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Runs the process until natural exit or scope cancellation.
    ///
    /// A kill triggered by cancellation counts as a clean shutdown when the
    /// scope was cancelled as a success signal; the scope's terminal error is
    /// returned otherwise.
    ///
    /// # Errors
    ///
    /// Returns a subprocess error if the process cannot be spawned or exits
    /// nonzero before cancellation.
    pub async fn run(&self, scope: &Scope) -> Result<()> {
        tracing::debug!(binary = %self.binary, args = ?self.args, "starting publisher");
        let mut child = Command::new(&self.binary)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| Error::subprocess(ROLE, format!("spawn {}: {err}", self.binary)))?;

        tokio::select! {
            status = child.wait() => match status {
                Ok(status) if status.success() => Ok(()),
                Ok(status) => Err(Error::subprocess(
                    ROLE,
                    format!("exited early with status {status}"),
                )),
                Err(err) => Err(Error::subprocess(ROLE, format!("wait failed: {err}"))),
            },
            () = scope.cancelled() => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                match scope.terminal_error() {
                    None => Ok(()),
                    Some(err) => Err(err),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::time::Duration;
    use vigil_core::scope::CancelCause;

    fn shell(script: &str) -> Publisher {
        Publisher::new(vec!["-c".to_string(), script.to_string()]).with_binary("sh")
    }

    #[tokio::test]
    async fn clean_exit_is_success() {
        let scope = Scope::new(Duration::from_secs(10));
        shell("exit 0").run(&scope).await.unwrap();
    }

    #[tokio::test]
    async fn early_nonzero_exit_is_a_subprocess_error() {
        let scope = Scope::new(Duration::from_secs(10));
        let err = shell("exit 3").run(&scope).await.unwrap_err();
        assert!(matches!(err, Error::Subprocess { role: "publisher", .. }));
    }

    #[tokio::test]
    async fn completion_cancel_kills_process_and_counts_as_success() {
        let scope = Scope::new(Duration::from_secs(30));
        let publisher = shell("sleep 30");
        let handle = {
            let scope = std::sync::Arc::new(scope);
            let run_scope = std::sync::Arc::clone(&scope);
            let handle =
                tokio::spawn(async move { publisher.run(&run_scope).await });
            tokio::time::sleep(Duration::from_millis(100)).await;
            scope.cancel(CancelCause::Completed);
            handle
        };
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn deadline_cancel_surfaces_the_scope_error() {
        let scope = Scope::new(Duration::from_millis(50));
        let err = shell("sleep 30").run(&scope).await.unwrap_err();
        assert!(matches!(err, Error::DeadlineExceeded { .. }));
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let scope = Scope::new(Duration::from_secs(5));
        let publisher =
            Publisher::new(vec!["-re".to_string()]).with_binary("vigil-no-such-binary");
        let err = publisher.run(&scope).await.unwrap_err();
        assert!(matches!(err, Error::Subprocess { .. }));
    }
}
