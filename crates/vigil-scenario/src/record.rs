//! RTMP publish + record scenario.
//!
//! Backs up and enables the record-all feature, publishes a stream long
//! enough for the record worker to accumulate data, disables the feature,
//! then polls for the finalized record file and asserts on it. The record
//! file and the configuration backup are both cleaned up from teardown.

use std::sync::Arc;

use async_trait::async_trait;

use vigil_core::error::{Error, Result};
use vigil_core::outcome::{OutcomeSet, OutcomeSlot};
use vigil_core::scope::{CancelCause, Scope};
use vigil_core::teardown::Teardown;
use vigil_media::Publisher;

use crate::driver::{loop_publish_args, Scenario, ScenarioEnv};
use crate::poll;

const SLOT_CONTROL: usize = 0;
const SLOT_PUBLISHER: usize = 1;
const SLOT_FILE: usize = 2;
const SLOT_COUNT: usize = 3;

/// Minimum finalized record duration, in seconds.
const MIN_RECORD_SECONDS: f64 = 10.0;

/// The RTMP publish + record scenario.
#[derive(Debug, Default)]
pub struct RtmpRecord;

#[async_trait]
impl Scenario for RtmpRecord {
    fn name(&self) -> &'static str {
        "rtmp_record"
    }

    async fn run(&self, env: &ScenarioEnv) -> Result<()> {
        let scope = Arc::new(Scope::new(env.long_timeout));
        let outcomes = OutcomeSet::new(SLOT_COUNT);
        let mut teardown = Teardown::new();
        Self::drive(env, &scope, &outcomes, &mut teardown).await;
        teardown.run().await;
        outcomes.verdict(&scope)
    }
}

impl RtmpRecord {
    async fn drive(
        env: &ScenarioEnv,
        scope: &Arc<Scope>,
        outcomes: &OutcomeSet,
        teardown: &mut Teardown,
    ) {
        let control = outcomes.slot(SLOT_CONTROL);

        let Some(secret) = control.capture_scoped(scope.guard(env.api.publish_secret()).await)
        else {
            return;
        };

        // Back up the record configuration, then enable record-all. The
        // restore runs from teardown after the record file was removed.
        let Some(backup) = control.capture_scoped(scope.guard(env.api.record_config()).await)
        else {
            return;
        };
        teardown.push("restore record config", {
            let api = env.api.clone();
            async move { api.apply_record_config(&backup).await }
        });
        if control
            .capture_scoped(scope.guard(env.api.apply_record(true)).await)
            .is_none()
        {
            return;
        }

        let stream_id = env.stream_id();
        let publish_url = env.publish_url(&stream_id, &secret);
        let publisher = Publisher::new(loop_publish_args(&env.input_file, &publish_url))
            .with_binary(&env.publisher_binary);
        let publisher_slot = outcomes.slot(SLOT_PUBLISHER);
        let publisher_handle = tokio::spawn({
            let scope = Arc::clone(scope);
            async move {
                publisher_slot.capture_scoped(publisher.run(&scope).await);
            }
        });

        if let Err(err) = Self::exercise(env, scope, outcomes, teardown, &stream_id).await {
            // The scope's own terminal error is reported by the verdict;
            // only genuine control-flow failures belong in the slot.
            control.capture_scoped::<()>(Err(err));
        }

        // Stop the publisher: a shutdown signal, not a failure.
        scope.cancel(CancelCause::Completed);
        let _ = publisher_handle.await;
    }

    /// The control-flow half of the scenario: wait, stop recording, poll for
    /// the settled file, assert on it.
    async fn exercise(
        env: &ScenarioEnv,
        scope: &Scope,
        outcomes: &OutcomeSet,
        teardown: &mut Teardown,
        stream_id: &str,
    ) -> Result<()> {
        // Let the record worker accumulate data.
        tokio::select! {
            () = scope.cancelled() => {}
            () = tokio::time::sleep(env.record_wait) => {}
        }

        scope.guard(env.api.apply_record(false)).await?;
        tracing::info!("record worker stopped");

        let file = poll::await_record_file(
            &env.api,
            scope,
            stream_id,
            env.poll_attempts,
            env.poll_interval,
        )
        .await?;

        teardown.push("remove record file", {
            let api = env.api.clone();
            let uuid = file.uuid.clone();
            async move { api.remove_record(&uuid).await }
        });

        Self::assert_file(outcomes.slot(SLOT_FILE), file.duration);
        Ok(())
    }

    fn assert_file(slot: OutcomeSlot, duration: f64) {
        // The reconciler only returns settled files, so progress needs no
        // re-check here; duration is the scenario-specific predicate.
        if duration < MIN_RECORD_SECONDS {
            slot.record(Error::assertion(format!(
                "record duration {duration}s < {MIN_RECORD_SECONDS}s"
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn long_enough_recordings_pass() {
        let outcomes = OutcomeSet::new(SLOT_COUNT);
        RtmpRecord::assert_file(outcomes.slot(SLOT_FILE), 12.5);
        assert_eq!(outcomes.recorded(), 0);
    }

    #[tokio::test]
    async fn short_recordings_record_an_assertion_outcome() {
        let outcomes = OutcomeSet::new(SLOT_COUNT);
        RtmpRecord::assert_file(outcomes.slot(SLOT_FILE), 4.0);
        assert_eq!(outcomes.recorded(), 1);
    }
}
