//! Polling reconciler for asynchronously-settling record files.
//!
//! The platform finalizes a record file some time after recording stops;
//! there is no push notification. The reconciler trades a small fixed
//! latency for that: query the listing, classify the match as not-found /
//! in-progress / settled, and sleep-retry within a bounded attempt budget,
//! aborting early once the scenario scope is done.

use std::time::Duration;

use vigil_api::{ApiClient, RecordFile};
use vigil_core::error::{Error, Result};
use vigil_core::scope::Scope;

/// Waits for the record file of `stream` to appear and settle.
///
/// # Errors
///
/// Returns the scope's terminal error if it expires mid-listing, a poll
/// timeout if the scope is done before the file settles or the attempt
/// budget runs out.
pub async fn await_record_file(
    api: &ApiClient,
    scope: &Scope,
    stream: &str,
    attempts: u32,
    interval: Duration,
) -> Result<RecordFile> {
    let deadline_err = || {
        Error::poll_timeout(format!(
            "record file for {stream} not settled before deadline"
        ))
    };

    for attempt in 1..=attempts {
        if scope.is_cancelled() {
            return Err(deadline_err());
        }
        let files = scope.guard(api.record_files()).await?;
        let found = files.into_iter().find(|file| file.stream == stream);

        match found {
            Some(file) if !file.progress => {
                tracing::debug!(stream, attempt, uuid = %file.uuid, "record file settled");
                return Ok(file);
            }
            Some(_) => tracing::debug!(stream, attempt, "record file still in progress"),
            None => tracing::debug!(stream, attempt, "record file not listed yet"),
        }

        tokio::select! {
            () = scope.cancelled() => return Err(deadline_err()),
            () = tokio::time::sleep(interval) => {}
        }
    }
    Err(Error::poll_timeout(format!(
        "record file for {stream} not settled after {attempts} attempts"
    )))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use axum::extract::State;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use vigil_core::scope::CancelCause;

    /// Mock listing endpoint: not listed on the first call, in progress on
    /// the second, settled afterwards.
    async fn files_handler(State(calls): State<Arc<AtomicU32>>) -> Json<Value> {
        let call = calls.fetch_add(1, Ordering::SeqCst);
        let data = match call {
            0 => json!([]),
            1 => json!([
                { "stream": "stream-poll", "uuid": "rec-1", "duration": 4.0, "progress": true }
            ]),
            _ => json!([
                { "stream": "other", "uuid": "rec-0", "duration": 9.0, "progress": false },
                { "stream": "stream-poll", "uuid": "rec-1", "duration": 15.2, "progress": false }
            ]),
        };
        Json(json!({ "code": 0, "data": data }))
    }

    async fn start_mock(calls: Arc<AtomicU32>) -> String {
        let app = Router::new()
            .route("/api/v1/record/files", post(files_handler))
            .with_state(calls);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr: SocketAddr = listener.local_addr().expect("listener addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock");
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn settles_after_progress_transitions() {
        let calls = Arc::new(AtomicU32::new(0));
        let base_url = start_mock(Arc::clone(&calls)).await;
        let api = ApiClient::new(&base_url).unwrap();
        let scope = Scope::new(Duration::from_secs(10));

        let file = await_record_file(&api, &scope, "stream-poll", 10, Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(file.uuid, "rec-1");
        assert!(!file.progress);
        assert!(file.duration > 10.0);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausting_the_attempt_budget_is_a_poll_timeout() {
        let calls = Arc::new(AtomicU32::new(0));
        let base_url = start_mock(calls).await;
        let api = ApiClient::new(&base_url).unwrap();
        let scope = Scope::new(Duration::from_secs(10));

        let err = await_record_file(&api, &scope, "stream-absent", 3, Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PollTimeout { .. }));
        assert!(err.to_string().contains("3 attempts"));
    }

    #[tokio::test]
    async fn cancelled_scope_aborts_instead_of_retrying() {
        let calls = Arc::new(AtomicU32::new(0));
        let base_url = start_mock(Arc::clone(&calls)).await;
        let api = ApiClient::new(&base_url).unwrap();
        let scope = Scope::new(Duration::from_secs(10));
        scope.cancel(CancelCause::Completed);

        let err = await_record_file(&api, &scope, "stream-absent", 60, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PollTimeout { .. }));
        assert!(err.to_string().contains("not settled before deadline"));
        // No listing request once cancellation has been observed.
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
