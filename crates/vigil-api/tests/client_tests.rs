//! Control API client tests against an in-process mock platform.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use vigil_api::ApiClient;
use vigil_core::error::Error;

#[derive(Clone, Default)]
struct PlatformState {
    removed: Arc<Mutex<Vec<String>>>,
    record_all: Arc<Mutex<Option<bool>>>,
}

fn envelope(data: Value) -> Json<Value> {
    Json(json!({ "code": 0, "data": data }))
}

async fn secret_handler() -> Json<Value> {
    envelope(json!({ "publish": "0raw-secret" }))
}

async fn upload_handler(Query(params): Query<Vec<(String, String)>>) -> Json<Value> {
    let file = params
        .iter()
        .find(|(key, _)| key == "file")
        .map(|(_, value)| value.clone())
        .unwrap_or_default();
    envelope(json!({
        "name": file,
        "size": 1024,
        "target": format!("/data/{file}"),
        "uuid": "upload-1",
    }))
}

async fn record_files_handler() -> Json<Value> {
    envelope(json!([
        { "stream": "stream-a", "uuid": "file-a", "duration": 12.5, "progress": false },
        { "stream": "stream-b", "uuid": "file-b", "duration": 3.0, "progress": true },
    ]))
}

async fn record_apply_handler(
    State(state): State<PlatformState>,
    Json(body): Json<Value>,
) -> Json<Value> {
    if let Some(all) = body.get("all").and_then(Value::as_bool) {
        *state.record_all.lock().unwrap() = Some(all);
    }
    envelope(Value::Null)
}

async fn record_remove_handler(
    State(state): State<PlatformState>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let uuid = body
        .get("uuid")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    state.removed.lock().unwrap().push(uuid);
    envelope(Value::Null)
}

async fn failing_handler() -> Json<Value> {
    Json(json!({ "code": 100, "data": Value::Null }))
}

async fn start_mock(state: PlatformState) -> String {
    let app = Router::new()
        .route("/api/v1/hooks/publish/secret", post(secret_handler))
        .route("/api/v1/vlive/server", post(upload_handler))
        .route("/api/v1/record/files", post(record_files_handler))
        .route("/api/v1/record/apply", post(record_apply_handler))
        .route("/api/v1/record/remove", post(record_remove_handler))
        .route("/api/v1/vlive/stream", post(failing_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr: SocketAddr = listener.local_addr().expect("listener addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve mock platform");
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn publish_secret_decodes_envelope_data() {
    let base_url = start_mock(PlatformState::default()).await;
    let client = ApiClient::new(&base_url).expect("client");
    let secret = client.publish_secret().await.expect("secret");
    assert_eq!(secret, "0raw-secret");
}

#[tokio::test]
async fn upload_echoes_query_file_name() {
    let base_url = start_mock(PlatformState::default()).await;
    let client = ApiClient::new(&base_url).expect("client");
    let upload = client.vlive_upload("upload/input.flv").await.expect("upload");
    assert_eq!(upload.name, "upload/input.flv");
    assert_eq!(upload.uuid, "upload-1");
}

#[tokio::test]
async fn record_files_lists_every_entry() {
    let base_url = start_mock(PlatformState::default()).await;
    let client = ApiClient::new(&base_url).expect("client");
    let files = client.record_files().await.expect("files");
    assert_eq!(files.len(), 2);
    assert!(files[1].progress);
}

#[tokio::test]
async fn apply_and_remove_round_trip_state() {
    let state = PlatformState::default();
    let base_url = start_mock(state.clone()).await;
    let client = ApiClient::new(&base_url).expect("client");

    client.apply_record(true).await.expect("apply");
    assert_eq!(*state.record_all.lock().unwrap(), Some(true));

    client.remove_record("file-a").await.expect("remove");
    assert_eq!(*state.removed.lock().unwrap(), vec!["file-a".to_string()]);
}

#[tokio::test]
async fn nonzero_envelope_code_is_an_api_error() {
    let base_url = start_mock(PlatformState::default()).await;
    let client = ApiClient::new(&base_url).expect("client");
    let err = client.vlive_stream_config().await.expect_err("code 100");
    assert!(matches!(err, Error::Api { .. }));
    assert!(err.to_string().contains("code 100"));
}

#[tokio::test]
async fn unknown_route_reports_http_status() {
    let base_url = start_mock(PlatformState::default()).await;
    let client = ApiClient::new(&base_url).expect("client");
    let err = client.record_config().await.expect_err("missing route");
    assert!(err.to_string().contains("404"));
}
