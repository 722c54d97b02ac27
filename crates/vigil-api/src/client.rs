//! HTTP client for the platform control API.
//!
//! One client per harness run; cheap to clone (the underlying connection
//! pool is shared). Requests carry their own fixed connect/request timeouts
//! so a clone used from teardown keeps working after the scenario scope has
//! expired.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use vigil_core::error::{Error, Result};

use crate::types::{
    ApplyRecordRequest, AttachSourceRequest, AttachSourceResponse, Envelope, PublishSecret,
    RecordFile, RemoveRecordRequest, SourceCodec, UploadedFile,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the streaming platform's control API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| Error::api_with_source("failed to build HTTP client", err))?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { client, base_url })
    }

    /// Fetches the secret required to publish a stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the secret is empty.
    pub async fn publish_secret(&self) -> Result<String> {
        let secret: PublishSecret = self.request("/api/v1/hooks/publish/secret", &Value::Null).await?;
        if secret.publish.is_empty() {
            return Err(Error::precondition("publish secret is empty"));
        }
        Ok(secret.publish)
    }

    /// Registers a staged media file as a virtual-live upload.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn vlive_upload(&self, file: &str) -> Result<UploadedFile> {
        let path = "/api/v1/vlive/server";
        let url = format!("{}{path}", self.base_url);
        let request = self
            .client
            .post(url)
            .query(&[("file", file)])
            .json(&Value::Null);
        self.execute(request, path).await
    }

    /// Attaches uploaded files as the source of a virtual-live platform key,
    /// returning the codec metadata the platform detected per file.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn vlive_attach_source(
        &self,
        platform: &str,
        files: &[UploadedFile],
    ) -> Result<Vec<SourceCodec>> {
        let response: AttachSourceResponse = self
            .request("/api/v1/vlive/source", &AttachSourceRequest { platform, files })
            .await?;
        Ok(response.files)
    }

    /// Queries the full virtual-live stream configuration, keyed by platform.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn vlive_stream_config(&self) -> Result<serde_json::Map<String, Value>> {
        self.request("/api/v1/vlive/stream", &Value::Null).await
    }

    /// Applies a virtual-live stream configuration object for one platform.
    /// Used both to enable the feature and to restore a backup.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn apply_vlive_stream_config(&self, conf: &Value) -> Result<()> {
        self.send("/api/v1/vlive/stream", conf).await
    }

    /// Queries the record feature configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn record_config(&self) -> Result<Value> {
        self.request("/api/v1/record/query", &Value::Null).await
    }

    /// Toggles recording of all streams on or off.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn apply_record(&self, all: bool) -> Result<()> {
        self.send("/api/v1/record/apply", &ApplyRecordRequest { all }).await
    }

    /// Applies a raw record configuration object, used to restore a backup.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn apply_record_config(&self, conf: &Value) -> Result<()> {
        self.send("/api/v1/record/apply", conf).await
    }

    /// Lists every record file the platform has produced.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn record_files(&self) -> Result<Vec<RecordFile>> {
        self.request("/api/v1/record/files", &Value::Null).await
    }

    /// Removes a record file by resource handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn remove_record(&self, uuid: &str) -> Result<()> {
        self.send("/api/v1/record/remove", &RemoveRecordRequest { uuid })
            .await
    }

    /// Sends a JSON request and decodes the envelope's `data`.
    async fn request<Q, R>(&self, path: &str, body: &Q) -> Result<R>
    where
        Q: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let request = self.client.post(url).json(body);
        self.execute(request, path).await
    }

    /// Sends a JSON request, requiring only a zero envelope code.
    async fn send<Q>(&self, path: &str, body: &Q) -> Result<()>
    where
        Q: Serialize + ?Sized,
    {
        let url = format!("{}{path}", self.base_url);
        let request = self.client.post(url).json(body);
        let _: Option<Value> = self.execute_optional(request, path).await?;
        Ok(())
    }

    async fn execute<R>(&self, request: reqwest::RequestBuilder, path: &str) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let data: Option<R> = self.execute_optional(request, path).await?;
        data.ok_or_else(|| Error::api(format!("{path} returned no data")))
    }

    async fn execute_optional<R>(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<Option<R>>
    where
        R: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .map_err(|err| Error::api_with_source(format!("request {path} failed"), err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::api(format!(
                "request {path} failed (status={status}): {body}"
            )));
        }

        let envelope: Envelope<R> = response
            .json()
            .await
            .map_err(|err| Error::api_with_source(format!("decode {path} response"), err))?;

        if envelope.code != 0 {
            return Err(Error::api(format!(
                "{path} returned code {}",
                envelope.code
            )));
        }
        tracing::debug!(path, "control api request ok");
        Ok(envelope.data)
    }
}
