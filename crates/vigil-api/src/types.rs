//! Wire types for the control API.

use serde::{Deserialize, Serialize};

/// A record file produced by the platform's record worker.
///
/// Lifecycle: created when recording starts, `progress == true` while the
/// stream is still being written, settles to `progress == false` once the
/// file is finalized, deleted by an explicit remove call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFile {
    /// The stream this file was recorded from.
    pub stream: String,
    /// Resource handle used for removal.
    pub uuid: String,
    /// Recorded duration in seconds.
    #[serde(default)]
    pub duration: f64,
    /// True while the file is still being written.
    #[serde(default)]
    pub progress: bool,
}

/// A media file registered as a virtual-live upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// File name as seen by the platform.
    pub name: String,
    /// File size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Server-side path of the upload.
    #[serde(default)]
    pub target: String,
    /// Resource handle assigned by the platform.
    pub uuid: String,
}

/// Audio codec metadata the platform detected in an uploaded source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioCodec {
    /// Codec short name, e.g. `aac`.
    #[serde(default)]
    pub codec_name: String,
    /// Channel count.
    #[serde(default)]
    pub channels: u32,
    /// Sample rate as reported by the platform, e.g. `44100`.
    #[serde(default)]
    pub sample_rate: String,
}

/// Video codec metadata the platform detected in an uploaded source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoCodec {
    /// Codec short name, e.g. `h264`.
    #[serde(default)]
    pub codec_name: String,
    /// Codec profile, e.g. `High`.
    #[serde(default)]
    pub profile: String,
    /// Frame width in pixels.
    #[serde(default)]
    pub width: u32,
    /// Frame height in pixels.
    #[serde(default)]
    pub height: u32,
}

/// Codec metadata for one attached virtual-live source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCodec {
    /// Must match the uuid of the uploaded file it describes.
    pub uuid: String,
    /// Detected audio codec.
    #[serde(default)]
    pub audio: Option<AudioCodec>,
    /// Detected video codec.
    #[serde(default)]
    pub video: Option<VideoCodec>,
}

/// Request body for attaching uploaded files as a virtual-live source.
#[derive(Debug, Serialize)]
pub(crate) struct AttachSourceRequest<'a> {
    pub platform: &'a str,
    pub files: &'a [UploadedFile],
}

/// Response body for a source attach.
#[derive(Debug, Deserialize)]
pub(crate) struct AttachSourceResponse {
    #[serde(default)]
    pub files: Vec<SourceCodec>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PublishSecret {
    #[serde(default)]
    pub publish: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ApplyRecordRequest {
    pub all: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct RemoveRecordRequest<'a> {
    pub uuid: &'a str,
}

/// The platform response envelope. A nonzero `code` is a request failure
/// even when HTTP status is 200.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub code: i64,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_file_decodes_with_defaults() {
        let file: RecordFile =
            serde_json::from_str(r#"{"stream":"stream-a","uuid":"u-1"}"#).expect("decode");
        assert_eq!(file.stream, "stream-a");
        assert!(!file.progress);
        assert!(file.duration.abs() < f64::EPSILON);
    }

    #[test]
    fn envelope_decodes_missing_data_as_none() {
        let env: Envelope<RecordFile> = serde_json::from_str(r#"{"code":0}"#).expect("decode");
        assert_eq!(env.code, 0);
        assert!(env.data.is_none());
    }

    #[test]
    fn source_codec_tolerates_missing_tracks() {
        let codec: SourceCodec = serde_json::from_str(r#"{"uuid":"u-2"}"#).expect("decode");
        assert!(codec.audio.is_none());
        assert!(codec.video.is_none());
    }
}
