//! Structured metadata parsed from prober output.
//!
//! The prober prints one JSON document describing detected streams and the
//! container format, in the ffprobe `-print_format json` shape. Only the
//! fields the scenarios assert on are modeled; everything else is ignored.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use vigil_core::error::{Error, Result};

/// One detected media stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeStream {
    /// Codec short name, e.g. `h264` or `aac`.
    #[serde(default)]
    pub codec_name: String,
    /// Stream kind, `video` or `audio`.
    #[serde(default)]
    pub codec_type: String,
    /// Frame width, video streams only.
    #[serde(default)]
    pub width: Option<u32>,
    /// Frame height, video streams only.
    #[serde(default)]
    pub height: Option<u32>,
    /// Channel count, audio streams only.
    #[serde(default)]
    pub channels: Option<u32>,
    /// Sample rate, audio streams only.
    #[serde(default)]
    pub sample_rate: Option<String>,
}

/// Container-level format metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeFormat {
    /// Container format name.
    #[serde(default)]
    pub format_name: String,
    /// Prober confidence score, 0–100.
    #[serde(default)]
    pub probe_score: i64,
    /// Measured duration in seconds, as printed by the prober.
    #[serde(default)]
    pub duration: String,
    /// Number of streams the container reports.
    #[serde(default)]
    pub nb_streams: u32,
}

/// The full parsed prober report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Every detected stream.
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
    /// Format metadata.
    #[serde(default)]
    pub format: ProbeFormat,
}

impl ProbeReport {
    /// Parses a report from raw prober stdout.
    ///
    /// # Errors
    ///
    /// Returns a parse error including a bounded snippet of the raw output.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|err| {
            Error::parse(format!(
                "prober output did not match schema: {err}; raw: {}",
                snippet(raw, 512)
            ))
        })
    }

    /// The measured duration, zero when the prober printed none.
    #[must_use]
    pub fn measured_duration(&self) -> Duration {
        self.format
            .duration
            .parse::<f64>()
            .ok()
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map_or(Duration::ZERO, Duration::from_secs_f64)
    }

    /// One-line summary for diagnostics.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "streams={} score={} duration={:?}",
            self.streams.len(),
            self.format.probe_score,
            self.measured_duration()
        )
    }
}

fn snippet(raw: &str, max_bytes: usize) -> &str {
    if raw.len() <= max_bytes {
        return raw;
    }
    let mut end = max_bytes;
    while end > 0 && !raw.is_char_boundary(end) {
        end -= 1;
    }
    &raw[..end]
}
