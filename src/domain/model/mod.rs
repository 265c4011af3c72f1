// Domain models - Core types and data structures

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Result of inspecting a local video file. Recomputed on every probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoInfo {
    /// Container duration in seconds
    pub duration: f64,
    /// File size in bytes, taken from the filesystem
    pub size: u64,
    /// Width of the first stream exposing dimensions, 0 if none
    pub width: u32,
    /// Height of the first stream exposing dimensions, 0 if none
    pub height: u32,
    /// Path that was probed
    pub path: PathBuf,
}

impl VideoInfo {
    /// Whether a video stream with dimensions was found
    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Encoder settings derived from a duration and a byte budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompressionParams {
    /// Target video bitrate in bits per second
    pub video_bitrate: i64,
    /// Fit the picture into a 1920x1080 canvas
    pub use_1080p: bool,
}

/// Lifecycle state of a remote dubbing job.
///
/// Unrecognised strings from the remote side are kept as-is in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DubbingStatus {
    Dubbing,
    Dubbed,
    Failed,
    Other(String),
}

impl DubbingStatus {
    /// Dubbed and Failed are terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, DubbingStatus::Dubbed | DubbingStatus::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            DubbingStatus::Dubbing => "dubbing",
            DubbingStatus::Dubbed => "dubbed",
            DubbingStatus::Failed => "failed",
            DubbingStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for DubbingStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "dubbing" => DubbingStatus::Dubbing,
            "dubbed" => DubbingStatus::Dubbed,
            "failed" => DubbingStatus::Failed,
            _ => DubbingStatus::Other(raw),
        }
    }
}

impl From<DubbingStatus> for String {
    fn from(status: DubbingStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for DubbingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote dubbing job as last fetched. Never cached by the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DubbingJob {
    /// Remote-assigned identifier
    pub id: String,
    pub status: DubbingStatus,
    /// Requested target languages, in order
    pub target_languages: Vec<String>,
    /// Remote error text, when the job failed
    pub error: Option<String>,
    /// Remote estimate of processing time in seconds
    pub expected_duration_sec: Option<f64>,
}

/// Per-client submission settings, applied to every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DubbingConfig {
    /// Cheaper submissions: watermark on, normal resolution
    pub test_mode: bool,
    /// Start of the dubbed range in seconds, 0 = from the beginning
    pub start_time: i64,
    /// End of the dubbed range in seconds, 0 = to the end
    pub end_time: i64,
    /// Speaker count hint, values <= 0 are sent as 1
    pub num_speakers: i32,
    pub drop_background_audio: bool,
}

impl Default for DubbingConfig {
    fn default() -> Self {
        Self {
            test_mode: false,
            start_time: 0,
            end_time: 0,
            num_speakers: 1,
            drop_background_audio: false,
        }
    }
}

impl DubbingConfig {
    /// Speaker count actually sent to the remote API
    pub fn effective_num_speakers(&self) -> i32 {
        if self.num_speakers > 0 {
            self.num_speakers
        } else {
            1
        }
    }

    /// Watermarked output is the price of test mode
    pub fn watermark(&self) -> bool {
        self.test_mode
    }

    pub fn highest_resolution(&self) -> bool {
        !self.test_mode
    }
}
