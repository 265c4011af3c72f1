//! Media file inspection module

use serde::Deserialize;

use crate::error::{DubForgeError, DubForgeResult};

pub mod inspector;

pub use inspector::VideoInspector;

/// Quiet JSON report produced by the inspection tool
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeReport {
    #[serde(default)]
    pub format: ProbeFormat,
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
}

/// Container-level section of the report. Values arrive as strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeFormat {
    pub duration: Option<String>,
    /// Present in the report but not trusted; size comes from a stat
    pub size: Option<String>,
}

/// Per-stream section of the report
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeStream {
    pub codec_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ProbeReport {
    /// Parse the raw tool output
    pub fn parse(raw: &[u8]) -> DubForgeResult<Self> {
        serde_json::from_slice(raw).map_err(|e| DubForgeError::ProbeParse {
            message: format!("invalid report JSON: {}", e),
        })
    }

    /// Container duration in seconds
    pub fn duration_seconds(&self) -> DubForgeResult<f64> {
        let raw = self
            .format
            .duration
            .as_deref()
            .ok_or_else(|| DubForgeError::ProbeParse {
                message: "report has no format.duration".to_string(),
            })?;

        raw.trim().parse::<f64>().map_err(|e| DubForgeError::ProbeParse {
            message: format!("duration {:?} is not a number: {}", raw, e),
        })
    }

    /// Dimensions of the first stream that exposes a nonzero width and height
    pub fn video_dimensions(&self) -> Option<(u32, u32)> {
        self.streams.iter().find_map(|stream| match (stream.width, stream.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        })
    }
}
