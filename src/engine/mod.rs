//! Two-pass compression engine module

use std::path::Path;

use crate::domain::model::CompressionParams;
use crate::error::EncodePass;
use crate::utils::path::{PathUtils, NULL_SINK};

pub mod passlog;
pub mod two_pass;

pub use passlog::PassLogGuard;
pub use two_pass::TwoPassCompressor;

/// Default encoder binary
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Fits the frame into 1920x1080 and letterboxes the remainder
pub const SCALE_1080P_FILTER: &str =
    "scale=1920:1080:force_original_aspect_ratio=decrease,pad=1920:1080:(ow-iw)/2:(oh-ih)/2";

/// Audio bitrate of the final pass
pub const AUDIO_BITRATE_ARG: &str = "128k";

/// Encoder invocation for one pass of a two-pass encode
#[derive(Debug, Clone)]
pub struct EncodeJob<'a> {
    pub source: &'a Path,
    pub output: &'a Path,
    pub passlog_prefix: &'a Path,
    pub params: CompressionParams,
}

impl EncodeJob<'_> {
    /// Build the encoder arguments for `pass`.
    ///
    /// Both passes share bitrate, resolution and pass-log prefix. The analysis
    /// pass drops audio and writes to the null sink.
    pub fn args(&self, pass: EncodePass) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            PathUtils::to_arg(self.source),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-b:v".to_string(),
            self.params.video_bitrate.to_string(),
            "-pass".to_string(),
            pass.number().to_string(),
            "-passlogfile".to_string(),
            PathUtils::to_arg(self.passlog_prefix),
        ];

        if self.params.use_1080p {
            args.push("-vf".to_string());
            args.push(SCALE_1080P_FILTER.to_string());
        }

        match pass {
            EncodePass::Analysis => {
                args.extend(["-an", "-f", "null", NULL_SINK].map(String::from));
            }
            EncodePass::Final => {
                args.extend(["-c:a", "aac", "-b:a", AUDIO_BITRATE_ARG].map(String::from));
                args.push(PathUtils::to_arg(self.output));
            }
        }

        args
    }
}
