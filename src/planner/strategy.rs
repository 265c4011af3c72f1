//! Bitrate and resolution planning under a byte budget

use tracing::{debug, warn};

use crate::domain::model::CompressionParams;
use crate::error::{DubForgeError, DubForgeResult};
use crate::planner::{AUDIO_BITRATE, HD_FALLBACK_BITRATE, MIN_VIDEO_BITRATE};

/// Pure planner turning a duration and a size budget into encoder settings
pub struct CompressionPlanner;

impl CompressionPlanner {
    /// Plan a two-pass encode that fits `target_size_bytes`.
    ///
    /// `video_bitrate = floor(target * 8 / duration) - AUDIO_BITRATE`. The
    /// picture is fitted into 1080p whenever that falls under
    /// [`HD_FALLBACK_BITRATE`]. Durations that are not finite and positive are
    /// rejected instead of producing a meaningless bitrate.
    pub fn plan(duration_sec: f64, target_size_bytes: u64) -> DubForgeResult<CompressionParams> {
        if !duration_sec.is_finite() || duration_sec <= 0.0 {
            return Err(DubForgeError::InvalidDuration {
                duration: duration_sec,
            });
        }

        let total_bitrate = Self::total_bitrate(duration_sec, target_size_bytes);
        let video_bitrate = total_bitrate - AUDIO_BITRATE;
        let use_1080p = video_bitrate < HD_FALLBACK_BITRATE;

        debug!(
            duration_sec,
            target_size_bytes, total_bitrate, video_bitrate, use_1080p, "Planned compression"
        );

        if video_bitrate < MIN_VIDEO_BITRATE {
            warn!(
                "Video bitrate {} bps is below {} bps; output quality will be poor",
                video_bitrate, MIN_VIDEO_BITRATE
            );
        }

        Ok(CompressionParams {
            video_bitrate,
            use_1080p,
        })
    }

    /// Whole-file bitrate that spends exactly the budget over the duration
    fn total_bitrate(duration_sec: f64, target_size_bytes: u64) -> i64 {
        (target_size_bytes as f64 * 8.0 / duration_sec).floor() as i64
    }
}
