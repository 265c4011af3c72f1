//! Size-constrained two-pass compression for dubbing uploads

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::model::{CompressionParams, VideoInfo};
use crate::domain::rules::UploadSizeRule;
use crate::engine::{EncodeJob, PassLogGuard, DEFAULT_FFMPEG};
use crate::error::{DubForgeError, DubForgeResult, EncodePass};
use crate::planner::{CompressionPlanner, TARGET_SIZE_BYTES};
use crate::ports::ProcessPort;
use crate::probe::VideoInspector;
use crate::utils::path::PathUtils;
use crate::utils::{file_size, Utils};

/// Keep only the tail of encoder stderr; the useful part is at the end
const MAX_STDERR_BYTES: usize = 64 * 1024;

/// Whether `path` is over the remote upload ceiling
pub async fn needs_compression(path: &Path) -> DubForgeResult<bool> {
    Ok(UploadSizeRule::needs_compression(file_size(path).await?))
}

/// Two-pass compressor driving an external encoder
#[derive(Clone)]
pub struct TwoPassCompressor {
    process: Arc<dyn ProcessPort>,
    inspector: VideoInspector,
    ffmpeg: String,
}

impl TwoPassCompressor {
    /// Create a compressor using `ffmpeg` and `ffprobe` from `PATH`
    pub fn new(process: Arc<dyn ProcessPort>) -> Self {
        Self {
            inspector: VideoInspector::new(Arc::clone(&process)),
            process,
            ffmpeg: DEFAULT_FFMPEG.to_string(),
        }
    }

    /// Use different encoder and inspection binaries
    pub fn with_binaries(mut self, ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        self.ffmpeg = ffmpeg.into();
        self.inspector = self.inspector.with_binary(ffprobe);
        self
    }

    pub fn inspector(&self) -> &VideoInspector {
        &self.inspector
    }

    /// Probe `source` and plan an encode that fits the target size
    pub async fn plan_for(
        &self,
        source: &Path,
        cancel: &CancellationToken,
    ) -> DubForgeResult<(VideoInfo, CompressionParams)> {
        let info = self.inspector.inspect(source, cancel).await?;
        let params = CompressionPlanner::plan(info.duration, TARGET_SIZE_BYTES)?;
        Ok((info, params))
    }

    /// Return a path to a version of `source` that fits under the upload ceiling.
    ///
    /// Files at or under the ceiling are returned unchanged without running the
    /// encoder. Larger files are re-encoded to `<stem>_compressed.mp4` beside
    /// the source. The source is never modified. Nothing is cached: every call
    /// re-runs both passes. Concurrent calls on the same source collide on the
    /// output and pass-log paths.
    pub async fn compress_for_dubbing(
        &self,
        source: &Path,
        cancel: &CancellationToken,
    ) -> DubForgeResult<PathBuf> {
        let size = file_size(source).await?;
        if !UploadSizeRule::needs_compression(size) {
            debug!(
                "{} is {}, no compression needed",
                source.display(),
                Utils::format_file_size(size)
            );
            return Ok(source.to_path_buf());
        }

        info!(
            "{} is {}, over the upload limit; compressing",
            source.display(),
            Utils::format_file_size(size)
        );

        let (video, params) = self.plan_for(source, cancel).await?;
        if params.video_bitrate <= 0 {
            return Err(DubForgeError::BitrateTooLow {
                bitrate: params.video_bitrate,
            });
        }

        info!(
            duration = video.duration,
            width = video.width,
            height = video.height,
            video_bitrate = params.video_bitrate,
            use_1080p = params.use_1080p,
            "Compression plan ready"
        );

        let output = PathUtils::compressed_output_path(source);
        let prefix = PathUtils::passlog_prefix(source);
        let job = EncodeJob {
            source,
            output: &output,
            passlog_prefix: &prefix,
            params,
        };

        let started = Instant::now();
        let passlogs = PassLogGuard::new(&prefix);
        let encoded = self.encode(&job, cancel).await;
        drop(passlogs);
        if let Err(e) = encoded {
            remove_partial_output(&output).await;
            return Err(e);
        }

        let compressed_size = tokio::fs::metadata(&output)
            .await
            .map_err(|e| {
                DubForgeError::io(
                    format!("compressed output missing at {}", output.display()),
                    e,
                )
            })?
            .len();

        info!(
            "Compressed {} -> {} ({}) in {:.1}s",
            Utils::format_file_size(size),
            Utils::format_file_size(compressed_size),
            output.display(),
            started.elapsed().as_secs_f64()
        );
        if UploadSizeRule::needs_compression(compressed_size) {
            warn!(
                "Compressed file is still over the upload limit: {}",
                Utils::format_file_size(compressed_size)
            );
        }

        Ok(output)
    }

    /// Run both passes strictly in order
    async fn encode(&self, job: &EncodeJob<'_>, cancel: &CancellationToken) -> DubForgeResult<()> {
        self.run_pass(job, EncodePass::Analysis, cancel).await?;
        self.run_pass(job, EncodePass::Final, cancel).await
    }

    async fn run_pass(
        &self,
        job: &EncodeJob<'_>,
        pass: EncodePass,
        cancel: &CancellationToken,
    ) -> DubForgeResult<()> {
        let args = job.args(pass);
        info!("Running encoder {}", pass);
        debug!(?args, "Encoder arguments");

        let output = self
            .process
            .execute_capturing_stderr(&self.ffmpeg, &args, cancel)
            .await?;

        if !output.success() {
            warn!("Encoder {} exited with {:?}", pass, output.exit_code);
            return Err(DubForgeError::CompressionFailed {
                pass,
                stderr: stderr_tail(&output.stderr).to_string(),
            });
        }

        Ok(())
    }
}

/// A failed or cancelled encode leaves no usable output behind
async fn remove_partial_output(output: &Path) {
    match tokio::fs::remove_file(output).await {
        Ok(()) => debug!("Removed partial output {}", output.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial output {}: {}", output.display(), e),
    }
}

/// Last `MAX_STDERR_BYTES` of `stderr`, cut on a character boundary
fn stderr_tail(stderr: &str) -> &str {
    let trimmed = stderr.trim_end();
    if trimmed.len() <= MAX_STDERR_BYTES {
        return trimmed;
    }
    let mut start = trimmed.len() - MAX_STDERR_BYTES;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    &trimmed[start..]
}
