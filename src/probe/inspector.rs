//! Video inspection implementation

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::model::VideoInfo;
use crate::error::DubForgeResult;
use crate::ports::ProcessPort;
use crate::probe::ProbeReport;
use crate::utils::file_size;
use crate::utils::path::PathUtils;

/// Default inspection binary
pub const DEFAULT_FFPROBE: &str = "ffprobe";

/// Video inspector backed by an external inspection tool
#[derive(Clone)]
pub struct VideoInspector {
    process: Arc<dyn ProcessPort>,
    ffprobe: String,
}

impl VideoInspector {
    /// Create a new video inspector using `ffprobe` from `PATH`
    pub fn new(process: Arc<dyn ProcessPort>) -> Self {
        Self {
            process,
            ffprobe: DEFAULT_FFPROBE.to_string(),
        }
    }

    /// Use a different inspection binary
    pub fn with_binary(mut self, ffprobe: impl Into<String>) -> Self {
        self.ffprobe = ffprobe.into();
        self
    }

    /// Inspect a video file.
    ///
    /// Spawns exactly one child process. Size comes from the filesystem, the
    /// dimensions from the first stream that has them (0x0 if none).
    pub async fn inspect(&self, path: &Path, cancel: &CancellationToken) -> DubForgeResult<VideoInfo> {
        info!("Inspecting video file: {}", path.display());

        let size = file_size(path).await?;

        let args = Self::build_args(path);
        let stdout = self
            .process
            .execute(&self.ffprobe, &args, cancel)
            .await
            .map_err(|e| e.in_step("inspect", path))?;
        let report = ProbeReport::parse(&stdout).map_err(|e| e.in_step("inspect", path))?;

        let duration = report
            .duration_seconds()
            .map_err(|e| e.in_step("inspect", path))?;
        let (width, height) = report.video_dimensions().unwrap_or((0, 0));

        debug!(duration, width, height, size, "Probe completed");

        Ok(VideoInfo {
            duration,
            size,
            width,
            height,
            path: path.to_path_buf(),
        })
    }

    /// Arguments for a quiet JSON report with format and streams
    fn build_args(path: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_format".to_string(),
            "-show_streams".to_string(),
            PathUtils::to_arg(path),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock_process::{MockProcessAdapter, MockResponse};
    use crate::error::DubForgeError;
    use tempfile::TempDir;

    const REPORT: &str = r#"{"streams":[{"codec_type":"audio"},{"codec_type":"video","width":1920,"height":800}],"format":{"duration":"123.5","size":"999"}}"#;

    #[tokio::test]
    async fn test_inspect_uses_stat_size_and_first_video_stream() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, vec![0u8; 4096]).unwrap();

        let mock = Arc::new(MockProcessAdapter::new().with_response(MockResponse::stdout(REPORT)));
        let inspector = VideoInspector::new(mock.clone());
        let info = inspector.inspect(&path, &CancellationToken::new()).await.unwrap();

        assert_eq!(info.duration, 123.5);
        assert_eq!(info.size, 4096);
        assert_eq!((info.width, info.height), (1920, 800));
        assert_eq!(info.path, path);

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "ffprobe");
        assert!(calls[0].args.contains(&"-show_streams".to_string()));
        assert_eq!(calls[0].args.last().unwrap(), &path.to_string_lossy().to_string());
    }

    #[tokio::test]
    async fn test_missing_file_does_not_spawn() {
        let mock = Arc::new(MockProcessAdapter::new());
        let inspector = VideoInspector::new(mock.clone());
        let result = inspector
            .inspect(Path::new("/nonexistent/dir/video.mp4"), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(DubForgeError::FileNotFound { .. })));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"data").unwrap();

        let mock = Arc::new(
            MockProcessAdapter::new()
                .with_response(MockResponse::spawn_error(std::io::ErrorKind::NotFound)),
        );
        let inspector = VideoInspector::new(mock).with_binary("/opt/ffprobe");
        let result = inspector.inspect(&path, &CancellationToken::new()).await;

        assert!(matches!(result, Err(DubForgeError::ToolNotFound { tool }) if tool == "/opt/ffprobe"));
    }

    #[tokio::test]
    async fn test_unparsable_duration_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"data").unwrap();

        let mock = Arc::new(MockProcessAdapter::new().with_response(MockResponse::stdout(
            r#"{"streams":[],"format":{"duration":"abc"}}"#,
        )));
        let result = VideoInspector::new(mock)
            .inspect(&path, &CancellationToken::new())
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, DubForgeError::Step { step: "inspect", ref path, .. } if path.ends_with("clip.mp4")));
        assert!(matches!(err.root(), DubForgeError::ProbeParse { .. }));
    }

    #[tokio::test]
    async fn test_tool_failure_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"data").unwrap();

        let mock = Arc::new(
            MockProcessAdapter::new().with_response(MockResponse::failure(1, "moov atom not found")),
        );
        let err = VideoInspector::new(mock)
            .inspect(&path, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("clip.mp4"));
        assert!(matches!(err.root(), DubForgeError::CommandFailed { code: Some(1), .. }));
    }
}
