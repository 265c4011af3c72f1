//! Integration tests for planning and two-pass compression

use std::path::PathBuf;
use std::sync::Arc;

use dubforge_cli::adapters::TokioProcessAdapter;
use dubforge_cli::engine::two_pass::needs_compression;
use dubforge_cli::planner::{MAX_FILE_SIZE_BYTES, TARGET_SIZE_BYTES};
use dubforge_cli::{CompressionPlanner, DubForgeError, TwoPassCompressor};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn sized_file(dir: &TempDir, name: &str, len: u64) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::File::create(&path).unwrap().set_len(len).unwrap();
    path
}

#[test]
fn test_ten_minute_video_keeps_resolution() {
    let params = CompressionPlanner::plan(600.0, TARGET_SIZE_BYTES).unwrap();
    assert_eq!(params.video_bitrate, 12_454_912);
    assert!(!params.use_1080p);
}

#[test]
fn test_two_hour_video_is_scaled() {
    let params = CompressionPlanner::plan(7200.0, TARGET_SIZE_BYTES).unwrap();
    assert_eq!(params.video_bitrate, 920_576);
    assert!(params.use_1080p);
}

#[tokio::test]
async fn test_needs_compression_boundary() {
    let dir = TempDir::new().unwrap();
    let at_limit = sized_file(&dir, "at.mp4", MAX_FILE_SIZE_BYTES);
    let over_limit = sized_file(&dir, "over.mp4", MAX_FILE_SIZE_BYTES + 1);

    assert!(!needs_compression(&at_limit).await.unwrap());
    assert!(needs_compression(&over_limit).await.unwrap());
    assert!(matches!(
        needs_compression(&dir.path().join("absent.mp4")).await,
        Err(DubForgeError::FileNotFound { .. })
    ));
}

#[tokio::test]
async fn test_missing_tools_are_reported() {
    let dir = TempDir::new().unwrap();
    let source = sized_file(&dir, "talk.mp4", MAX_FILE_SIZE_BYTES + 1);

    let result = TwoPassCompressor::new(Arc::new(TokioProcessAdapter::new()))
        .with_binaries("/nonexistent/bin/ffmpeg", "/nonexistent/bin/ffprobe")
        .compress_for_dubbing(&source, &CancellationToken::new())
        .await;

    assert!(matches!(
        result,
        Err(DubForgeError::ToolNotFound { ref tool }) if tool == "/nonexistent/bin/ffprobe"
    ));
}

#[tokio::test]
async fn test_small_file_needs_no_tools() {
    let dir = TempDir::new().unwrap();
    let source = sized_file(&dir, "talk.mp4", 4096);

    let result = TwoPassCompressor::new(Arc::new(TokioProcessAdapter::new()))
        .with_binaries("/nonexistent/bin/ffmpeg", "/nonexistent/bin/ffprobe")
        .compress_for_dubbing(&source, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result, source);
}

#[cfg(unix)]
mod with_stand_in_tools {
    use super::*;
    use dubforge_cli::EncodePass;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use std::time::Duration;

    fn script(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn ffprobe(dir: &Path, duration: &str) -> String {
        script(
            dir,
            "ffprobe",
            &format!(
                "echo '{{\"streams\":[{{\"codec_type\":\"video\",\"width\":3840,\"height\":2160}}],\"format\":{{\"duration\":\"{}\"}}}}'\n",
                duration
            ),
        )
    }

    /// Records each pass, writes pass logs on pass 1 and the output on pass 2.
    /// Exits with `fail_code` on `fail_pass`.
    fn ffmpeg(dir: &Path, fail_pass: u8, fail_code: u8) -> String {
        let journal = dir.join("passes.txt");
        script(
            dir,
            "ffmpeg",
            &format!(
                r#"prefix=""
pass=""
last=""
while [ $# -gt 0 ]; do
  case "$1" in
    -passlogfile) prefix="$2"; shift ;;
    -pass) pass="$2"; shift ;;
  esac
  last="$1"
  shift
done
echo "$pass" >> "{journal}"
if [ "$pass" = "1" ]; then
  : > "$prefix-0.log"
  : > "$prefix-0.log.mbtree"
fi
if [ "$pass" = "{fail_pass}" ]; then
  echo "encoder exploded on pass $pass" >&2
  exit {fail_code}
fi
if [ "$pass" = "2" ]; then
  printf 'encoded' > "$last"
fi
"#,
                journal = journal.display(),
                fail_pass = fail_pass,
                fail_code = fail_code,
            ),
        )
    }

    /// Stops partway the way a real encoder would be caught when killed: pass 1
    /// keeps its stats in `.temp` files until it exits cleanly, pass 2 has
    /// started writing the output. Blocks on pass 1 when `stall_pass` is 1 and
    /// always on pass 2.
    fn stalling_ffmpeg(dir: &Path, stall_pass: u8) -> String {
        script(
            dir,
            "ffmpeg",
            &format!(
                r#"prefix=""
pass=""
last=""
while [ $# -gt 0 ]; do
  case "$1" in
    -passlogfile) prefix="$2"; shift ;;
    -pass) pass="$2"; shift ;;
  esac
  last="$1"
  shift
done
if [ "$pass" = "1" ]; then
  : > "$prefix-0.log.temp"
  : > "$prefix-0.log.mbtree.temp"
  if [ "{stall_pass}" = "1" ]; then
    exec sleep 60
  fi
  mv "$prefix-0.log.temp" "$prefix-0.log"
  mv "$prefix-0.log.mbtree.temp" "$prefix-0.log.mbtree"
  exit 0
fi
printf 'partial' > "$last"
exec sleep 60
"#,
                stall_pass = stall_pass,
            ),
        )
    }

    /// Cancel `token` once `marker` shows up on disk
    fn cancel_when_present(marker: PathBuf, token: CancellationToken) {
        tokio::spawn(async move {
            while !marker.exists() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            token.cancel();
        });
    }

    fn passlogs_left(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.contains("_passlog"))
            .collect()
    }

    #[tokio::test]
    async fn test_two_passes_produce_output_and_clean_up() {
        let tools = TempDir::new().unwrap();
        let media = TempDir::new().unwrap();
        let source = sized_file(&media, "talk.mp4", MAX_FILE_SIZE_BYTES + 1);

        let compressor = TwoPassCompressor::new(Arc::new(TokioProcessAdapter::new()))
            .with_binaries(ffmpeg(tools.path(), 0, 0), ffprobe(tools.path(), "600.0"));
        let output = compressor
            .compress_for_dubbing(&source, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(output, media.path().join("talk_compressed.mp4"));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "encoded");
        assert_eq!(std::fs::metadata(&source).unwrap().len(), MAX_FILE_SIZE_BYTES + 1);
        assert!(passlogs_left(media.path()).is_empty());

        let journal = std::fs::read_to_string(tools.path().join("passes.txt")).unwrap();
        assert_eq!(journal, "1\n2\n");
    }

    #[tokio::test]
    async fn test_repeated_calls_rerun_both_passes() {
        let tools = TempDir::new().unwrap();
        let media = TempDir::new().unwrap();
        let source = sized_file(&media, "talk.mp4", MAX_FILE_SIZE_BYTES + 1);

        let compressor = TwoPassCompressor::new(Arc::new(TokioProcessAdapter::new()))
            .with_binaries(ffmpeg(tools.path(), 0, 0), ffprobe(tools.path(), "600.0"));
        let cancel = CancellationToken::new();
        let first = compressor.compress_for_dubbing(&source, &cancel).await.unwrap();
        let second = compressor.compress_for_dubbing(&source, &cancel).await.unwrap();

        assert_eq!(first, second);
        let journal = std::fs::read_to_string(tools.path().join("passes.txt")).unwrap();
        assert_eq!(journal, "1\n2\n1\n2\n");
    }

    #[tokio::test]
    async fn test_final_pass_failure_carries_stderr_and_cleans_up() {
        let tools = TempDir::new().unwrap();
        let media = TempDir::new().unwrap();
        let source = sized_file(&media, "talk.mp4", MAX_FILE_SIZE_BYTES + 1);

        let result = TwoPassCompressor::new(Arc::new(TokioProcessAdapter::new()))
            .with_binaries(ffmpeg(tools.path(), 2, 1), ffprobe(tools.path(), "600.0"))
            .compress_for_dubbing(&source, &CancellationToken::new())
            .await;

        match result {
            Err(DubForgeError::CompressionFailed { pass, stderr }) => {
                assert_eq!(pass, EncodePass::Final);
                assert!(stderr.contains("encoder exploded on pass 2"));
            }
            other => panic!("expected pass 2 failure, got {:?}", other),
        }
        assert!(passlogs_left(media.path()).is_empty());
        assert!(!media.path().join("talk_compressed.mp4").exists());
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_unparsable_probe_output() {
        let tools = TempDir::new().unwrap();
        let media = TempDir::new().unwrap();
        let source = sized_file(&media, "talk.mp4", MAX_FILE_SIZE_BYTES + 1);

        let result = TwoPassCompressor::new(Arc::new(TokioProcessAdapter::new()))
            .with_binaries(ffmpeg(tools.path(), 0, 0), ffprobe(tools.path(), "N/A"))
            .compress_for_dubbing(&source, &CancellationToken::new())
            .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("talk.mp4"));
        assert!(matches!(err.root(), DubForgeError::ProbeParse { .. }));
        assert!(!tools.path().join("passes.txt").exists());
    }

    #[tokio::test]
    async fn test_cancelled_analysis_pass_removes_unfinished_stats() {
        let tools = TempDir::new().unwrap();
        let media = TempDir::new().unwrap();
        let source = sized_file(&media, "talk.mp4", MAX_FILE_SIZE_BYTES + 1);
        let cancel = CancellationToken::new();
        cancel_when_present(
            media.path().join("talk_passlog-0.log.mbtree.temp"),
            cancel.clone(),
        );

        let compressor = TwoPassCompressor::new(Arc::new(TokioProcessAdapter::new()))
            .with_binaries(stalling_ffmpeg(tools.path(), 1), ffprobe(tools.path(), "600.0"));
        let result = tokio::time::timeout(
            Duration::from_secs(30),
            compressor.compress_for_dubbing(&source, &cancel),
        )
        .await
        .expect("cancellation did not stop the encoder");

        assert!(matches!(result, Err(DubForgeError::Cancelled)));
        let leftovers = passlogs_left(media.path());
        assert!(leftovers.is_empty(), "left behind: {:?}", leftovers);
        assert!(!media.path().join("talk_compressed.mp4").exists());
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_cancelled_final_pass_removes_partial_output_and_passlogs() {
        let tools = TempDir::new().unwrap();
        let media = TempDir::new().unwrap();
        let source = sized_file(&media, "talk.mp4", MAX_FILE_SIZE_BYTES + 1);
        let output = media.path().join("talk_compressed.mp4");
        let cancel = CancellationToken::new();
        cancel_when_present(output.clone(), cancel.clone());

        let compressor = TwoPassCompressor::new(Arc::new(TokioProcessAdapter::new()))
            .with_binaries(stalling_ffmpeg(tools.path(), 2), ffprobe(tools.path(), "600.0"));
        let result = tokio::time::timeout(
            Duration::from_secs(30),
            compressor.compress_for_dubbing(&source, &cancel),
        )
        .await
        .expect("cancellation did not stop the encoder");

        assert!(matches!(result, Err(DubForgeError::Cancelled)));
        assert!(!output.exists());
        let leftovers = passlogs_left(media.path());
        assert!(leftovers.is_empty(), "left behind: {:?}", leftovers);
        assert_eq!(std::fs::metadata(&source).unwrap().len(), MAX_FILE_SIZE_BYTES + 1);
    }
}
