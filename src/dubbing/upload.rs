//! Streaming multipart file upload
//!
//! A producer task copies the file into one end of an in-memory pipe while the
//! HTTP request reads the other end as its body. The producer's outcome comes
//! back through its join handle once the round trip is over, so a read failure
//! in the middle of the file is reported instead of being mistaken for EOF.

use std::path::Path;

use reqwest::multipart::Part;
use reqwest::Body;
use tokio::io::{AsyncRead, AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::error::{DubForgeError, DubForgeResult};

/// Bytes buffered between the producer and the request body
const PIPE_CAPACITY: usize = 256 * 1024;

/// Fallback MIME type for unknown extensions
pub const OCTET_STREAM: &str = "application/octet-stream";

/// MIME type of an upload, chosen from its extension
pub fn mime_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("webm") => "video/webm",
        Some("avi") => "video/x-msvideo",
        _ => OCTET_STREAM,
    }
}

/// Completion signal of an upload producer.
///
/// Dropping it without calling [`UploadCompletion::wait`] aborts the producer.
#[derive(Debug)]
pub struct UploadCompletion {
    handle: Option<JoinHandle<DubForgeResult<u64>>>,
}

impl UploadCompletion {
    /// Wait for the producer after a successful round trip and return the
    /// number of bytes it copied.
    pub async fn wait(mut self) -> DubForgeResult<u64> {
        let Some(handle) = self.handle.take() else {
            return Err(DubForgeError::Upload {
                message: "upload producer already consumed".to_string(),
            });
        };

        match handle.await {
            Ok(result) => result,
            Err(e) => Err(DubForgeError::Upload {
                message: format!("upload producer ended abnormally: {}", e),
            }),
        }
    }

    /// Pick the error to report after the request itself failed.
    ///
    /// A producer that already finished with an error is the root cause and
    /// wins. A producer still running is aborted and `send_error` is returned.
    pub async fn settle(mut self, send_error: DubForgeError) -> DubForgeError {
        let Some(handle) = self.handle.take() else {
            return send_error;
        };

        if matches!(send_error, DubForgeError::Cancelled) || !handle.is_finished() {
            handle.abort();
            return send_error;
        }

        match handle.await {
            Ok(Err(producer_error)) => {
                warn!("Upload producer failed before the request: {}", producer_error);
                producer_error
            }
            _ => send_error,
        }
    }
}

impl Drop for UploadCompletion {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Spawn a producer copying `reader` into a pipe; returns the read end
pub fn spawn_producer<R>(reader: R) -> (DuplexStream, UploadCompletion)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (mut writer, read_half) = tokio::io::duplex(PIPE_CAPACITY);

    let handle = tokio::spawn(async move {
        let mut reader = reader;
        let copied = tokio::io::copy(&mut reader, &mut writer)
            .await
            .map_err(|e| DubForgeError::Upload {
                message: format!("copying file into request body: {}", e),
            })?;
        writer.shutdown().await.map_err(|e| DubForgeError::Upload {
            message: format!("closing request body: {}", e),
        })?;
        debug!(copied, "Upload producer finished");
        Ok(copied)
    });

    (
        read_half,
        UploadCompletion {
            handle: Some(handle),
        },
    )
}

/// Build a streamed multipart part for the file at `path`
pub async fn file_part(path: &Path) -> DubForgeResult<(Part, UploadCompletion)> {
    let file = tokio::fs::File::open(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DubForgeError::file_not_found(path)
        } else {
            DubForgeError::io(format!("open {}", path.display()), e)
        }
    })?;
    let length = file
        .metadata()
        .await
        .map_err(|e| DubForgeError::io(format!("stat {}", path.display()), e))?
        .len();

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video.mp4".to_string());

    let (read_half, completion) = spawn_producer(file);
    let body = Body::wrap_stream(ReaderStream::new(read_half));
    let part = Part::stream_with_length(body, length)
        .file_name(file_name)
        .mime_str(mime_for(path))
        .map_err(|e| DubForgeError::http("build file part", e))?;

    debug!(path = %path.display(), length, "Prepared streamed upload");
    Ok((part, completion))
}
