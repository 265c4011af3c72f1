//! Common utilities and helpers

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{DubForgeError, DubForgeResult};

pub mod path;

/// Utility functions for DubForge
pub struct Utils;

impl Utils {
    /// Format duration for display
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            format!("{:02}:{:02}", minutes, seconds)
        }
    }

    /// Format file size for display
    pub fn format_file_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}

/// Size of a file, mapping a missing path to `FileNotFound`
pub async fn file_size(path: &Path) -> DubForgeResult<u64> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(metadata.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DubForgeError::file_not_found(path)),
        Err(e) => Err(DubForgeError::io(format!("stat {}", path.display()), e)),
    }
}

/// Race `fut` against `cancel`; the future is dropped on cancellation
pub async fn cancellable<F, T>(cancel: &CancellationToken, fut: F) -> DubForgeResult<T>
where
    F: Future<Output = DubForgeResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DubForgeError::Cancelled),
        result = fut => result,
    }
}
