//! Transient two-pass log cleanup

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::utils::path::PathUtils;

/// Removes the pass log, its statistics file and their unfinished `.temp`
/// forms when dropped.
///
/// Runs on success, on a failed pass and on cancellation alike. Removal is
/// best-effort: a missing file is expected, any other failure is logged.
#[derive(Debug)]
pub struct PassLogGuard {
    files: [PathBuf; 4],
}

impl PassLogGuard {
    pub fn new(prefix: &Path) -> Self {
        Self {
            files: PathUtils::passlog_files(prefix),
        }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    fn remove_all(&self) {
        for file in &self.files {
            match std::fs::remove_file(file) {
                Ok(()) => debug!("Removed pass log {}", file.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove pass log {}: {}", file.display(), e),
            }
        }
    }
}

impl Drop for PassLogGuard {
    fn drop(&mut self) {
        self.remove_all();
    }
}
