//! Path derivation for compression artifacts

use std::path::{Path, PathBuf};

/// Suffix appended to the source stem for the compressed file
pub const COMPRESSED_SUFFIX: &str = "_compressed";

/// Container of every compressed output
pub const COMPRESSED_EXTENSION: &str = "mp4";

/// Null sink the analysis pass writes to
pub const NULL_SINK: &str = if cfg!(windows) { "NUL" } else { "/dev/null" };

/// Path utilities for compression artifacts
pub struct PathUtils;

impl PathUtils {
    /// `<dir>/<stem>_compressed.mp4`, always beside the source
    pub fn compressed_output_path(source: &Path) -> PathBuf {
        let stem = Self::stem(source);
        Self::parent_dir(source).join(format!("{}{}.{}", stem, COMPRESSED_SUFFIX, COMPRESSED_EXTENSION))
    }

    /// Prefix handed to the encoder's `-passlogfile`, beside the source
    pub fn passlog_prefix(source: &Path) -> PathBuf {
        Self::parent_dir(source).join(format!("{}_passlog", Self::stem(source)))
    }

    /// Files the encoder writes for a given pass-log prefix: the log, its
    /// companion statistics file, and the `.temp` forms of both that exist
    /// until the analysis pass exits cleanly
    pub fn passlog_files(prefix: &Path) -> [PathBuf; 4] {
        let log = format!("{}-0.log", prefix.display());
        let stats = format!("{}.mbtree", log);
        [
            PathBuf::from(&log),
            PathBuf::from(&stats),
            PathBuf::from(format!("{}.temp", log)),
            PathBuf::from(format!("{}.temp", stats)),
        ]
    }

    /// Path to string for encoder arguments or logging
    pub fn to_arg(path: &Path) -> String {
        path.to_string_lossy().to_string()
    }

    fn stem(source: &Path) -> String {
        source
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string())
    }

    fn parent_dir(source: &Path) -> PathBuf {
        source
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compressed_output_path_replaces_extension() {
        let out = PathUtils::compressed_output_path(Path::new("/videos/talk.mov"));
        assert_eq!(out, PathBuf::from("/videos/talk_compressed.mp4"));
    }

    #[test]
    fn test_compressed_output_path_relative_source() {
        let out = PathUtils::compressed_output_path(Path::new("talk.mp4"));
        assert_eq!(out, PathBuf::from("talk_compressed.mp4"));
    }

    #[test]
    fn test_passlog_files_live_beside_source() {
        let prefix = PathUtils::passlog_prefix(Path::new("/videos/talk.mp4"));
        assert_eq!(prefix, PathBuf::from("/videos/talk_passlog"));
        let [log, stats, log_temp, stats_temp] = PathUtils::passlog_files(&prefix);
        assert_eq!(log, PathBuf::from("/videos/talk_passlog-0.log"));
        assert_eq!(stats, PathBuf::from("/videos/talk_passlog-0.log.mbtree"));
        assert_eq!(log_temp, PathBuf::from("/videos/talk_passlog-0.log.temp"));
        assert_eq!(stats_temp, PathBuf::from("/videos/talk_passlog-0.log.mbtree.temp"));
    }
}
