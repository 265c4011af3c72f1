// Domain rules - Business logic and policies

use crate::domain::model::*;
use crate::planner::MAX_FILE_SIZE_BYTES;

/// Upload ceiling policy of the remote dubbing service
pub struct UploadSizeRule;

impl UploadSizeRule {
    /// A file must be re-encoded only when it is strictly larger than the ceiling
    pub fn needs_compression(size_bytes: u64) -> bool {
        size_bytes > MAX_FILE_SIZE_BYTES
    }
}

/// Fields every dubbing submission carries, independent of the media source
pub struct SubmissionRules;

impl SubmissionRules {
    /// Build the text fields of a submission in wire order.
    ///
    /// `source_lang`, `start_time` and `end_time` are omitted when unset.
    pub fn form_fields(
        config: &DubbingConfig,
        source_lang: &str,
        target_lang: &str,
    ) -> Vec<(&'static str, String)> {
        let mut fields = vec![("target_lang", target_lang.to_string())];

        if !source_lang.is_empty() {
            fields.push(("source_lang", source_lang.to_string()));
        }

        fields.push(("num_speakers", config.effective_num_speakers().to_string()));
        fields.push((
            "drop_background_audio",
            config.drop_background_audio.to_string(),
        ));
        fields.push(("watermark", config.watermark().to_string()));
        fields.push(("highest_resolution", config.highest_resolution().to_string()));

        if config.start_time > 0 {
            fields.push(("start_time", config.start_time.to_string()));
        }
        if config.end_time > 0 {
            fields.push(("end_time", config.end_time.to_string()));
        }

        fields
    }
}

#[cfg(test)]
mod tests;
