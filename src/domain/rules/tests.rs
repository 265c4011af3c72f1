// Unit tests for business rules

use super::*;

fn field<'a>(fields: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.as_str())
}

#[test]
fn test_exact_ceiling_is_not_over_the_limit() {
    assert!(!UploadSizeRule::needs_compression(1 << 30));
    assert!(UploadSizeRule::needs_compression((1 << 30) + 1));
    assert!(!UploadSizeRule::needs_compression(0));
}

#[test]
fn test_form_fields_production_mode() {
    let config = DubbingConfig::default();
    let fields = SubmissionRules::form_fields(&config, "en", "es");

    assert_eq!(field(&fields, "target_lang"), Some("es"));
    assert_eq!(field(&fields, "source_lang"), Some("en"));
    assert_eq!(field(&fields, "num_speakers"), Some("1"));
    assert_eq!(field(&fields, "drop_background_audio"), Some("false"));
    assert_eq!(field(&fields, "watermark"), Some("false"));
    assert_eq!(field(&fields, "highest_resolution"), Some("true"));
    assert_eq!(field(&fields, "start_time"), None);
    assert_eq!(field(&fields, "end_time"), None);
}

#[test]
fn test_form_fields_test_mode() {
    let config = DubbingConfig {
        test_mode: true,
        ..Default::default()
    };
    let fields = SubmissionRules::form_fields(&config, "", "de");

    assert_eq!(field(&fields, "watermark"), Some("true"));
    assert_eq!(field(&fields, "highest_resolution"), Some("false"));
    assert_eq!(field(&fields, "source_lang"), None);
}

#[test]
fn test_form_fields_optional_range_and_speakers() {
    let config = DubbingConfig {
        start_time: 30,
        end_time: 90,
        num_speakers: 0,
        drop_background_audio: true,
        ..Default::default()
    };
    let fields = SubmissionRules::form_fields(&config, "en", "fr");

    assert_eq!(field(&fields, "start_time"), Some("30"));
    assert_eq!(field(&fields, "end_time"), Some("90"));
    assert_eq!(field(&fields, "num_speakers"), Some("1"));
    assert_eq!(field(&fields, "drop_background_audio"), Some("true"));
}

#[test]
fn test_form_fields_omit_negative_times() {
    let config = DubbingConfig {
        start_time: -5,
        end_time: 0,
        ..Default::default()
    };
    let fields = SubmissionRules::form_fields(&config, "en", "fr");
    assert_eq!(field(&fields, "start_time"), None);
    assert_eq!(field(&fields, "end_time"), None);
}

#[test]
fn test_target_lang_comes_first() {
    let fields = SubmissionRules::form_fields(&DubbingConfig::default(), "en", "ja");
    assert_eq!(fields[0].0, "target_lang");
}
