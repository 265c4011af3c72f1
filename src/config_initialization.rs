//! Configuration initialization and hierarchy management
//!
//! Precedence, highest first: command line, environment, settings file,
//! built-in defaults.

use std::path::{Path, PathBuf};

use crate::adapters::toml_config::{FileConfigAdapter, Settings};
use crate::adapters::tracing_log::LogFormat;
use crate::error::{DubForgeError, DubForgeResult};

pub const ENV_API_KEY: &str = "DUBFORGE_API_KEY";
pub const ENV_BASE_URL: &str = "DUBFORGE_BASE_URL";
pub const ENV_FFMPEG: &str = "DUBFORGE_FFMPEG";
pub const ENV_FFPROBE: &str = "DUBFORGE_FFPROBE";
pub const ENV_TEST_MODE: &str = "DUBFORGE_TEST_MODE";
pub const ENV_LOG_LEVEL: &str = "DUBFORGE_LOG_LEVEL";

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub ffmpeg_path: Option<String>,
    pub ffprobe_path: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    /// Only ever switches test mode on
    pub test_mode: bool,
}

/// Build settings from the process environment and the working directory
pub fn initialize_configuration_hierarchy(
    config_path: Option<&Path>,
    overrides: &CliOverrides,
) -> DubForgeResult<Settings> {
    let cwd = std::env::current_dir()
        .map_err(|e| DubForgeError::io("resolve working directory", e))?;
    resolve_settings(config_path, &cwd, overrides, |key| std::env::var(key).ok())
}

/// Build settings from explicit inputs.
///
/// An explicit `config_path` must exist. Without one, the default file names
/// are searched under `search_root` and defaults are used if none is found.
pub fn resolve_settings<F>(
    config_path: Option<&Path>,
    search_root: &Path,
    overrides: &CliOverrides,
    env: F,
) -> DubForgeResult<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = match config_file(config_path, search_root)? {
        Some(path) => FileConfigAdapter::load(&path)?,
        None => Settings::default(),
    };

    apply_environment(&mut settings, env)?;
    apply_cli_overrides(&mut settings, overrides);
    Ok(settings)
}

fn config_file(explicit: Option<&Path>, search_root: &Path) -> DubForgeResult<Option<PathBuf>> {
    match explicit {
        Some(path) if path.is_file() => Ok(Some(path.to_path_buf())),
        Some(path) => Err(DubForgeError::Config {
            message: format!("config file does not exist: {}", path.display()),
        }),
        None => Ok(FileConfigAdapter::discover(search_root)),
    }
}

fn apply_environment<F>(settings: &mut Settings, env: F) -> DubForgeResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| env(key).filter(|value| !value.trim().is_empty());

    if let Some(value) = lookup(ENV_API_KEY) {
        settings.api_key = Some(value);
    }
    if let Some(value) = lookup(ENV_BASE_URL) {
        settings.base_url = value;
    }
    if let Some(value) = lookup(ENV_FFMPEG) {
        settings.ffmpeg_path = value;
    }
    if let Some(value) = lookup(ENV_FFPROBE) {
        settings.ffprobe_path = value;
    }
    if let Some(value) = lookup(ENV_LOG_LEVEL) {
        settings.logging.level = value;
    }
    if let Some(value) = lookup(ENV_TEST_MODE) {
        settings.dubbing.test_mode = parse_flag(ENV_TEST_MODE, &value)?;
    }

    Ok(())
}

fn apply_cli_overrides(settings: &mut Settings, overrides: &CliOverrides) {
    if let Some(value) = &overrides.api_key {
        settings.api_key = Some(value.clone());
    }
    if let Some(value) = &overrides.base_url {
        settings.base_url = value.clone();
    }
    if let Some(value) = &overrides.ffmpeg_path {
        settings.ffmpeg_path = value.clone();
    }
    if let Some(value) = &overrides.ffprobe_path {
        settings.ffprobe_path = value.clone();
    }
    if let Some(value) = &overrides.log_level {
        settings.logging.level = value.clone();
    }
    if let Some(format) = overrides.log_format {
        settings.logging.format = format;
    }
    if overrides.test_mode {
        settings.dubbing.test_mode = true;
    }
}

fn parse_flag(name: &str, value: &str) -> DubForgeResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(DubForgeError::Config {
            message: format!("{} must be a boolean, got {:?}", name, other),
        }),
    }
}
