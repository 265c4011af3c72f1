// File config adapter - Settings loaded from TOML or YAML files

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::adapters::tracing_log::LoggingConfig;
use crate::domain::model::DubbingConfig;
use crate::dubbing::DEFAULT_BASE_URL;
use crate::engine::DEFAULT_FFMPEG;
use crate::error::{DubForgeError, DubForgeResult};
use crate::probe::inspector::DEFAULT_FFPROBE;

/// Files searched, in order, when no config path is given
pub const DEFAULT_CONFIG_PATHS: &[&str] = &["dubforge.toml", "config/dubforge.toml"];

/// Application settings
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Key for the remote dubbing API
    pub api_key: Option<String>,
    pub base_url: String,
    /// Encoder binary, resolved via `PATH` when not absolute
    pub ffmpeg_path: String,
    /// Inspection binary, resolved via `PATH` when not absolute
    pub ffprobe_path: String,
    pub dubbing: DubbingConfig,
    pub logging: LoggingConfig,
    /// File the settings were read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            ffmpeg_path: DEFAULT_FFMPEG.to_string(),
            ffprobe_path: DEFAULT_FFPROBE.to_string(),
            dubbing: DubbingConfig::default(),
            logging: LoggingConfig::default(),
            source: None,
        }
    }
}

// Keeps the API key out of logs
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("ffmpeg_path", &self.ffmpeg_path)
            .field("ffprobe_path", &self.ffprobe_path)
            .field("dubbing", &self.dubbing)
            .field("logging", &self.logging)
            .field("source", &self.source)
            .finish()
    }
}

impl Settings {
    /// API key, required by every command that talks to the remote API
    pub fn require_api_key(&self) -> DubForgeResult<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| DubForgeError::Config {
                message: "no API key configured (use --api-key, DUBFORGE_API_KEY or api_key in the config file)"
                    .to_string(),
            })
    }
}

/// Supported settings file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// Format implied by the file extension; anything but yaml/yml is TOML
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Toml,
        }
    }
}

/// Reads settings files
pub struct FileConfigAdapter;

impl FileConfigAdapter {
    /// Parse settings text in the given format
    pub fn parse(content: &str, format: ConfigFormat) -> DubForgeResult<Settings> {
        match format {
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| DubForgeError::Config {
                message: format!("invalid TOML settings: {}", e),
            }),
            ConfigFormat::Yaml => {
                if content.trim().is_empty() {
                    return Ok(Settings::default());
                }
                serde_yaml::from_str(content).map_err(|e| DubForgeError::Config {
                    message: format!("invalid YAML settings: {}", e),
                })
            }
        }
    }

    /// Load settings from `path`
    pub fn load(path: &Path) -> DubForgeResult<Settings> {
        let content = std::fs::read_to_string(path).map_err(|e| DubForgeError::Config {
            message: format!("cannot read config file {}: {}", path.display(), e),
        })?;

        let mut settings = Self::parse(&content, ConfigFormat::from_path(path))?;
        settings.source = Some(path.to_path_buf());
        Ok(settings)
    }

    /// First default config file that exists under `root`
    pub fn discover(root: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_PATHS
            .iter()
            .map(|candidate| root.join(candidate))
            .find(|path| path.is_file())
    }
}
