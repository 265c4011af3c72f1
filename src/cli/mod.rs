//! CLI module for DubForge
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::adapters::tracing_log::LogFormat;
use crate::config_initialization::CliOverrides;

pub mod args;
pub mod commands;

/// DubForge
///
/// Fits videos under a dubbing service's upload ceiling and drives remote
/// dubbing jobs.
#[derive(Parser, Debug)]
#[command(name = "dubforge")]
#[command(about = "DubForge - Compress, submit and retrieve video dubbing jobs")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Settings file (TOML or YAML)
    #[arg(long, global = true, env = "DUBFORGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level (off, error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Dubbing API key
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Dubbing API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Encoder binary
    #[arg(long, global = true)]
    pub ffmpeg: Option<String>,

    /// Inspection binary
    #[arg(long, global = true)]
    pub ffprobe: Option<String>,

    /// Cheaper submissions: watermarked, normal resolution
    #[arg(long, global = true)]
    pub test_mode: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Command-line layer of the settings hierarchy
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            ffmpeg_path: self.ffmpeg.clone(),
            ffprobe_path: self.ffprobe.clone(),
            log_level: self.log_level.clone(),
            log_format: self.log_format,
            test_mode: self.test_mode,
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show duration, size and resolution of a video
    Probe(args::ProbeArgs),
    /// Compress a video to fit under the upload limit
    Compress(args::CompressArgs),
    /// Submit a video file or URL for dubbing
    Dub(args::DubArgs),
    /// Show the state of a dubbing job
    Status(args::StatusArgs),
    /// Download the dubbed media of a finished job
    Download(args::DownloadArgs),
}
