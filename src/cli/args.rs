//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;
use clap_num::number_range;

use crate::domain::model::DubbingConfig;

/// Longest accepted start/end offset, one week in seconds
const MAX_OFFSET_SECONDS: i64 = 7 * 24 * 3600;

fn parse_offset(s: &str) -> Result<i64, String> {
    number_range(s, 0, MAX_OFFSET_SECONDS)
}

fn parse_speakers(s: &str) -> Result<i32, String> {
    number_range(s, 0, 32)
}

fn parse_poll_interval(s: &str) -> Result<u64, String> {
    number_range(s, 1, 3600)
}

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the compress command
#[derive(Args, Debug)]
pub struct CompressArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Print the plan without encoding
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the dub command
#[derive(Args, Debug)]
pub struct DubArgs {
    /// Local video file or http(s) URL
    #[arg(short, long)]
    pub input: String,

    /// Language to dub into
    #[arg(short, long)]
    pub target_lang: String,

    /// Spoken language of the source, detected remotely when omitted
    #[arg(short, long, default_value = "")]
    pub source_lang: String,

    /// Start of the range to dub, in seconds
    #[arg(long, value_parser = parse_offset)]
    pub start_time: Option<i64>,

    /// End of the range to dub, in seconds
    #[arg(long, value_parser = parse_offset)]
    pub end_time: Option<i64>,

    /// Number of speakers (0 sends 1)
    #[arg(long, value_parser = parse_speakers)]
    pub num_speakers: Option<i32>,

    /// Remove background audio from the dub
    #[arg(long)]
    pub drop_background_audio: bool,

    /// Poll until the job reaches a terminal state
    #[arg(long)]
    pub wait: bool,

    /// Seconds between status polls
    #[arg(long, default_value = "10", value_parser = parse_poll_interval)]
    pub poll_interval: u64,

    /// Download the dub here once finished
    #[arg(short, long, requires = "wait")]
    pub output: Option<PathBuf>,
}

impl DubArgs {
    /// Whether the input names a remote URL rather than a local file
    pub fn is_url(&self) -> bool {
        let lower = self.input.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }

    /// Layer the per-command options over the configured submission settings
    pub fn dubbing_config(&self, base: &DubbingConfig) -> Result<DubbingConfig, String> {
        let mut config = base.clone();
        if let Some(start) = self.start_time {
            config.start_time = start;
        }
        if let Some(end) = self.end_time {
            config.end_time = end;
        }
        if let Some(speakers) = self.num_speakers {
            config.num_speakers = speakers;
        }
        if self.drop_background_audio {
            config.drop_background_audio = true;
        }

        if config.end_time > 0 && config.start_time >= config.end_time {
            return Err(format!(
                "start time {}s must be before end time {}s",
                config.start_time, config.end_time
            ));
        }
        Ok(config)
    }
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Dubbing job id
    #[arg(long)]
    pub id: String,
}

/// Arguments for the download command
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Dubbing job id
    #[arg(long)]
    pub id: String,

    /// Language of the dub to fetch
    #[arg(short, long)]
    pub lang: String,

    /// Destination file
    #[arg(short, long)]
    pub output: PathBuf,
}
