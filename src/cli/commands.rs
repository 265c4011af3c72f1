//! Command implementations

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::adapters::toml_config::Settings;
use crate::cli::args::{CompressArgs, DownloadArgs, DubArgs, ProbeArgs, StatusArgs};
use crate::cli::Commands;
use crate::domain::model::{DubbingConfig, DubbingJob, DubbingStatus};
use crate::dubbing::DubbingClient;
use crate::engine::two_pass::needs_compression;
use crate::engine::TwoPassCompressor;
use crate::error::{DubForgeError, DubForgeResult};
use crate::ports::ProcessPort;
use crate::utils::{cancellable, Utils};

/// Everything a command needs besides its own arguments
pub struct CommandContext {
    settings: Settings,
    process: Arc<dyn ProcessPort>,
    cancel: CancellationToken,
}

impl CommandContext {
    pub fn new(settings: Settings, process: Arc<dyn ProcessPort>, cancel: CancellationToken) -> Self {
        Self {
            settings,
            process,
            cancel,
        }
    }

    fn compressor(&self) -> TwoPassCompressor {
        TwoPassCompressor::new(Arc::clone(&self.process))
            .with_binaries(&self.settings.ffmpeg_path, &self.settings.ffprobe_path)
    }

    fn client(&self, config: DubbingConfig) -> DubForgeResult<DubbingClient> {
        let api_key = self.settings.require_api_key()?;
        DubbingClient::new(api_key, config, self.compressor())?.with_base_url(&self.settings.base_url)
    }
}

/// Execute a parsed command
pub async fn run(ctx: &CommandContext, command: Commands) -> Result<()> {
    match command {
        Commands::Probe(args) => probe(ctx, args).await,
        Commands::Compress(args) => compress(ctx, args).await,
        Commands::Dub(args) => dub(ctx, args).await,
        Commands::Status(args) => status(ctx, args).await,
        Commands::Download(args) => download(ctx, args).await,
    }
}

/// Execute the probe command
pub async fn probe(ctx: &CommandContext, args: ProbeArgs) -> Result<()> {
    let compressor = ctx.compressor();
    let info = compressor.inspector().inspect(&args.input, &ctx.cancel).await?;

    if args.json {
        let json = serde_json::to_string_pretty(&info).context("Failed to serialize probe result")?;
        println!("{}", json);
        return Ok(());
    }

    println!("File: {}", info.path.display());
    println!(
        "Duration: {:.3}s ({})",
        info.duration,
        Utils::format_duration(Duration::try_from_secs_f64(info.duration).unwrap_or_default())
    );
    println!("Size: {} ({} bytes)", Utils::format_file_size(info.size), info.size);
    if info.has_dimensions() {
        println!("Resolution: {}x{}", info.width, info.height);
    } else {
        println!("Resolution: unknown");
    }
    println!(
        "Needs compression: {}",
        if needs_compression(&info.path).await? { "yes" } else { "no" }
    );
    Ok(())
}

/// Execute the compress command
pub async fn compress(ctx: &CommandContext, args: CompressArgs) -> Result<()> {
    let compressor = ctx.compressor();

    if args.dry_run {
        if !needs_compression(&args.input).await? {
            println!("{} is within the upload limit; nothing to do", args.input.display());
            return Ok(());
        }
        let (info, params) = compressor
            .plan_for(&args.input, &ctx.cancel)
            .await
            .with_context(|| format!("Failed to plan compression of {}", args.input.display()))?;
        println!("Duration: {:.3}s", info.duration);
        println!("Video bitrate: {} bps", params.video_bitrate);
        println!("Scale to 1080p: {}", if params.use_1080p { "yes" } else { "no" });
        return Ok(());
    }

    let output = compressor
        .compress_for_dubbing(&args.input, &ctx.cancel)
        .await
        .with_context(|| format!("Failed to compress {}", args.input.display()))?;

    if output == args.input {
        println!("{} is within the upload limit; nothing to do", args.input.display());
    } else {
        println!("{}", output.display());
    }
    Ok(())
}

/// Execute the dub command
pub async fn dub(ctx: &CommandContext, args: DubArgs) -> Result<()> {
    let config = args
        .dubbing_config(&ctx.settings.dubbing)
        .map_err(anyhow::Error::msg)?;
    let client = ctx.client(config)?;

    let submitted = if args.is_url() {
        client
            .create_dub_from_url(&args.input, &args.source_lang, &args.target_lang, &ctx.cancel)
            .await
    } else {
        client
            .create_dub_from_file(
                Path::new(&args.input),
                &args.source_lang,
                &args.target_lang,
                &ctx.cancel,
            )
            .await
    };
    let job = submitted.with_context(|| format!("Failed to submit {} for dubbing", args.input))?;

    print_job(&job);

    if !args.wait {
        return Ok(());
    }

    let finished = wait_for_completion(
        &client,
        &job.id,
        Duration::from_secs(args.poll_interval),
        &ctx.cancel,
    )
    .await?;

    if finished.status == DubbingStatus::Failed {
        return Err(DubForgeError::DubbingFailed {
            id: finished.id,
            message: finished.error,
        }
        .into());
    }
    println!("Dubbing {} finished", finished.id);

    if let Some(output) = args.output {
        let bytes = client
            .download_dubbed_audio(&finished.id, &args.target_lang, &output, &ctx.cancel)
            .await
            .with_context(|| format!("Failed to download dubbing {}", finished.id))?;
        println!("Wrote {} to {}", Utils::format_file_size(bytes), output.display());
    }
    Ok(())
}

/// Execute the status command
pub async fn status(ctx: &CommandContext, args: StatusArgs) -> Result<()> {
    let client = ctx.client(ctx.settings.dubbing.clone())?;
    let job = client
        .get_dubbing_status(&args.id, &ctx.cancel)
        .await
        .with_context(|| format!("Failed to fetch dubbing {}", args.id))?;
    print_job(&job);
    Ok(())
}

/// Execute the download command
pub async fn download(ctx: &CommandContext, args: DownloadArgs) -> Result<()> {
    let client = ctx.client(ctx.settings.dubbing.clone())?;
    let bytes = client
        .download_dubbed_audio(&args.id, &args.lang, &args.output, &ctx.cancel)
        .await
        .with_context(|| format!("Failed to download dubbing {}", args.id))?;
    println!("Wrote {} to {}", Utils::format_file_size(bytes), args.output.display());
    Ok(())
}

/// Poll a job until it reaches a terminal state.
///
/// Polling is a caller concern; the client itself never retries.
async fn wait_for_completion(
    client: &DubbingClient,
    id: &str,
    interval: Duration,
    cancel: &CancellationToken,
) -> DubForgeResult<DubbingJob> {
    loop {
        cancellable(cancel, async {
            tokio::time::sleep(interval).await;
            Ok(())
        })
        .await?;

        let job = client.get_dubbing_status(id, cancel).await?;
        info!(id = %job.id, status = %job.status, "Polled dubbing job");
        if job.status.is_terminal() {
            return Ok(job);
        }
    }
}

fn print_job(job: &DubbingJob) {
    println!("Dubbing ID: {}", job.id);
    println!("Status: {}", job.status);
    if !job.target_languages.is_empty() {
        println!("Target languages: {}", job.target_languages.join(", "));
    }
    if let Some(expected) = job.expected_duration_sec {
        println!("Expected processing time: {:.0}s", expected);
    }
    if let Some(error) = &job.error {
        println!("Error: {}", error);
    }
}
