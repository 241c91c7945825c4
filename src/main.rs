//! CLI entry point for the videos downloader.

use std::fs;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use videos_downloader_core::config::{DEFAULT_DOWNLOAD_DIR, DEFAULT_URLS_FILE};
use videos_downloader_core::request::{parse_requests, read_request_lines};
use videos_downloader_core::{
    BatchReport, Configuration, DownloadEngine, Downloader, EncoderSelector, SystemGpuProbe,
    SystemToolRunner, ToolPaths, ToolRunner,
};

mod app_config;
mod cli;
mod progress;

use app_config::{FileConfig, load_default_file_config};
use cli::Args;

/// Process exit outcome for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessExit {
    Success,
    Partial,
    Failure,
}

impl ProcessExit {
    fn code(self) -> ExitCode {
        match self {
            Self::Success => ExitCode::SUCCESS,
            Self::Partial => ExitCode::from(2),
            Self::Failure => ExitCode::FAILURE,
        }
    }
}

/// Maps completion/failure counts to the process exit outcome.
fn determine_exit_outcome(completed: usize, failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else if completed > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    match run(args).await {
        Ok(exit) => exit.code(),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ProcessExit::Failure.code()
        }
    }
}

async fn run(args: Args) -> Result<ProcessExit> {
    let loaded = load_default_file_config()?;
    let file_config = loaded.config.clone().unwrap_or_default();

    init_tracing(&args, &file_config);
    debug!(?args, config_path = ?loaded.path, from_file = loaded.config.is_some(), "configuration sources");

    let config = Arc::new(resolve_configuration(&args, &file_config));
    info!(
        urls_file = %config.urls_file.display(),
        download_dir = %config.download_dir.display(),
        fast_mode = config.fast_mode,
        clip_strategy = %config.clip_strategy,
        "videos downloader starting"
    );

    fs::create_dir_all(&config.download_dir).with_context(|| {
        format!(
            "error creating download directory '{}'",
            config.download_dir.display()
        )
    })?;

    let lines = read_request_lines(&config.urls_file)
        .context("Error reading urls from file")?;
    let parsed = parse_requests(&lines);
    if parsed.is_empty() {
        info!("No requests found in the URL list");
        return Ok(ProcessExit::Success);
    }

    let runner: Arc<dyn ToolRunner> = Arc::new(SystemToolRunner::new());
    let selector = EncoderSelector::new(
        Arc::clone(&runner),
        Arc::new(SystemGpuProbe::new(Arc::clone(&runner))),
        config.tools.ffmpeg.clone(),
    );
    let encoder = selector.select(config.fast_mode).await;

    let show_progress = !args.quiet && !args.json && std::io::stderr().is_terminal();
    let bar = progress::batch_progress(show_progress, parsed.requests.len());

    let engine = DownloadEngine::new(Downloader::new(Arc::clone(&config), runner), encoder)
        .with_degraded_retry(!args.no_retry)
        .on_complete(progress::completion_hook(&bar));

    let report = engine.run_batch(parsed.requests).await;
    bar.finish_and_clear();

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize report")?
        );
    } else {
        print_summary(&report);
    }

    Ok(determine_exit_outcome(report.completed, report.failed))
}

fn init_tracing(args: &Args, file_config: &FileConfig) {
    // Priority: RUST_LOG env var > CLI flags > config file verbosity > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => file_config.verbosity.map_or("info", |v| v.filter()),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Command line values win over file values, which win over defaults.
fn resolve_configuration(args: &Args, file: &FileConfig) -> Configuration {
    let defaults = ToolPaths::default();
    Configuration {
        urls_file: args
            .urls
            .clone()
            .or_else(|| file.urls_file.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_URLS_FILE)),
        download_dir: args
            .path
            .clone()
            .or_else(|| file.download_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR)),
        fast_mode: args.fast || file.fast.unwrap_or(false),
        clip_strategy: args
            .clip_strategy
            .or(file.clip_strategy)
            .unwrap_or_default(),
        tools: ToolPaths {
            yt_dlp: args
                .yt_dlp
                .clone()
                .or_else(|| file.yt_dlp.clone())
                .unwrap_or(defaults.yt_dlp),
            ffmpeg: args
                .ffmpeg
                .clone()
                .or_else(|| file.ffmpeg.clone())
                .unwrap_or(defaults.ffmpeg),
        },
    }
}

fn print_summary(report: &BatchReport) {
    for outcome in report.failures() {
        warn!(
            url = %outcome.request.url(),
            attempts = outcome.attempts,
            "{}",
            outcome.error_detail.as_deref().unwrap_or("download failed")
        );
    }
    info!(
        completed = report.completed,
        failed = report.failed,
        retried = report.retried,
        total = report.total(),
        "All downloads completed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use videos_downloader_core::ClipStrategy;

    #[test]
    fn test_exit_outcome_success_when_no_failures() {
        assert_eq!(determine_exit_outcome(3, 0), ProcessExit::Success);
        assert_eq!(determine_exit_outcome(0, 0), ProcessExit::Success);
    }

    #[test]
    fn test_exit_outcome_partial_when_mixed() {
        assert_eq!(determine_exit_outcome(2, 1), ProcessExit::Partial);
    }

    #[test]
    fn test_exit_outcome_failure_when_all_failed() {
        assert_eq!(determine_exit_outcome(0, 2), ProcessExit::Failure);
    }

    #[test]
    fn test_resolve_configuration_defaults() {
        let args = Args::try_parse_from(["videos-downloader"]).unwrap();
        let config = resolve_configuration(&args, &FileConfig::default());
        assert_eq!(config, Configuration::default());
    }

    #[test]
    fn test_resolve_configuration_cli_overrides_file() {
        let args = Args::try_parse_from([
            "videos-downloader",
            "--path",
            "cli-dir",
            "--clip-strategy",
            "probe-then-transcode",
        ])
        .unwrap();
        let file = FileConfig {
            download_dir: Some(PathBuf::from("file-dir")),
            clip_strategy: Some(ClipStrategy::DirectSection),
            fast: Some(true),
            ffmpeg: Some(PathBuf::from("/opt/ffmpeg")),
            ..FileConfig::default()
        };

        let config = resolve_configuration(&args, &file);
        assert_eq!(config.download_dir, PathBuf::from("cli-dir"));
        assert_eq!(config.clip_strategy, ClipStrategy::ProbeThenTranscode);
        assert!(config.fast_mode, "fast from file applies when flag absent");
        assert_eq!(config.tools.ffmpeg, PathBuf::from("/opt/ffmpeg"));
    }
}
