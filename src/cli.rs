//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use videos_downloader_core::ClipStrategy;

/// Batch download videos and clips listed in a text file.
///
/// Each line of the URL list is either a URL (full video) or a URL followed
/// by an HH:MM:SS-HH:MM:SS range (clip).
#[derive(Parser, Debug)]
#[command(name = "videos-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// File with one request per line [default: urls.txt]
    #[arg(long, value_name = "FILE")]
    pub urls: Option<PathBuf>,

    /// Download directory [default: downloads]
    #[arg(long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Fast mode: copy streams without re-encoding. Much faster, but clips
    /// may start slightly early or open on frozen frames
    #[arg(long)]
    pub fast: bool,

    /// How clips are fetched: probe-then-transcode or direct-section
    #[arg(long, value_name = "STRATEGY")]
    pub clip_strategy: Option<ClipStrategy>,

    /// Path to the yt-dlp executable
    #[arg(long = "yt-dlp", value_name = "PATH")]
    pub yt_dlp: Option<PathBuf>,

    /// Path to the ffmpeg executable
    #[arg(long, value_name = "PATH")]
    pub ffmpeg: Option<PathBuf>,

    /// Do not retry failed downloads in fast mode
    #[arg(long)]
    pub no_retry: bool,

    /// Print the batch report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}
