//! Videos Downloader Core Library
//!
//! Batch downloads of full videos and clips, delegated to `yt-dlp` for
//! fetching and `ffmpeg` for cutting and encoding.
//!
//! # Architecture
//!
//! - [`request`] - Input line parsing and clip range resolution
//! - [`tool`] - External process invocation
//! - [`encoder`] - Hardware encoder detection and verification
//! - [`download`] - Command synthesis, execution, and batch orchestration
//! - [`config`] - Batch configuration

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod encoder;
pub mod request;
pub mod tool;

// Re-export commonly used types
pub use config::Configuration;
pub use download::{
    BatchReport, ClipStrategy, CommandBuilder, DownloadEngine, DownloadError, DownloadOutcome,
    Downloader, sanitize_filename,
};
pub use encoder::{EncoderChoice, EncoderSelector, GpuVendor, SystemGpuProbe};
pub use request::{RequestError, ResolvedTiming, VideoRequest, parse_request, resolve_clip_range};
pub use tool::{SystemToolRunner, ToolInvocation, ToolOutput, ToolPaths, ToolRunner};
