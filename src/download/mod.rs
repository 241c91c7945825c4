//! Download execution: command synthesis, process execution, and batch
//! orchestration.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use videos_downloader_core::config::Configuration;
//! use videos_downloader_core::download::Downloader;
//! use videos_downloader_core::encoder::EncoderChoice;
//! use videos_downloader_core::request::parse_request;
//! use videos_downloader_core::tool::SystemToolRunner;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = Downloader::new(
//!     Arc::new(Configuration::default()),
//!     Arc::new(SystemToolRunner::new()),
//! );
//! let request = parse_request("https://example.com/watch?v=id 00:00:10-00:01:40")?;
//! downloader.download(&request, &EncoderChoice::StreamCopy).await?;
//! # Ok(())
//! # }
//! ```

mod command;
mod downloader;
mod engine;
mod error;
mod filename;

pub use command::{
    ClipStrategy, CommandBuilder, DownloadPlan, MediaProbe, MediaSources, parse_probe_output,
};
pub use downloader::{AttemptMode, DownloadOutcome, Downloader};
pub use engine::{BatchReport, CompletionHook, DownloadEngine, DownloadStats};
pub use error::DownloadError;
pub use filename::sanitize_filename;

// Note: no module-local Result alias; signatures spell out
// `Result<T, DownloadError>`.
