//! Batch configuration.
//!
//! A [`Configuration`] is assembled once by the entry point and then shared
//! read-only (behind an `Arc`) by every task of the batch. Per-attempt
//! overrides such as the degraded-mode retry never write back into it.

use std::path::PathBuf;

use serde::Serialize;

use crate::download::ClipStrategy;
use crate::tool::ToolPaths;

/// Default URL list file name.
pub const DEFAULT_URLS_FILE: &str = "urls.txt";

/// Default download directory, relative to the working directory.
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

/// Immutable settings for one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Configuration {
    /// File holding one request per line.
    pub urls_file: PathBuf,
    /// Directory downloads are written to.
    pub download_dir: PathBuf,
    /// Copy streams instead of re-encoding clips. When set, `DownloadEngine`
    /// uses stream copy regardless of the encoder it is given.
    pub fast_mode: bool,
    /// How clip requests are fetched.
    pub clip_strategy: ClipStrategy,
    /// Locations of the external tools.
    pub tools: ToolPaths,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            urls_file: PathBuf::from(DEFAULT_URLS_FILE),
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            fast_mode: false,
            clip_strategy: ClipStrategy::default(),
            tools: ToolPaths::default(),
        }
    }
}
