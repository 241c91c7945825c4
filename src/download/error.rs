//! Error types for the download module.
//!
//! Every variant is scoped to a single request. The external tools have no
//! structured error channel, so variants that come from a tool run carry its
//! combined output verbatim.

use std::path::PathBuf;

use thiserror::Error;

use crate::request::RequestError;

/// Errors that fail one download request.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The clip range could not be resolved into a start and duration.
    #[error("invalid clip range for {url}: {source}")]
    InvalidTimeRange {
        /// The request URL.
        url: String,
        /// The range error.
        #[source]
        source: RequestError,
    },

    /// The metadata probe failed or did not yield a title and a media URL.
    #[error("error getting ({url}) info: {reason}\nOutput: {output}")]
    MetadataProbeFailed {
        /// The request URL.
        url: String,
        /// What went wrong.
        reason: String,
        /// Combined output of the probe, untruncated.
        output: String,
    },

    /// A download or transcode process exited non-zero or could not start.
    #[error("error downloading ({url}): {program} {reason}\nOutput: {output}")]
    ProcessExecutionFailed {
        /// The request URL.
        url: String,
        /// Program that failed.
        program: PathBuf,
        /// Exit status or launch failure description.
        reason: String,
        /// Combined output of the process, untruncated.
        output: String,
    },
}

impl DownloadError {
    /// Creates an invalid time range error.
    pub fn invalid_time_range(url: impl Into<String>, source: RequestError) -> Self {
        Self::InvalidTimeRange {
            url: url.into(),
            source,
        }
    }

    /// Creates a metadata probe error.
    pub fn metadata_probe(
        url: impl Into<String>,
        reason: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self::MetadataProbeFailed {
            url: url.into(),
            reason: reason.into(),
            output: output.into(),
        }
    }

    /// Creates a process execution error.
    pub fn process(
        url: impl Into<String>,
        program: impl Into<PathBuf>,
        reason: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self::ProcessExecutionFailed {
            url: url.into(),
            program: program.into(),
            reason: reason.into(),
            output: output.into(),
        }
    }

    /// Captured tool output, when the failure came from a tool run.
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::InvalidTimeRange { .. } => None,
            Self::MetadataProbeFailed { output, .. } | Self::ProcessExecutionFailed { output, .. } => {
                Some(output)
            }
        }
    }

    /// Short kind label for reports.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidTimeRange { .. } => "invalid_time_range",
            Self::MetadataProbeFailed { .. } => "metadata_probe_failed",
            Self::ProcessExecutionFailed { .. } => "process_execution_failed",
        }
    }
}
