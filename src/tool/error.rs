//! Error types for external tool execution.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that prevent an external tool from producing an exit status.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The process could not be started (missing binary, permissions, ...).
    #[error("failed to launch {program}: {source}")]
    Launch {
        /// Program that failed to start.
        program: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    /// Creates a launch error.
    pub fn launch(program: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Launch {
            program: program.into(),
            source,
        }
    }
}
