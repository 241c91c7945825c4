//! Process runners.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, trace};

use super::error::ToolError;
use super::invocation::{ToolInvocation, ToolOutput};

/// Runs an external tool to completion and captures its output.
///
/// Implementations must only block the calling task, never the runtime.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Runs the invocation and returns its exit status and output.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Launch`] if the process could not be started.
    /// A non-zero exit is not an error at this level.
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError>;
}

/// Runs tools as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemToolRunner;

impl SystemToolRunner {
    /// Creates a runner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolRunner for SystemToolRunner {
    #[instrument(level = "debug", skip(self, invocation), fields(program = %invocation.program().display()))]
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        trace!(command = %invocation, "spawning");

        let output = Command::new(invocation.program())
            .args(invocation.arguments())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ToolError::launch(invocation.program(), e))?;

        let result = ToolOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(exit_code = ?result.exit_code, "process exited");
        Ok(result)
    }
}
