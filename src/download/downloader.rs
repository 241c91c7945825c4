//! Executes download plans and classifies the results.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use super::DownloadError;
use super::command::{CommandBuilder, DownloadPlan};
use crate::config::Configuration;
use crate::encoder::EncoderChoice;
use crate::request::{VideoRequest, describe_clip};
use crate::tool::ToolRunner;

/// Encoding mode an attempt ran under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptMode {
    /// Re-encode clips with the batch encoder.
    Normal,
    /// Copy streams without re-encoding.
    Fast,
}

impl AttemptMode {
    /// Mode implied by an encoder choice.
    #[must_use]
    pub fn of(encoder: &EncoderChoice) -> Self {
        if encoder.is_stream_copy() {
            Self::Fast
        } else {
            Self::Normal
        }
    }
}

impl fmt::Display for AttemptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => f.write_str("normal"),
            Self::Fast => f.write_str("fast"),
        }
    }
}

/// Final result for one request of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadOutcome {
    /// Position of the request in the input.
    pub index: usize,
    /// The request this outcome belongs to.
    pub request: VideoRequest,
    /// Whether the request was downloaded.
    pub success: bool,
    /// Mode of the last attempt.
    pub mode: AttemptMode,
    /// Number of attempts made (1, or 2 after a degraded-mode retry).
    pub attempts: u32,
    /// Error kind label of the last failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    /// Error message of the last failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    /// Untruncated tool output of the last attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined_output: Option<String>,
}

impl DownloadOutcome {
    /// Outcome of a successful attempt.
    #[must_use]
    pub fn succeeded(
        index: usize,
        request: VideoRequest,
        mode: AttemptMode,
        attempts: u32,
        output: String,
    ) -> Self {
        Self {
            index,
            request,
            success: true,
            mode,
            attempts,
            error_kind: None,
            error_detail: None,
            combined_output: (!output.is_empty()).then_some(output),
        }
    }

    /// Outcome of a failed attempt.
    #[must_use]
    pub fn failed(
        index: usize,
        request: VideoRequest,
        mode: AttemptMode,
        attempts: u32,
        error: &DownloadError,
    ) -> Self {
        Self {
            index,
            request,
            success: false,
            mode,
            attempts,
            error_kind: Some(error.kind()),
            error_detail: Some(error.to_string()),
            combined_output: error.output().map(ToString::to_string),
        }
    }
}

/// Builds and runs the tool invocations for single requests.
#[derive(Clone)]
pub struct Downloader {
    builder: CommandBuilder,
    runner: Arc<dyn ToolRunner>,
}

impl fmt::Debug for Downloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Downloader")
            .field("builder", &self.builder)
            .finish_non_exhaustive()
    }
}

impl Downloader {
    /// Creates a downloader that runs every tool through `runner`.
    #[must_use]
    pub fn new(config: Arc<Configuration>, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            builder: CommandBuilder::new(config, Arc::clone(&runner)),
            runner,
        }
    }

    /// The command builder in use.
    #[must_use]
    pub fn builder(&self) -> &CommandBuilder {
        &self.builder
    }

    /// Downloads one request with the given encoder choice.
    ///
    /// Returns the combined output of the tool runs on success.
    ///
    /// # Errors
    ///
    /// Any [`DownloadError`] from building or executing the plan.
    #[instrument(skip(self, request, encoder), fields(url = %request.url(), mode = %AttemptMode::of(encoder)))]
    pub async fn download(
        &self,
        request: &VideoRequest,
        encoder: &EncoderChoice,
    ) -> Result<String, DownloadError> {
        let plan = self.builder.build(request, encoder).await?;

        match request.clip_range().and_then(describe_clip) {
            Some(message) => info!(url = %request.url(), "{message}"),
            None => info!(url = %request.url(), "Downloading video"),
        }

        let output = self.execute(request.url(), &plan).await?;
        info!(url = %request.url(), "Download completed");
        Ok(output)
    }

    /// Runs every invocation of `plan` in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ProcessExecutionFailed`] when a process cannot
    /// be launched or exits non-zero; its output is kept verbatim.
    pub async fn execute(&self, url: &str, plan: &DownloadPlan) -> Result<String, DownloadError> {
        let mut combined = String::new();

        for invocation in plan.invocations() {
            debug!(command = %invocation, "running");
            let output = self.runner.run(invocation).await.map_err(|e| {
                DownloadError::process(url, invocation.program(), e.to_string(), combined.clone())
            })?;

            combined.push_str(&output.combined_output());

            if !output.success() {
                let reason = match output.exit_code {
                    Some(code) => format!("exited with code {code}"),
                    None => "was terminated by a signal".to_string(),
                };
                return Err(DownloadError::process(url, invocation.program(), reason, combined));
            }
        }

        Ok(combined)
    }
}
