//! Encoder choice and the verify-before-commit selection protocol.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::probe::GpuProbe;
use crate::tool::{ToolInvocation, ToolRunner};

/// Software encoder used whenever no verified hardware encoder is available.
pub const SOFTWARE_ENCODER: &str = "libx264";

/// Known hardware accelerator families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GpuVendor {
    /// NVENC.
    Nvidia,
    /// AMF.
    Amd,
    /// Quick Sync.
    Intel,
}

impl GpuVendor {
    /// Matches a vendor or adapter description, case-insensitively.
    #[must_use]
    pub fn from_vendor_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        if name.contains("nvidia") {
            Some(Self::Nvidia)
        } else if name.contains("amd") || name.contains("advanced micro devices") {
            Some(Self::Amd)
        } else if name.contains("intel") {
            Some(Self::Intel)
        } else {
            None
        }
    }

    /// The `ffmpeg` H.264 encoder for this family.
    #[must_use]
    pub fn encoder_name(self) -> &'static str {
        match self {
            Self::Nvidia => "h264_nvenc",
            Self::Amd => "h264_amf",
            Self::Intel => "h264_qsv",
        }
    }
}

/// Why hardware encoding is not used. Informational only: every reason
/// resolves to the software encoder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncoderUnavailable {
    /// The hardware-info query failed.
    #[error("GPU query failed: {0}")]
    ProbeFailed(String),

    /// The hardware-info query reported no display adapter.
    #[error("no display adapter found")]
    NoAdapter,

    /// The adapter vendor is not a known accelerator family.
    #[error("no hardware encoder for GPU vendor {0:?}")]
    UnknownVendor(String),

    /// The hardware encoder failed its test encode.
    #[error("hardware encoder {encoder} failed verification")]
    VerificationFailed {
        /// Encoder that was tried.
        encoder: &'static str,
    },
}

/// The encoding decision for a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EncoderChoice {
    /// No re-encode; streams are copied as-is.
    StreamCopy,
    /// A hardware encoder that passed verification.
    Hardware {
        /// Accelerator family.
        vendor: GpuVendor,
    },
    /// The software encoder.
    Software,
}

impl EncoderChoice {
    /// The `ffmpeg` encoder name, or `None` for stream copy.
    #[must_use]
    pub fn encoder_name(&self) -> Option<&'static str> {
        match self {
            Self::StreamCopy => None,
            Self::Hardware { vendor } => Some(vendor.encoder_name()),
            Self::Software => Some(SOFTWARE_ENCODER),
        }
    }

    /// Returns true when media is copied without re-encoding.
    #[must_use]
    pub fn is_stream_copy(&self) -> bool {
        matches!(self, Self::StreamCopy)
    }
}

impl fmt::Display for EncoderChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encoder_name() {
            Some(name) => f.write_str(name),
            None => f.write_str("copy"),
        }
    }
}

/// Builds the synthetic test encode: one second of test pattern, ten frames,
/// output discarded.
#[must_use]
pub fn verification_invocation(ffmpeg: &Path, encoder: &str) -> ToolInvocation {
    ToolInvocation::new(ffmpeg)
        .args(["-hide_banner", "-loglevel", "error"])
        .args(["-f", "lavfi", "-i", "testsrc=duration=1"])
        .args(["-c:v", encoder])
        .args(["-frames:v", "10"])
        .args(["-f", "null", "-"])
}

/// Picks the encoder for a batch run.
#[derive(Clone)]
pub struct EncoderSelector {
    runner: Arc<dyn ToolRunner>,
    probe: Arc<dyn GpuProbe>,
    ffmpeg: PathBuf,
}

impl fmt::Debug for EncoderSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncoderSelector")
            .field("ffmpeg", &self.ffmpeg)
            .finish_non_exhaustive()
    }
}

impl EncoderSelector {
    /// Creates a selector that verifies encoders with the `ffmpeg` at `ffmpeg`.
    #[must_use]
    pub fn new(
        runner: Arc<dyn ToolRunner>,
        probe: Arc<dyn GpuProbe>,
        ffmpeg: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            probe,
            ffmpeg: ffmpeg.into(),
        }
    }

    /// Resolves the encoder for a batch.
    ///
    /// Fast mode short-circuits to [`EncoderChoice::StreamCopy`] without
    /// touching the hardware. Otherwise a detected GPU is only trusted after
    /// its encoder passes [`verification_invocation`].
    #[instrument(skip(self))]
    pub async fn select(&self, fast_mode: bool) -> EncoderChoice {
        if fast_mode {
            debug!("fast mode: streams will be copied, skipping encoder detection");
            return EncoderChoice::StreamCopy;
        }

        match self.try_hardware().await {
            Ok(vendor) => {
                info!(encoder = vendor.encoder_name(), "using GPU encoder");
                EncoderChoice::Hardware { vendor }
            }
            Err(reason) => {
                info!(%reason, encoder = SOFTWARE_ENCODER, "falling back to CPU encoder");
                EncoderChoice::Software
            }
        }
    }

    async fn try_hardware(&self) -> Result<GpuVendor, EncoderUnavailable> {
        let name = self.probe.vendor_name().await?;
        let vendor =
            GpuVendor::from_vendor_name(&name).ok_or(EncoderUnavailable::UnknownVendor(name))?;
        let encoder = vendor.encoder_name();

        if self.verify(encoder).await {
            Ok(vendor)
        } else {
            Err(EncoderUnavailable::VerificationFailed { encoder })
        }
    }

    async fn verify(&self, encoder: &str) -> bool {
        let invocation = verification_invocation(&self.ffmpeg, encoder);
        match self.runner.run(&invocation).await {
            Ok(output) if output.success() => true,
            Ok(output) => {
                warn!(
                    encoder,
                    exit_code = ?output.exit_code,
                    output = %output.combined_output(),
                    "GPU encoder is not working"
                );
                false
            }
            Err(e) => {
                warn!(encoder, error = %e, "GPU encoder test could not run");
                false
            }
        }
    }
}
