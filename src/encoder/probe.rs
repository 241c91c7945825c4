//! Host GPU vendor discovery through the platform's hardware-info command.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::selector::EncoderUnavailable;
use crate::tool::{ToolInvocation, ToolRunner};

/// Reports the vendor of the host's primary display adapter.
#[async_trait]
pub trait GpuProbe: Send + Sync {
    /// Returns the vendor or adapter name of the first display adapter.
    ///
    /// # Errors
    ///
    /// Returns [`EncoderUnavailable`] when the query cannot run or reports no
    /// adapter.
    async fn vendor_name(&self) -> Result<String, EncoderUnavailable>;
}

/// Queries `lspci`, `wmic`, or `system_profiler` depending on the host OS.
#[derive(Clone)]
pub struct SystemGpuProbe {
    runner: Arc<dyn ToolRunner>,
}

impl SystemGpuProbe {
    /// Creates a probe that runs the hardware query through `runner`.
    #[must_use]
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self { runner }
    }

    fn query() -> ToolInvocation {
        if cfg!(windows) {
            ToolInvocation::new("wmic").args(["path", "win32_VideoController", "get", "name"])
        } else if cfg!(target_os = "macos") {
            ToolInvocation::new("system_profiler").arg("SPDisplaysDataType")
        } else {
            ToolInvocation::new("lspci")
        }
    }

    fn parse(output: &str) -> Option<String> {
        if cfg!(windows) {
            parse_wmic(output)
        } else if cfg!(target_os = "macos") {
            parse_system_profiler(output)
        } else {
            parse_lspci(output)
        }
    }
}

impl std::fmt::Debug for SystemGpuProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemGpuProbe").finish_non_exhaustive()
    }
}

#[async_trait]
impl GpuProbe for SystemGpuProbe {
    async fn vendor_name(&self) -> Result<String, EncoderUnavailable> {
        let invocation = Self::query();
        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|e| EncoderUnavailable::ProbeFailed(e.to_string()))?;

        if !output.success() {
            return Err(EncoderUnavailable::ProbeFailed(format!(
                "{} exited with {:?}",
                invocation.program().display(),
                output.exit_code
            )));
        }

        let vendor = Self::parse(&output.stdout).ok_or(EncoderUnavailable::NoAdapter)?;
        debug!(%vendor, "detected display adapter");
        Ok(vendor)
    }
}

/// Extracts the first display adapter description from `lspci` output.
#[must_use]
pub fn parse_lspci(output: &str) -> Option<String> {
    const DISPLAY_CLASSES: [&str; 3] = [
        "VGA compatible controller",
        "3D controller",
        "Display controller",
    ];

    output.lines().find_map(|line| {
        let class = DISPLAY_CLASSES
            .iter()
            .copied()
            .find(|class| line.contains(class))?;
        let (_, rest) = line.split_once(class)?;
        let description = rest.trim_start_matches(':').trim();
        (!description.is_empty()).then(|| description.to_string())
    })
}

/// Extracts the first adapter name from `wmic ... get name` output.
#[must_use]
pub fn parse_wmic(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find(|line| !line.eq_ignore_ascii_case("name"))
        .map(ToString::to_string)
}

/// Extracts the first adapter vendor from `system_profiler SPDisplaysDataType`.
///
/// Prefers the `Vendor:` field and falls back to `Chipset Model:`, which is
/// all Apple Silicon reports.
#[must_use]
pub fn parse_system_profiler(output: &str) -> Option<String> {
    let field = |name: &str| {
        output.lines().find_map(|line| {
            let value = line.trim().strip_prefix(name)?.trim();
            (!value.is_empty()).then(|| value.to_string())
        })
    };
    field("Vendor:").or_else(|| field("Chipset Model:"))
}
