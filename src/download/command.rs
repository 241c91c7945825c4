//! External tool command synthesis.
//!
//! Turns a [`VideoRequest`] plus the batch [`Configuration`] and the encoder
//! chosen for the current attempt into the exact invocations to run. No
//! download happens here; the only process this module may start is the
//! metadata probe of the probe-then-transcode clip strategy.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};

use super::DownloadError;
use super::filename::sanitize_filename;
use crate::config::Configuration;
use crate::encoder::EncoderChoice;
use crate::request::{ResolvedTiming, VideoRequest, resolve_clip_range};
use crate::tool::{ToolInvocation, ToolRunner};

/// Format selector for full downloads: best single file with audio and video.
const FULL_FORMAT: &str = "b";

/// Format selector for clips: best video plus best audio, else best single file.
const CLIP_FORMAT: &str = "bv*+ba/b/best";

/// Output template for files named by the downloader. The title is capped to
/// keep the full path under Windows' length limit.
const OUTPUT_TEMPLATE: &str = "%(title).244s.%(ext)s";

/// Fields printed by the metadata probe: title, then one or two media URLs.
const PROBE_PRINT: &str = "%(title).244s\n%(urls)s";

/// Container for clips produced by the transcoder.
const CLIP_EXTENSION: &str = "mp4";

/// Stem used when a title sanitizes to nothing.
const FALLBACK_STEM: &str = "clip";

/// How clip requests are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClipStrategy {
    /// Resolve direct media URLs with a metadata probe, then cut with `ffmpeg`.
    #[default]
    ProbeThenTranscode,
    /// Let `yt-dlp` cut the section itself with `--download-sections`.
    DirectSection,
}

impl ClipStrategy {
    /// Stable label, as accepted by [`FromStr`].
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProbeThenTranscode => "probe-then-transcode",
            Self::DirectSection => "direct-section",
        }
    }
}

impl fmt::Display for ClipStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClipStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "probe-then-transcode" | "probe" | "transcode" => Ok(Self::ProbeThenTranscode),
            "direct-section" | "direct" | "section" => Ok(Self::DirectSection),
            other => Err(format!(
                "unknown clip strategy {other:?}, expected probe-then-transcode or direct-section"
            )),
        }
    }
}

/// Direct media sources reported by the metadata probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSources {
    /// One URL carrying both audio and video.
    Combined(String),
    /// Video and audio served separately.
    Separate {
        /// Video stream URL.
        video: String,
        /// Audio stream URL.
        audio: String,
    },
}

/// Parsed metadata probe result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaProbe {
    /// Media title as reported by the downloader.
    pub title: String,
    /// Where to read the media from.
    pub sources: MediaSources,
}

/// Parses `--print "%(title)s\n%(urls)s"` output.
///
/// Line 0 is the title; line 1 is the combined URL, or lines 1 and 2 are the
/// separate video and audio URLs.
///
/// # Errors
///
/// Returns a reason string when fewer than two lines were printed.
pub fn parse_probe_output(stdout: &str) -> Result<MediaProbe, String> {
    let lines: Vec<&str> = stdout
        .trim()
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .collect();

    match lines.as_slice() {
        [title, video, audio, ..] => Ok(MediaProbe {
            title: (*title).to_string(),
            sources: MediaSources::Separate {
                video: (*video).to_string(),
                audio: (*audio).to_string(),
            },
        }),
        [title, url] => Ok(MediaProbe {
            title: (*title).to_string(),
            sources: MediaSources::Combined((*url).to_string()),
        }),
        _ => Err(format!("expected both title and URL but got: {lines:?}")),
    }
}

/// The invocations that fetch one request, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadPlan {
    invocations: Vec<ToolInvocation>,
}

impl DownloadPlan {
    fn single(invocation: ToolInvocation) -> Self {
        Self {
            invocations: vec![invocation],
        }
    }

    /// The invocations to run, in order.
    #[must_use]
    pub fn invocations(&self) -> &[ToolInvocation] {
        &self.invocations
    }
}

/// Synthesizes tool invocations for download requests.
#[derive(Clone)]
pub struct CommandBuilder {
    config: Arc<Configuration>,
    runner: Arc<dyn ToolRunner>,
}

impl fmt::Debug for CommandBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CommandBuilder {
    /// Creates a builder. `runner` is only used for metadata probes.
    #[must_use]
    pub fn new(config: Arc<Configuration>, runner: Arc<dyn ToolRunner>) -> Self {
        Self { config, runner }
    }

    /// The configuration commands are built against.
    #[must_use]
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Builds the plan for one attempt of `request`.
    ///
    /// `encoder` is the choice for this attempt; [`EncoderChoice::StreamCopy`]
    /// means fast mode.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidTimeRange`] for unresolvable clip
    /// ranges and [`DownloadError::MetadataProbeFailed`] when the
    /// probe-then-transcode strategy cannot resolve the media.
    #[instrument(skip(self, request, encoder), fields(url = %request.url(), encoder = %encoder))]
    pub async fn build(
        &self,
        request: &VideoRequest,
        encoder: &EncoderChoice,
    ) -> Result<DownloadPlan, DownloadError> {
        let Some(range) = request.clip_range() else {
            return Ok(DownloadPlan::single(self.full_download(request.url())));
        };

        let timing = resolve_clip_range(range)
            .map_err(|e| DownloadError::invalid_time_range(request.url(), e))?;

        match self.config.clip_strategy {
            ClipStrategy::DirectSection => Ok(DownloadPlan::single(self.direct_section(
                request.url(),
                range,
                encoder,
            ))),
            ClipStrategy::ProbeThenTranscode => {
                let probe = self.probe(request.url()).await?;
                Ok(DownloadPlan::single(self.transcode(&probe, &timing, encoder)))
            }
        }
    }

    /// `yt-dlp -f b -o <dir>/<template> <url>`.
    #[must_use]
    pub fn full_download(&self, url: &str) -> ToolInvocation {
        ToolInvocation::new(&self.config.tools.yt_dlp)
            .args(["-f", FULL_FORMAT])
            .args(["-o".to_string(), self.output_template()])
            .arg(url)
    }

    /// The metadata-only invocation used to resolve direct media URLs.
    #[must_use]
    pub fn probe_invocation(&self, url: &str) -> ToolInvocation {
        ToolInvocation::new(&self.config.tools.yt_dlp)
            .args(["-f", CLIP_FORMAT])
            .args(["--print", PROBE_PRINT])
            .args(["--encoding", "utf-8"])
            .args(["--no-playlist", "--no-download", "--no-warnings"])
            .arg(url)
    }

    /// Native section download; re-encodes through the post-processor unless
    /// streams are copied.
    #[must_use]
    pub fn direct_section(&self, url: &str, range: &str, encoder: &EncoderChoice) -> ToolInvocation {
        let mut invocation = ToolInvocation::new(&self.config.tools.yt_dlp)
            .args(["-f", CLIP_FORMAT])
            .args(["--download-sections".to_string(), format!("*{range}")]);

        if let Some(name) = encoder.encoder_name() {
            invocation = invocation
                .arg("--force-keyframes-at-cuts")
                .args([
                    "--postprocessor-args".to_string(),
                    format!("ffmpeg:-c:v {name} -q:a 0"),
                ]);
        }

        invocation
            .args(["-o".to_string(), self.output_template()])
            .arg(url)
    }

    /// `ffmpeg -ss <start> -i <url> [-ss <start> -i <audio>] -t <secs> <codec> <out>`.
    #[must_use]
    pub fn transcode(
        &self,
        probe: &MediaProbe,
        timing: &ResolvedTiming,
        encoder: &EncoderChoice,
    ) -> ToolInvocation {
        let start = timing.start_offset.as_str();
        let mut invocation = ToolInvocation::new(&self.config.tools.ffmpeg);

        invocation = match &probe.sources {
            MediaSources::Combined(url) => invocation.args(["-ss", start, "-i", url.as_str()]),
            MediaSources::Separate { video, audio } => invocation
                .args(["-ss", start, "-i", video.as_str()])
                .args(["-ss", start, "-i", audio.as_str()]),
        };

        invocation = invocation.args(["-t".to_string(), timing.duration_seconds.to_string()]);

        invocation = match encoder.encoder_name() {
            None => invocation.args(["-c", "copy"]),
            Some(name) => invocation.args(["-c:v", name, "-q:a", "0"]),
        };

        invocation.arg(self.clip_output_path(&probe.title))
    }

    async fn probe(&self, url: &str) -> Result<MediaProbe, DownloadError> {
        let invocation = self.probe_invocation(url);
        debug!(command = %invocation, "probing media");

        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|e| DownloadError::metadata_probe(url, e.to_string(), ""))?;

        if !output.success() {
            return Err(DownloadError::metadata_probe(
                url,
                format!("exit status {:?}", output.exit_code),
                output.combined_output(),
            ));
        }

        parse_probe_output(&output.stdout)
            .map_err(|reason| DownloadError::metadata_probe(url, reason, output.combined_output()))
    }

    fn output_template(&self) -> String {
        join_lossy(&self.config.download_dir, OUTPUT_TEMPLATE)
    }

    fn clip_output_path(&self, title: &str) -> String {
        let stem = sanitize_filename(title);
        let stem = if stem.trim().is_empty() {
            FALLBACK_STEM.to_string()
        } else {
            stem
        };
        join_lossy(&self.config.download_dir, &format!("{stem}.{CLIP_EXTENSION}"))
    }
}

fn join_lossy(dir: &Path, file: &str) -> String {
    dir.join(file).to_string_lossy().into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::encoder::GpuVendor;
    use crate::tool::{ToolError, ToolOutput, ToolPaths};

    /// Replies to every run with fixed stdout and exit code.
    struct ProbeRunner {
        exit_code: i32,
        stdout: String,
        calls: Mutex<Vec<ToolInvocation>>,
    }

    impl ProbeRunner {
        fn new(exit_code: i32, stdout: &str) -> Arc<Self> {
            Arc::new(Self {
                exit_code,
                stdout: stdout.to_string(),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ToolRunner for ProbeRunner {
        async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
            self.calls.lock().unwrap().push(invocation.clone());
            Ok(ToolOutput {
                exit_code: Some(self.exit_code),
                stdout: self.stdout.clone(),
                stderr: "probe stderr".to_string(),
            })
        }
    }

    fn config(strategy: ClipStrategy) -> Arc<Configuration> {
        Arc::new(Configuration {
            urls_file: PathBuf::from("urls.txt"),
            download_dir: PathBuf::from("downloads"),
            fast_mode: false,
            clip_strategy: strategy,
            tools: ToolPaths {
                yt_dlp: PathBuf::from("yt-dlp"),
                ffmpeg: PathBuf::from("ffmpeg"),
            },
        })
    }

    fn nvenc() -> EncoderChoice {
        EncoderChoice::Hardware {
            vendor: GpuVendor::Nvidia,
        }
    }

    fn template() -> String {
        Path::new("downloads")
            .join("%(title).244s.%(ext)s")
            .to_string_lossy()
            .into_owned()
    }

    fn clip_path(stem: &str) -> String {
        Path::new("downloads")
            .join(format!("{stem}.mp4"))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn test_clip_strategy_from_str_and_display() {
        assert_eq!(
            "direct-section".parse::<ClipStrategy>().unwrap(),
            ClipStrategy::DirectSection
        );
        assert_eq!(
            "Probe-Then-Transcode".parse::<ClipStrategy>().unwrap(),
            ClipStrategy::ProbeThenTranscode
        );
        assert!("sideways".parse::<ClipStrategy>().is_err());
        assert_eq!(ClipStrategy::default().to_string(), "probe-then-transcode");
    }

    #[test]
    fn test_parse_probe_output_combined() {
        let probe = parse_probe_output("My Title\nhttps://cdn/av.mp4\n").unwrap();
        assert_eq!(probe.title, "My Title");
        assert_eq!(
            probe.sources,
            MediaSources::Combined("https://cdn/av.mp4".to_string())
        );
    }

    #[test]
    fn test_parse_probe_output_separate_streams_with_crlf() {
        let probe = parse_probe_output("T\r\nhttps://cdn/v\r\nhttps://cdn/a\r\n").unwrap();
        assert_eq!(
            probe.sources,
            MediaSources::Separate {
                video: "https://cdn/v".to_string(),
                audio: "https://cdn/a".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_probe_output_too_short() {
        assert!(parse_probe_output("").is_err());
        assert!(parse_probe_output("only a title\n").is_err());
    }

    #[tokio::test]
    async fn test_build_full_video() {
        let runner = ProbeRunner::new(0, "");
        let builder = CommandBuilder::new(config(ClipStrategy::ProbeThenTranscode), runner.clone());

        let plan = builder
            .build(&VideoRequest::full("https://x/y"), &nvenc())
            .await
            .unwrap();

        assert_eq!(plan.invocations().len(), 1);
        let invocation = &plan.invocations()[0];
        assert_eq!(invocation.program(), Path::new("yt-dlp"));
        assert_eq!(
            invocation.arguments(),
            ["-f".to_string(), "b".to_string(), "-o".to_string(), template(), "https://x/y".to_string()]
        );
        assert!(runner.calls.lock().unwrap().is_empty(), "full downloads never probe");
    }

    #[tokio::test]
    async fn test_build_clip_probe_combined_reencode() {
        let runner = ProbeRunner::new(0, "A/B: Title?\nhttps://cdn/av\n");
        let builder = CommandBuilder::new(config(ClipStrategy::ProbeThenTranscode), runner.clone());

        let plan = builder
            .build(&VideoRequest::clip("https://x/y", "00:00:10-00:01:40"), &nvenc())
            .await
            .unwrap();

        let invocation = &plan.invocations()[0];
        assert_eq!(invocation.program(), Path::new("ffmpeg"));
        assert_eq!(
            invocation.arguments(),
            [
                "-ss".to_string(),
                "00:00:10".to_string(),
                "-i".to_string(),
                "https://cdn/av".to_string(),
                "-t".to_string(),
                "90".to_string(),
                "-c:v".to_string(),
                "h264_nvenc".to_string(),
                "-q:a".to_string(),
                "0".to_string(),
                clip_path("A-B- Title-"),
            ]
        );

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].arguments().contains(&"--no-download".to_string()));
        assert_eq!(calls[0].arguments().last().map(String::as_str), Some("https://x/y"));
    }

    #[tokio::test]
    async fn test_build_clip_probe_separate_streams_copy() {
        let runner = ProbeRunner::new(0, "Title\nhttps://cdn/v\nhttps://cdn/a\n");
        let builder = CommandBuilder::new(config(ClipStrategy::ProbeThenTranscode), runner);

        let plan = builder
            .build(
                &VideoRequest::clip("https://x/y", "00:00:00-00:05:00"),
                &EncoderChoice::StreamCopy,
            )
            .await
            .unwrap();

        assert_eq!(
            plan.invocations()[0].arguments(),
            [
                "-ss".to_string(),
                "00:00:00".to_string(),
                "-i".to_string(),
                "https://cdn/v".to_string(),
                "-ss".to_string(),
                "00:00:00".to_string(),
                "-i".to_string(),
                "https://cdn/a".to_string(),
                "-t".to_string(),
                "300".to_string(),
                "-c".to_string(),
                "copy".to_string(),
                clip_path("Title"),
            ]
        );
    }

    #[tokio::test]
    async fn test_build_clip_probe_failure_is_metadata_error() {
        let runner = ProbeRunner::new(1, "");
        let builder = CommandBuilder::new(config(ClipStrategy::ProbeThenTranscode), runner);

        let err = builder
            .build(&VideoRequest::clip("https://x/y", "00:00:00-00:00:05"), &nvenc())
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::MetadataProbeFailed { .. }));
        assert_eq!(err.output(), Some("probe stderr"));
    }

    #[tokio::test]
    async fn test_build_clip_probe_single_line_is_metadata_error() {
        let runner = ProbeRunner::new(0, "just a title\n");
        let builder = CommandBuilder::new(config(ClipStrategy::ProbeThenTranscode), runner);

        let err = builder
            .build(&VideoRequest::clip("https://x/y", "00:00:00-00:00:05"), &nvenc())
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::MetadataProbeFailed { .. }));
    }

    #[tokio::test]
    async fn test_build_clip_invalid_range_skips_probe() {
        let runner = ProbeRunner::new(0, "T\nhttps://cdn/av\n");
        let builder = CommandBuilder::new(config(ClipStrategy::ProbeThenTranscode), runner.clone());

        let err = builder
            .build(&VideoRequest::clip("https://x/y", "00:01:00-00:00:30"), &nvenc())
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::InvalidTimeRange { .. }));
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_build_clip_direct_section_reencode_and_copy() {
        let runner = ProbeRunner::new(0, "");
        let builder = CommandBuilder::new(config(ClipStrategy::DirectSection), runner.clone());
        let request = VideoRequest::clip("https://x/y", "00:00:10-00:01:40");

        let plan = builder.build(&request, &EncoderChoice::Software).await.unwrap();
        assert_eq!(
            plan.invocations()[0].arguments(),
            [
                "-f".to_string(),
                "bv*+ba/b/best".to_string(),
                "--download-sections".to_string(),
                "*00:00:10-00:01:40".to_string(),
                "--force-keyframes-at-cuts".to_string(),
                "--postprocessor-args".to_string(),
                "ffmpeg:-c:v libx264 -q:a 0".to_string(),
                "-o".to_string(),
                template(),
                "https://x/y".to_string(),
            ]
        );

        let plan = builder.build(&request, &EncoderChoice::StreamCopy).await.unwrap();
        let args = plan.invocations()[0].arguments();
        assert!(!args.contains(&"--postprocessor-args".to_string()));
        assert!(!args.contains(&"--force-keyframes-at-cuts".to_string()));
        assert!(runner.calls.lock().unwrap().is_empty(), "direct sections never probe");
    }

    #[test]
    fn test_clip_output_path_falls_back_when_title_sanitizes_empty() {
        let builder = CommandBuilder::new(config(ClipStrategy::ProbeThenTranscode), ProbeRunner::new(0, ""));
        assert_eq!(builder.clip_output_path("\u{7}\u{8}"), clip_path("clip"));
    }
}
