//! Batch orchestration with isolated failures and degraded-mode retry.
//!
//! Every request runs as its own Tokio task. There is no concurrency cap:
//! each task spends its time waiting on an external process, not on CPU.
//! A failure never affects sibling tasks, and the batch only returns once
//! every task has finished.
//!
//! # Degraded-mode retry
//!
//! When a request fails while re-encoding, it is retried once with streams
//! copied. The switch to fast mode is local to that request's task: the
//! shared [`EncoderChoice`] is never mutated, so concurrent retries cannot
//! leak their mode into other requests.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use videos_downloader_core::config::Configuration;
//! use videos_downloader_core::download::{DownloadEngine, Downloader};
//! use videos_downloader_core::encoder::EncoderChoice;
//! use videos_downloader_core::request::VideoRequest;
//! use videos_downloader_core::tool::SystemToolRunner;
//!
//! # async fn example() {
//! let config = Arc::new(Configuration::default());
//! let downloader = Downloader::new(config, Arc::new(SystemToolRunner::new()));
//! let engine = DownloadEngine::new(downloader, EncoderChoice::Software);
//! let report = engine.run_batch(vec![VideoRequest::full("https://example.com/v")]).await;
//! println!("Completed: {}, Failed: {}", report.completed, report.failed);
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{Instrument, debug, info, info_span, instrument, warn};

use super::DownloadError;
use super::downloader::{AttemptMode, DownloadOutcome, Downloader};
use crate::encoder::EncoderChoice;
use crate::request::VideoRequest;

/// Callback invoked as each request finishes, in completion order.
pub type CompletionHook = Arc<dyn Fn(&DownloadOutcome) + Send + Sync>;

/// Counters shared by the tasks of one batch.
#[derive(Debug, Default)]
pub struct DownloadStats {
    completed: AtomicUsize,
    failed: AtomicUsize,
    retried: AtomicUsize,
}

impl DownloadStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of successful requests.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Returns the number of failed requests.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Returns the number of degraded-mode retries.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.retried.load(Ordering::SeqCst)
    }

    /// Returns the number of finished requests (completed + failed).
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed() + self.failed()
    }

    fn record(&self, outcome: &DownloadOutcome) {
        if outcome.success {
            self.completed.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn increment_retried(&self) {
        self.retried.fetch_add(1, Ordering::SeqCst);
    }
}

/// Everything a batch run produced.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// One outcome per request, in input order.
    pub outcomes: Vec<DownloadOutcome>,
    /// Successful requests.
    pub completed: usize,
    /// Failed requests.
    pub failed: usize,
    /// Degraded-mode retries made.
    pub retried: usize,
}

impl BatchReport {
    /// Number of requests in the batch.
    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Outcomes that failed, in input order.
    pub fn failures(&self) -> impl Iterator<Item = &DownloadOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.success)
    }
}

/// Runs batches of requests concurrently.
#[derive(Clone)]
pub struct DownloadEngine {
    downloader: Arc<Downloader>,
    encoder: EncoderChoice,
    degraded_retry: bool,
    on_complete: Option<CompletionHook>,
}

impl fmt::Debug for DownloadEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadEngine")
            .field("downloader", &self.downloader)
            .field("encoder", &self.encoder)
            .field("degraded_retry", &self.degraded_retry)
            .finish_non_exhaustive()
    }
}

impl DownloadEngine {
    /// Creates an engine using the batch-wide `encoder`, with degraded-mode
    /// retry enabled.
    ///
    /// A configuration with `fast_mode` set overrides `encoder` with
    /// [`EncoderChoice::StreamCopy`].
    #[must_use]
    pub fn new(downloader: Downloader, encoder: EncoderChoice) -> Self {
        let encoder = if downloader.builder().config().fast_mode {
            EncoderChoice::StreamCopy
        } else {
            encoder
        };
        Self {
            downloader: Arc::new(downloader),
            encoder,
            degraded_retry: true,
            on_complete: None,
        }
    }

    /// Enables or disables the degraded-mode retry.
    #[must_use]
    pub fn with_degraded_retry(mut self, enabled: bool) -> Self {
        self.degraded_retry = enabled;
        self
    }

    /// Registers a callback run as each request finishes.
    #[must_use]
    pub fn on_complete(mut self, hook: CompletionHook) -> Self {
        self.on_complete = Some(hook);
        self
    }

    /// The batch-wide encoder choice.
    #[must_use]
    pub fn encoder(&self) -> &EncoderChoice {
        &self.encoder
    }

    /// Downloads every request concurrently and waits for all of them.
    ///
    /// Never fails as a whole: each request's result, including panics in
    /// its task, is reported in its own [`DownloadOutcome`]. Outcomes are
    /// returned in input order regardless of completion order.
    #[instrument(skip(self, requests), fields(count = requests.len(), encoder = %self.encoder))]
    pub async fn run_batch(&self, requests: Vec<VideoRequest>) -> BatchReport {
        let stats = Arc::new(DownloadStats::new());
        info!("starting batch");

        let handles: Vec<_> = requests
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, request)| {
                let downloader = Arc::clone(&self.downloader);
                let encoder = self.encoder.clone();
                let degraded_retry = self.degraded_retry;
                let stats = Arc::clone(&stats);
                let on_complete = self.on_complete.clone();
                let span = info_span!("request", index, url = %request.url());

                tokio::spawn(
                    async move {
                        let outcome = download_with_fallback(
                            &downloader,
                            index,
                            request,
                            encoder,
                            degraded_retry,
                            &stats,
                        )
                        .await;
                        stats.record(&outcome);
                        if let Some(hook) = &on_complete {
                            hook(&outcome);
                        }
                        outcome
                    }
                    .instrument(span),
                )
            })
            .collect();

        debug!(task_count = handles.len(), "waiting for downloads to complete");

        let mut outcomes: Vec<DownloadOutcome> = join_all(handles)
            .await
            .into_iter()
            .zip(requests)
            .enumerate()
            .map(|(index, (joined, request))| {
                joined.unwrap_or_else(|e| {
                    warn!(index, error = %e, "download task panicked");
                    let outcome = DownloadOutcome {
                        index,
                        request,
                        success: false,
                        mode: AttemptMode::of(&self.encoder),
                        attempts: 1,
                        error_kind: Some("task_failed"),
                        error_detail: Some(format!("download task failed: {e}")),
                        combined_output: None,
                    };
                    stats.record(&outcome);
                    if let Some(hook) = &self.on_complete {
                        hook(&outcome);
                    }
                    outcome
                })
            })
            .collect();
        outcomes.sort_by_key(|outcome| outcome.index);

        let report = BatchReport {
            outcomes,
            completed: stats.completed(),
            failed: stats.failed(),
            retried: stats.retried(),
        };
        info!(
            completed = report.completed,
            failed = report.failed,
            retried = report.retried,
            total = report.total(),
            "batch complete"
        );
        report
    }
}

/// Downloads one request, retrying once in fast mode after a normal-mode
/// failure. The fast-mode override lives only in this call.
async fn download_with_fallback(
    downloader: &Downloader,
    index: usize,
    request: VideoRequest,
    encoder: EncoderChoice,
    degraded_retry: bool,
    stats: &DownloadStats,
) -> DownloadOutcome {
    let mode = AttemptMode::of(&encoder);
    let first = downloader.download(&request, &encoder).await;

    let error = match first {
        Ok(output) => return DownloadOutcome::succeeded(index, request, mode, 1, output),
        Err(e) => e,
    };

    if !degraded_retry || mode == AttemptMode::Fast {
        report_failure(&request, &error, mode);
        return DownloadOutcome::failed(index, request, mode, 1, &error);
    }

    warn!(
        url = %request.url(),
        error = %error,
        "failed to download video, trying again without re-encoding"
    );
    stats.increment_retried();

    let fallback = EncoderChoice::StreamCopy;
    match downloader.download(&request, &fallback).await {
        Ok(output) => {
            info!(url = %request.url(), "downloaded successfully in fast mode");
            DownloadOutcome::succeeded(index, request, AttemptMode::Fast, 2, output)
        }
        Err(e) => {
            report_failure(&request, &e, AttemptMode::Fast);
            DownloadOutcome::failed(index, request, AttemptMode::Fast, 2, &e)
        }
    }
}

fn report_failure(request: &VideoRequest, error: &DownloadError, mode: AttemptMode) {
    warn!(url = %request.url(), %mode, error = %error, "download failed");
}
