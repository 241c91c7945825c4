//! Progress bar for batch runs.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use videos_downloader_core::download::CompletionHook;

/// Creates the batch progress bar, or a hidden one when disabled.
pub(crate) fn batch_progress(enabled: bool, total: usize) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{pos}/{len}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message("Downloading...");
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Completion hook that advances `bar` once per finished request.
pub(crate) fn completion_hook(bar: &ProgressBar) -> CompletionHook {
    let bar = bar.clone();
    Arc::new(move |outcome| {
        bar.inc(1);
        let status = if outcome.success { "done" } else { "failed" };
        bar.set_message(format!("{status}: {}", outcome.request.url()));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use videos_downloader_core::download::{AttemptMode, DownloadOutcome};
    use videos_downloader_core::VideoRequest;

    #[test]
    fn test_disabled_progress_is_hidden() {
        let bar = batch_progress(false, 3);
        assert!(bar.is_hidden());
    }

    #[test]
    fn test_completion_hook_advances_position() {
        let bar = batch_progress(false, 2);
        let hook = completion_hook(&bar);
        let outcome = DownloadOutcome::succeeded(
            0,
            VideoRequest::full("https://x/y"),
            AttemptMode::Normal,
            1,
            String::new(),
        );
        hook(&outcome);
        hook(&outcome);
        assert_eq!(bar.position(), 2);
    }
}
