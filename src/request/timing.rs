//! Clip range resolution: `HH:MM:SS-HH:MM:SS` to a start offset and a duration.
//!
//! The transcoder seeks with `-ss <start>` and stops after `-t <seconds>`, so
//! a range is turned into its start string plus the whole-second distance to
//! its end. Ranges whose end is not after their start are rejected rather
//! than passed through as zero or negative durations.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::error::RequestError;

/// Separator between the start and end of a clip range.
const RANGE_SEPARATOR: char = '-';

/// Matches one zero-padded 24-hour clock bound.
#[allow(clippy::expect_used)]
static CLOCK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2}):(\d{2}):(\d{2})$").expect("clock regex is valid") // Static pattern, safe to panic
});

/// Start offset and duration derived from a clip range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTiming {
    /// Start offset exactly as written, `HH:MM:SS`.
    pub start_offset: String,
    /// Whole seconds from start to end; always positive.
    pub duration_seconds: u64,
}

impl fmt::Display for ResolvedTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (+{})",
            self.start_offset,
            format_duration(self.duration_seconds)
        )
    }
}

/// Resolves a clip range into its start offset and duration.
///
/// # Errors
///
/// Returns [`RequestError::InvalidTimeRange`] when the range does not hold
/// exactly one `-`, when either bound is not a valid `HH:MM:SS` time of day,
/// or when the end is not strictly after the start.
///
/// # Example
///
/// ```
/// use videos_downloader_core::request::resolve_clip_range;
///
/// let timing = resolve_clip_range("00:00:10-00:01:40").unwrap();
/// assert_eq!(timing.start_offset, "00:00:10");
/// assert_eq!(timing.duration_seconds, 90);
/// ```
pub fn resolve_clip_range(range: &str) -> Result<ResolvedTiming, RequestError> {
    let (start, end) = split_range(range)?;

    let start_secs = parse_clock(start)
        .ok_or_else(|| RequestError::invalid_range(range, format!("invalid start time {start:?}")))?;
    let end_secs = parse_clock(end)
        .ok_or_else(|| RequestError::invalid_range(range, format!("invalid end time {end:?}")))?;

    if end_secs <= start_secs {
        return Err(RequestError::invalid_range(
            range,
            "end time must be after start time",
        ));
    }

    Ok(ResolvedTiming {
        start_offset: start.to_string(),
        duration_seconds: end_secs - start_secs,
    })
}

fn split_range(range: &str) -> Result<(&str, &str), RequestError> {
    let mut parts = range.split(RANGE_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(start), Some(end), None) => Ok((start, end)),
        _ => Err(RequestError::invalid_range(
            range,
            "expected HH:MM:SS-HH:MM:SS",
        )),
    }
}

/// Parses `HH:MM:SS` into seconds since midnight.
fn parse_clock(value: &str) -> Option<u64> {
    let captures = CLOCK_PATTERN.captures(value)?;
    let hours: u64 = captures[1].parse().ok()?;
    let minutes: u64 = captures[2].parse().ok()?;
    let seconds: u64 = captures[3].parse().ok()?;
    if hours > 23 || minutes > 59 || seconds > 59 {
        return None;
    }
    Some(hours * 3600 + minutes * 60 + seconds)
}

/// Formats seconds as `"2m 30s"`, or `"45s"` under a minute.
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    let minutes = seconds / 60;
    let rest = seconds % 60;
    if minutes > 0 {
        format!("{minutes}m {rest}s")
    } else {
        format!("{rest}s")
    }
}

/// Status line for a clip download, or `None` if the range does not resolve.
#[must_use]
pub fn describe_clip(range: &str) -> Option<String> {
    let timing = resolve_clip_range(range).ok()?;
    let (start, end) = split_range(range).ok()?;
    Some(format!(
        "Downloading clip: {} duration (from {start} to {end})",
        format_duration(timing.duration_seconds)
    ))
}
