//! Line-level request parsing and URL list reading.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use super::error::RequestError;

/// One download request: a source URL and, for clips, the requested range.
///
/// A request is a clip exactly when it carries a range, so the two can never
/// disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoRequest {
    url: String,
    clip_range: Option<String>,
}

impl VideoRequest {
    /// Creates a full-video request.
    #[must_use]
    pub fn full(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            clip_range: None,
        }
    }

    /// Creates a clip request. The range is validated later, when it is resolved.
    #[must_use]
    pub fn clip(url: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            clip_range: Some(range.into()),
        }
    }

    /// The source URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns true when only a sub-range of the media was requested.
    #[must_use]
    pub fn is_clip(&self) -> bool {
        self.clip_range.is_some()
    }

    /// The raw `HH:MM:SS-HH:MM:SS` range for clip requests.
    #[must_use]
    pub fn clip_range(&self) -> Option<&str> {
        self.clip_range.as_deref()
    }
}

/// Parses one input line into a request.
///
/// The first whitespace-separated token is the URL; a second token, if any,
/// is the clip range. Further tokens are ignored.
///
/// # Errors
///
/// Returns [`RequestError::MalformedRequest`] when the line is empty after
/// trimming.
pub fn parse_request(line: &str) -> Result<VideoRequest, RequestError> {
    let mut parts = line.split_whitespace();
    let Some(url) = parts.next() else {
        return Err(RequestError::malformed(line));
    };

    let request = match parts.next() {
        Some(range) => VideoRequest::clip(url, range),
        None => VideoRequest::full(url),
    };

    if parts.next().is_some() {
        debug!(line, "ignoring extra tokens after clip range");
    }

    Ok(request)
}

/// Requests parsed from a batch of lines, with the lines that were rejected.
#[derive(Debug, Default)]
pub struct ParsedRequests {
    /// Requests in input order.
    pub requests: Vec<VideoRequest>,
    /// Lines that could not be parsed.
    pub rejected: Vec<RequestError>,
}

impl ParsedRequests {
    /// Returns true when no request was parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Parses every line, keeping input order and collecting rejections.
pub fn parse_requests<I, S>(lines: I) -> ParsedRequests
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = ParsedRequests::default();
    for line in lines {
        match parse_request(line.as_ref()) {
            Ok(request) => parsed.requests.push(request),
            Err(e) => {
                warn!(error = %e, "skipping input line");
                parsed.rejected.push(e);
            }
        }
    }
    parsed
}

/// Reads the URL list, trimming each line and dropping blank ones.
///
/// Both `\n` and `\r\n` line endings are accepted.
///
/// # Errors
///
/// Returns [`RequestError::Io`] if the file cannot be read.
#[instrument(skip(path), fields(path = %path.display()))]
pub fn read_request_lines(path: &Path) -> Result<Vec<String>, RequestError> {
    let content = fs::read_to_string(path).map_err(|e| RequestError::io(path, e))?;
    let lines: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect();
    debug!(count = lines.len(), "read request lines");
    Ok(lines)
}
