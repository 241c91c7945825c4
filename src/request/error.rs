//! Error types for request parsing and clip timing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while turning input lines into download requests.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The input line held no URL token.
    #[error("malformed request line: {line:?}")]
    MalformedRequest {
        /// The offending line, as read.
        line: String,
    },

    /// The clip range is not `HH:MM:SS-HH:MM:SS` or its end is not after its start.
    #[error("invalid time range {range:?}: {reason}")]
    InvalidTimeRange {
        /// The range as written on the input line.
        range: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The URL list could not be read.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// Path of the URL list.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl RequestError {
    /// Creates a malformed request error.
    pub fn malformed(line: impl Into<String>) -> Self {
        Self::MalformedRequest { line: line.into() }
    }

    /// Creates an invalid time range error.
    pub fn invalid_range(range: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTimeRange {
            range: range.into(),
            reason: reason.into(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display_includes_line() {
        let error = RequestError::malformed("   ");
        let msg = error.to_string();
        assert!(msg.contains("malformed"), "Expected 'malformed' in: {msg}");
    }

    #[test]
    fn test_invalid_range_display_includes_range_and_reason() {
        let error = RequestError::invalid_range("00:00:10-bad", "invalid end time");
        let msg = error.to_string();
        assert!(msg.contains("00:00:10-bad"), "Expected range in: {msg}");
        assert!(msg.contains("invalid end time"), "Expected reason in: {msg}");
    }

    #[test]
    fn test_io_display_includes_path() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = RequestError::io("urls.txt", io_error);
        assert!(error.to_string().contains("urls.txt"));
    }
}
