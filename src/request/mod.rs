//! Input parsing for download requests.
//!
//! Each non-blank line of the URL list becomes one [`VideoRequest`]:
//!
//! - `https://www.youtube.com/watch?v=id` downloads the full video
//! - `https://www.youtube.com/watch?v=id 00:01:00-00:02:30` downloads a clip
//!
//! Clip ranges are not validated while parsing. They are resolved lazily by
//! [`resolve_clip_range`] when a clip command is built.
//!
//! # Example
//!
//! ```
//! use videos_downloader_core::request::parse_request;
//!
//! let request = parse_request("https://x/y 00:00:00-00:00:05").unwrap();
//! assert!(request.is_clip());
//! assert_eq!(request.clip_range(), Some("00:00:00-00:00:05"));
//! ```

mod error;
mod input;
mod timing;

pub use error::RequestError;
pub use input::{ParsedRequests, VideoRequest, parse_request, parse_requests, read_request_lines};
pub use timing::{ResolvedTiming, describe_clip, format_duration, resolve_clip_range};
