//! External tool execution.
//!
//! Every interaction with `yt-dlp`, `ffmpeg`, and the hardware-info commands
//! goes through one abstraction: a [`ToolInvocation`] (program plus argument
//! list) is handed to a [`ToolRunner`], which returns a [`ToolOutput`]
//! holding the exit status and captured output.
//!
//! Production code uses [`SystemToolRunner`]; tests substitute scripted
//! runners.

mod error;
mod invocation;
mod runner;

pub use error::ToolError;
pub use invocation::{ToolInvocation, ToolOutput, ToolPaths, default_tool_path};
pub use runner::{SystemToolRunner, ToolRunner};
