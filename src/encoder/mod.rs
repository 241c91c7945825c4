//! Video encoder selection with hardware verification.
//!
//! The encoder is chosen once per batch:
//!
//! 1. In fast mode nothing is re-encoded, so no detection runs at all and the
//!    result is [`EncoderChoice::StreamCopy`].
//! 2. Otherwise the host's primary display adapter vendor is queried through
//!    a [`GpuProbe`] and matched against the known accelerator families.
//! 3. A matched hardware encoder is only used after a short synthetic encode
//!    through `ffmpeg` succeeds. Any miss or failure along the way falls back
//!    to the software encoder.

mod probe;
mod selector;

pub use probe::{GpuProbe, SystemGpuProbe, parse_lspci, parse_system_profiler, parse_wmic};
pub use selector::{
    EncoderChoice, EncoderSelector, EncoderUnavailable, GpuVendor, SOFTWARE_ENCODER,
    verification_invocation,
};
