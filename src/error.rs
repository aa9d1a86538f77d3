//! Crate-level error types.

use std::fmt;

use crate::compositor::render_context::RenderContextError;
use crate::ring::RingError;

/// Errors produced by the `anoncam-core` crate.
///
/// Follows the taxonomy in the design spec §7: most of these are
/// **setup-time** failures that surface to the session owner. Per-frame
/// failures (transient detector misses, GPU encode hiccups, backpressure
/// drops, ring detachment) are recovered locally at the frame boundary and
/// never become an `AnonCamError` — they are only counted and logged.
#[derive(Debug)]
pub enum AnonCamError {
    /// GPU context initialization failure.
    Gpu(RenderContextError),
    /// The capture driver reported a configuration error (unsupported
    /// preset, missing device) or a fatal device-lost condition.
    Capture(String),
    /// Shared-memory ring setup failure (create or attach).
    Ring(RingError),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// Failed to spawn a background (processing/UI) executor thread.
    ThreadSpawn(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// The face detector failed to initialize (terminal, not a per-frame
    /// miss).
    DetectorInit(String),
}

impl fmt::Display for AnonCamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::Capture(msg) => write!(f, "capture error: {msg}"),
            Self::Ring(e) => write!(f, "ring error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::ThreadSpawn(e) => write!(f, "failed to spawn thread: {e}"),
            Self::OptionsParse(msg) => write!(f, "options parse error: {msg}"),
            Self::DetectorInit(msg) => {
                write!(f, "detector initialization failed: {msg}")
            }
        }
    }
}

impl std::error::Error for AnonCamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::Ring(e) => Some(e),
            Self::Io(e) | Self::ThreadSpawn(e) => Some(e),
            Self::Capture(_) | Self::OptionsParse(_) | Self::DetectorInit(_) => None,
        }
    }
}

impl From<RenderContextError> for AnonCamError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<RingError> for AnonCamError {
    fn from(e: RingError) -> Self {
        Self::Ring(e)
    }
}

impl From<std::io::Error> for AnonCamError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
