//! Zero-copy cross-process frame ring (design spec, "Zero-Copy IPC Ring").
//!
//! A fixed-layout, triple-buffered shared-memory region hands composited
//! frames from the capture/compositor process to the virtual-camera
//! extension process without per-frame allocation or copies beyond the
//! unavoidable one into the mapped region. [`RingProducer`] and
//! [`RingConsumer`] are the two ends; [`header`] documents the wire layout.

mod consumer;
mod header;
mod producer;
mod shmem;

use std::fmt;

pub use consumer::{ReadGuard, RingConsumer};
pub use header::RingLayout;
pub use producer::{RingProducer, WriteGuard};

/// A borrowed view of the most recently published frame, valid until the
/// next call to [`RingConsumer::acquire_latest`].
#[derive(Debug)]
pub struct FrameView<'a> {
    /// Raw BGRA8 pixels, `width * height * 4` bytes.
    pub pixels: &'a [u8],
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Producer-assigned capture timestamp, monotonic nanoseconds.
    pub timestamp_ns: u64,
    /// Monotone frame counter, for detecting consumer-side drops.
    pub frame_number: u64,
}

/// Errors from setting up or using a shared-memory ring.
#[derive(Debug)]
pub enum RingError {
    /// Underlying file or mapping operation failed.
    Io(std::io::Error),
    /// The region's header magic did not match [`header::MAGIC`].
    MagicMismatch(u32),
    /// The region's header version did not match [`header::VERSION`].
    VersionMismatch(u32),
    /// The region was created at a different resolution than requested.
    ResolutionMismatch {
        /// Resolution the caller expected.
        expected: (u32, u32),
        /// Resolution recorded in the region's header.
        actual: (u32, u32),
    },
    /// A published frame's pixel buffer did not match the ring's
    /// configured size.
    FrameSizeMismatch {
        /// Expected buffer length in bytes.
        expected: usize,
        /// Actual buffer length in bytes.
        actual: usize,
    },
}

impl fmt::Display for RingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "ring I/O error: {e}"),
            Self::MagicMismatch(got) => write!(f, "ring magic mismatch: got 0x{got:08x}"),
            Self::VersionMismatch(got) => write!(f, "ring version mismatch: got {got}"),
            Self::ResolutionMismatch { expected, actual } => write!(
                f,
                "ring resolution mismatch: expected {}x{}, found {}x{}",
                expected.0, expected.1, actual.0, actual.1
            ),
            Self::FrameSizeMismatch { expected, actual } => write!(
                f,
                "frame buffer size mismatch: expected {expected} bytes, got {actual}"
            ),
        }
    }
}

impl std::error::Error for RingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::MagicMismatch(_)
            | Self::VersionMismatch(_)
            | Self::ResolutionMismatch { .. }
            | Self::FrameSizeMismatch { .. } => None,
        }
    }
}
