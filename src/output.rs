//! The virtual-camera extension surface (design spec §6).
//!
//! This module describes, but does not implement, the host operating
//! system's virtual-camera plug-in shell: the identity constants it
//! advertises and the pixel formats/resolutions it supports. The consumer
//! side (a separate process) drains the [`crate::ring`] and wraps each
//! entry per [`SampleMetadata`].

/// Stable provider identity the extension advertises at load (§6).
pub const PROVIDER_ID: &str = "com.anoncam.provider";
/// Stable device identifier.
pub const DEVICE_ID: &str = "com.anoncam.device.source";
/// Stable stream identifier.
pub const STREAM_ID: &str = "com.anoncam.stream.source";
/// Advertised device model name.
pub const MODEL_NAME: &str = "AnonCam-1";
/// Transport kind advertised to the host (built-in, as opposed to
/// network/USB).
pub const TRANSPORT: &str = "builtIn";

/// A `(width, height, fps)` video format the extension advertises at load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VideoFormat {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frame rate.
    pub fps: u32,
}

/// All formats supported by the extension (§6), all BGRA8.
pub const SUPPORTED_FORMATS: &[VideoFormat] = &[
    VideoFormat {
        width: 1920,
        height: 1080,
        fps: 30,
    },
    VideoFormat {
        width: 1920,
        height: 1080,
        fps: 60,
    },
    VideoFormat {
        width: 1280,
        height: 720,
        fps: 30,
    },
    VideoFormat {
        width: 1280,
        height: 720,
        fps: 60,
    },
    VideoFormat {
        width: 640,
        height: 480,
        fps: 30,
    },
];

/// Metadata the consumer attaches when wrapping one dequeued ring slot into
/// a platform sample buffer (§6): a fixed 33 ms dequeue cadence, a nominal
/// 1/30s duration, and the slot's own timestamp as the presentation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleMetadata {
    /// Nominal sample duration numerator/denominator, `1/30` seconds.
    pub duration_num: u32,
    /// Duration denominator.
    pub duration_den: u32,
    /// Presentation timestamp — the slot's own `timestamp_ns`.
    pub pts_ns: u64,
}

impl SampleMetadata {
    /// Build sample metadata for a dequeued slot with the given timestamp.
    #[must_use]
    pub const fn for_slot(timestamp_ns: u64) -> Self {
        Self {
            duration_num: 1,
            duration_den: 30,
            pts_ns: timestamp_ns,
        }
    }
}

/// Matches a resolution against [`SUPPORTED_FORMATS`] for any fps.
#[must_use]
pub fn supports_resolution(width: u32, height: u32) -> bool {
    SUPPORTED_FORMATS
        .iter()
        .any(|f| f.width == width && f.height == height)
}

#[cfg(test)]
mod tests {
    use super::{supports_resolution, SampleMetadata, SUPPORTED_FORMATS};

    #[test]
    fn known_resolution_supported() {
        assert!(supports_resolution(1280, 720));
        assert!(!supports_resolution(3840, 2160));
    }

    #[test]
    fn all_formats_are_listed() {
        assert_eq!(SUPPORTED_FORMATS.len(), 5);
    }

    #[test]
    fn sample_metadata_carries_slot_timestamp() {
        let meta = SampleMetadata::for_slot(123_456);
        assert_eq!(meta.pts_ns, 123_456);
        assert_eq!((meta.duration_num, meta.duration_den), (1, 30));
    }
}
