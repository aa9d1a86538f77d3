//! The external capture-driver contract (design spec §6).
//!
//! The capture driver itself is an external collaborator — a physical
//! camera's capture subsystem — and is not implemented by this crate. This
//! module defines the narrow interface the [`crate::pipeline::FramePipeline`]
//! consumes: a quality preset, frame-rate target, and explicit callback
//! structs in place of source-style delegate registration (design note,
//! §9).

use crate::frame::Frame;

/// Capture quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapturePreset {
    /// Lowest-resolution preset (e.g. 640×480).
    Low,
    /// Mid-resolution preset (e.g. 1280×720).
    Medium,
    /// Highest-resolution preset (e.g. 1920×1080).
    High,
}

/// Target output frame rate; the pipeline clamps to `min(source_fps,
/// target)` (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameRate {
    /// 30 frames per second.
    Fps30,
    /// 60 frames per second.
    Fps60,
}

impl FrameRate {
    /// Numeric frames-per-second value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        match self {
            Self::Fps30 => 30,
            Self::Fps60 => 60,
        }
    }
}

/// Capture driver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CaptureConfig {
    /// Quality preset.
    pub preset: CapturePreset,
    /// Target frame rate.
    pub frame_rate: FrameRate,
    /// Opaque platform device identifier.
    pub device_id: String,
}

/// Explicit callback struct held by value, replacing source-style delegate
/// registration (design note §9). Lifetime is the owner's lifetime — no
/// weak references are needed because [`crate::pipeline::FramePipeline`]
/// owns these callbacks and is torn down before its owner.
pub struct CaptureCallbacks {
    /// Invoked on the driver's own delivery thread for every captured
    /// frame, with the frame and its monotonic-nanosecond presentation
    /// timestamp.
    pub on_frame: Box<dyn FnMut(Frame<'_>, u64) + Send>,
    /// Invoked on the driver thread when the capture device reports an
    /// error.
    pub on_error: Box<dyn FnMut(&str) + Send>,
}

/// The narrow, synchronous control surface a capture driver exposes.
///
/// Implementations wrap the platform's physical-camera capture API. This
/// crate only depends on this trait — never on a concrete driver.
pub trait CaptureDriver: Send {
    /// Begin delivering frames to the registered callbacks per `config`.
    ///
    /// # Errors
    ///
    /// Returns an error string describing why the device could not start
    /// (unsupported preset, missing device, permission denied).
    fn start(&mut self, config: &CaptureConfig, callbacks: CaptureCallbacks) -> Result<(), String>;

    /// Stop delivering frames. Idempotent.
    fn stop(&mut self);

    /// Switch the active device. Output resolution may change starting on
    /// the next frame.
    ///
    /// # Errors
    ///
    /// Returns an error string if `device_id` does not name a usable
    /// device.
    fn set_device(&mut self, device_id: &str) -> Result<(), String>;

    /// Toggle horizontal mirroring of delivered frames.
    fn set_mirrored(&mut self, mirrored: bool);
}

#[cfg(test)]
mod tests {
    use super::FrameRate;

    #[test]
    fn frame_rate_numeric_values() {
        assert_eq!(FrameRate::Fps30.as_u32(), 30);
        assert_eq!(FrameRate::Fps60.as_u32(), 60);
    }
}
