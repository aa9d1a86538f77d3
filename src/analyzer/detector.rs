//! The external face-landmark detector contract (design spec §6).
//!
//! The detector itself — a neural landmark model — is an external
//! collaborator. This module defines the narrow synchronous interface
//! [`FaceAnalyzer`](super::FaceAnalyzer) consumes.

use glam::Vec2;

use crate::frame::Frame;

/// One named landmark region as reported by the detector, in its own
/// native point count (not yet resampled to the canonical schema).
#[derive(Debug, Clone, Default)]
pub struct DetectorRegions {
    /// Face contour, nominally 17 points.
    pub jaw: Vec<Vec2>,
    /// Right eyebrow, nominally 5 points.
    pub right_brow: Vec<Vec2>,
    /// Left eyebrow, nominally 5 points.
    pub left_brow: Vec<Vec2>,
    /// Nose bridge, nominally 4 points.
    pub nose_crest: Vec<Vec2>,
    /// Nose base, nominally 5 points.
    pub nose: Vec<Vec2>,
    /// Right eye ring, nominally 6 points.
    pub right_eye: Vec<Vec2>,
    /// Left eye ring, nominally 6 points.
    pub left_eye: Vec<Vec2>,
    /// Outer lip contour, nominally 12 points.
    pub outer_lips: Vec<Vec2>,
    /// Inner lip contour, nominally 8 points.
    pub inner_lips: Vec<Vec2>,
}

/// One detection result, in the detector's native bottom-left-origin
/// coordinate space.
#[derive(Debug, Clone)]
pub struct DetectorResult {
    /// `(x, y_bottom_left, w, h)`, bottom-left origin, normalized.
    pub bbox_bl: (f32, f32, f32, f32),
    /// Detector confidence in `[0, 1]`.
    pub confidence: f32,
    /// Landmark regions, native cardinality.
    pub regions: DetectorRegions,
    /// Pose angles in radians, `(pitch, yaw, roll)`, if the detector
    /// supplies them directly.
    pub pose_euler: Option<(f32, f32, f32)>,
}

/// Image orientation hint passed to [`Detector::detect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// No rotation needed (the common case for a front-facing camera).
    #[default]
    Up,
}

/// The narrow, synchronous face-landmark detector interface (§6).
///
/// Implementations wrap a platform neural-network runtime. This crate
/// depends only on this trait.
pub trait Detector: Send {
    /// Run detection on one frame.
    ///
    /// # Errors
    ///
    /// Returns an error string for a hard detector failure (model load
    /// failure, unsupported pixel format). Returning `Ok(None)` is the
    /// correct response to "no face found" — it is not an error.
    fn detect(
        &mut self,
        frame: &Frame<'_>,
        orientation: Orientation,
    ) -> Result<Option<DetectorResult>, String>;
}
