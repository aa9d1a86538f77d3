//! Per-frame face analysis output (design spec §3, §4.2).

use glam::{Mat4, Vec2, Vec3};

/// Number of points in the canonical landmark schema (jaw, brows, nose,
/// eyes, outer/inner lips).
pub const LANDMARK_COUNT: usize = 68;

/// `[start, end)` index ranges for each named region of the 68-point
/// schema, in schema order.
pub mod regions {
    /// Jaw contour, 17 points.
    pub const JAW: std::ops::Range<usize> = 0..17;
    /// Right eyebrow, 5 points.
    pub const RIGHT_BROW: std::ops::Range<usize> = 17..22;
    /// Left eyebrow, 5 points.
    pub const LEFT_BROW: std::ops::Range<usize> = 22..27;
    /// Nose bridge/crest, 4 points.
    pub const NOSE_CREST: std::ops::Range<usize> = 27..31;
    /// Nose base, 5 points.
    pub const NOSE: std::ops::Range<usize> = 31..36;
    /// Right eye, 6 points.
    pub const RIGHT_EYE: std::ops::Range<usize> = 36..42;
    /// Left eye, 6 points.
    pub const LEFT_EYE: std::ops::Range<usize> = 42..48;
    /// Outer lip contour, 12 points.
    pub const OUTER_LIPS: std::ops::Range<usize> = 48..60;
    /// Inner lip contour, 8 points.
    pub const INNER_LIPS: std::ops::Range<usize> = 60..68;
}

/// Centroid used to pad any region the detector didn't supply.
pub const CENTROID_FALLBACK: Vec2 = Vec2::new(0.5, 0.5);

/// Normalized, top-left-origin axis-aligned rectangle in `[0, 1]²`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedRect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub w: f32,
    /// Height.
    pub h: f32,
}

impl NormalizedRect {
    /// Zero-sized rectangle at the origin (the type-default for "no
    /// face").
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        w: 0.0,
        h: 0.0,
    };

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Convert from bottom-left-origin detector space to this crate's
    /// top-left-origin convention: `y_tl = 1 - y_bl - h` (§4.2).
    #[must_use]
    pub fn from_bottom_left(x: f32, y_bl: f32, w: f32, h: f32) -> Self {
        Self {
            x,
            y: 1.0 - y_bl - h,
            w,
            h,
        }
    }
}

/// Named fixed-arity subset of the landmark set used for derived-pose
/// estimation and anchor extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoints {
    /// Left eye center (viewer's left, i.e. the subject's right eye).
    pub left_eye: Vec2,
    /// Right eye center.
    pub right_eye: Vec2,
    /// Nose tip.
    pub nose_tip: Vec2,
    /// Upper lip center.
    pub upper_lip: Vec2,
    /// Chin point.
    pub chin: Vec2,
    /// Left ear (approximate, from jaw contour).
    pub left_ear: Vec2,
    /// Right ear (approximate, from jaw contour).
    pub right_ear: Vec2,
    /// Forehead midpoint (above the brows).
    pub forehead: Vec2,
}

impl Keypoints {
    /// All-centroid keypoints, the type-default for "no face".
    #[must_use]
    pub fn centroid() -> Self {
        Self {
            left_eye: CENTROID_FALLBACK,
            right_eye: CENTROID_FALLBACK,
            nose_tip: CENTROID_FALLBACK,
            upper_lip: CENTROID_FALLBACK,
            chin: CENTROID_FALLBACK,
            left_ear: CENTROID_FALLBACK,
            right_ear: CENTROID_FALLBACK,
            forehead: CENTROID_FALLBACK,
        }
    }
}

/// Reconstructed head pose: Euler angles, NDC translation/scale proxy, and
/// the composed model matrix (design spec §3, §4.3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadPose {
    /// `(pitch, yaw, roll)` in radians.
    pub euler: Vec3,
    /// `(x, y)` in NDC; `z` is a scale proxy, not a depth.
    pub translation: Vec3,
    /// Composed model matrix placing the mask in world/NDC space.
    pub model_matrix: Mat4,
}

impl HeadPose {
    /// Identity pose: zero rotation, zero translation, identity model
    /// matrix. The type-default used when `present == false`.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            euler: Vec3::ZERO,
            translation: Vec3::ZERO,
            model_matrix: Mat4::IDENTITY,
        }
    }
}

impl Default for HeadPose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Normalized, immutable per-frame face-analysis result (design spec §3).
#[derive(Debug, Clone)]
pub struct FaceObservation {
    /// Whether a face was detected this frame.
    pub present: bool,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f32,
    /// Top-left-origin normalized bounding box.
    pub bbox: NormalizedRect,
    /// 68 normalized landmark points, or empty if `present == false`.
    pub landmarks: Vec<Vec2>,
    /// Named keypoint subset.
    pub keypoints: Keypoints,
    /// Reconstructed head pose.
    pub pose: HeadPose,
}

impl FaceObservation {
    /// The canonical "no face" observation: `present = false`, empty
    /// landmarks, identity pose/keypoints (§3 invariant).
    #[must_use]
    pub fn absent() -> Self {
        Self {
            present: false,
            confidence: 0.0,
            bbox: NormalizedRect::ZERO,
            landmarks: Vec::new(),
            keypoints: Keypoints::centroid(),
            pose: HeadPose::identity(),
        }
    }

    /// `true` if `landmarks` satisfies the §8 invariant: either empty or
    /// exactly [`LANDMARK_COUNT`] points, all within `[0, 1]²`.
    #[must_use]
    pub fn landmarks_well_formed(&self) -> bool {
        if self.landmarks.is_empty() {
            return true;
        }
        self.landmarks.len() == LANDMARK_COUNT
            && self
                .landmarks
                .iter()
                .all(|p| (0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y))
    }
}

impl Default for FaceObservation {
    fn default() -> Self {
        Self::absent()
    }
}

#[cfg(test)]
mod tests {
    use super::{FaceObservation, HeadPose, NormalizedRect, LANDMARK_COUNT};
    use glam::{Mat4, Vec2};

    #[test]
    fn absent_observation_is_well_formed_and_identity_posed() {
        let obs = FaceObservation::absent();
        assert!(!obs.present);
        assert!(obs.landmarks.is_empty());
        assert!(obs.landmarks_well_formed());
        assert_eq!(obs.pose.model_matrix, Mat4::IDENTITY);
    }

    #[test]
    fn full_landmark_set_is_well_formed() {
        let mut obs = FaceObservation::absent();
        obs.present = true;
        obs.landmarks = vec![Vec2::splat(0.5); LANDMARK_COUNT];
        assert!(obs.landmarks_well_formed());
    }

    #[test]
    fn wrong_count_is_not_well_formed() {
        let mut obs = FaceObservation::absent();
        obs.landmarks = vec![Vec2::splat(0.5); 10];
        assert!(!obs.landmarks_well_formed());
    }

    #[test]
    fn bottom_left_to_top_left_flip() {
        let r = NormalizedRect::from_bottom_left(0.1, 0.2, 0.3, 0.4);
        assert!((r.y - 0.4).abs() < 1e-6);
    }

    #[test]
    fn identity_head_pose_default() {
        assert_eq!(HeadPose::default().model_matrix, Mat4::IDENTITY);
    }
}
