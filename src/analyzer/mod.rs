//! Face Analyzer (C2, design spec §4.2): adapts an external landmark
//! detector into the pipeline's normalized [`FaceObservation`].

mod detector;
mod resample;

pub use detector::{Detector, DetectorRegions, DetectorResult, Orientation};

use glam::Vec2;
use log::warn;

use crate::frame::Frame;
use crate::observation::{regions, FaceObservation, HeadPose, Keypoints, NormalizedRect};

/// Wraps a [`Detector`] and produces normalized [`FaceObservation`]s.
///
/// Not required to be reentrant: the pipeline serializes calls to
/// [`FaceAnalyzer::analyze`] on its single processing executor (§5).
pub struct FaceAnalyzer {
    detector: Box<dyn Detector>,
    last: FaceObservation,
}

impl FaceAnalyzer {
    /// Wrap `detector`, starting from the "no face" observation.
    #[must_use]
    pub fn new(detector: Box<dyn Detector>) -> Self {
        Self {
            detector,
            last: FaceObservation::absent(),
        }
    }

    /// Run the detector on `frame` and return a normalized observation.
    ///
    /// Detector errors are logged and degrade to the "no face" observation
    /// rather than propagating — per §4.2, this never throws for "no
    /// face", and per §7 a transient detector failure is a per-frame drop,
    /// not a pipeline error.
    pub fn analyze(&mut self, frame: &Frame<'_>) -> &FaceObservation {
        match self.detector.detect(frame, Orientation::Up) {
            Ok(Some(result)) => {
                self.last = build_observation(&result);
            }
            Ok(None) => {
                self.last = FaceObservation::absent();
            }
            Err(err) => {
                warn!("face detector error, treating as no-face this frame: {err}");
                self.last = FaceObservation::absent();
            }
        }
        &self.last
    }

    /// Reset to the "no face" observation. Idempotent.
    pub fn reset(&mut self) {
        self.last = FaceObservation::absent();
    }

    /// The most recent observation, without running the detector again.
    #[must_use]
    pub const fn last(&self) -> &FaceObservation {
        &self.last
    }
}

fn build_observation(result: &DetectorResult) -> FaceObservation {
    let (x, y_bl, w, h) = result.bbox_bl;
    let bbox = NormalizedRect::from_bottom_left(x, y_bl, w, h);

    let landmarks = build_landmarks(&result.regions);
    let keypoints = derive_keypoints(&landmarks);
    let euler = result
        .pose_euler
        .unwrap_or_else(|| derive_pose_euler(&keypoints));

    let mut pose = HeadPose::identity();
    pose.euler = glam::Vec3::new(euler.0, euler.1, euler.2);

    FaceObservation {
        present: true,
        confidence: result.confidence.clamp(0.0, 1.0),
        bbox,
        landmarks,
        keypoints,
        pose,
    }
}

/// Build the canonical 68-point schema by resampling each named region to
/// its fixed cardinality (§4.2).
fn build_landmarks(src: &DetectorRegions) -> Vec<Vec2> {
    let mut out = Vec::with_capacity(crate::observation::LANDMARK_COUNT);
    out.extend(resample::resample(&src.jaw, regions::JAW.len()));
    out.extend(resample::resample(&src.right_brow, regions::RIGHT_BROW.len()));
    out.extend(resample::resample(&src.left_brow, regions::LEFT_BROW.len()));
    out.extend(resample::resample(&src.nose_crest, regions::NOSE_CREST.len()));
    out.extend(resample::resample(&src.nose, regions::NOSE.len()));
    out.extend(resample::resample(&src.right_eye, regions::RIGHT_EYE.len()));
    out.extend(resample::resample(&src.left_eye, regions::LEFT_EYE.len()));
    out.extend(resample::resample(&src.outer_lips, regions::OUTER_LIPS.len()));
    out.extend(resample::resample(&src.inner_lips, regions::INNER_LIPS.len()));
    out
}

/// Average a landmark range, falling back to the centroid if `landmarks`
/// is shorter than the full schema.
fn region_centroid(landmarks: &[Vec2], range: std::ops::Range<usize>) -> Vec2 {
    let slice = landmarks.get(range).unwrap_or(&[]);
    if slice.is_empty() {
        return crate::observation::CENTROID_FALLBACK;
    }
    let sum: Vec2 = slice.iter().copied().sum();
    sum / (slice.len() as f32)
}

fn landmark_or_centroid(landmarks: &[Vec2], idx: usize) -> Vec2 {
    landmarks
        .get(idx)
        .copied()
        .unwrap_or(crate::observation::CENTROID_FALLBACK)
}

/// Derive the named keypoint subset from the full landmark set (§4.3
/// anchor extraction uses the same point identities).
fn derive_keypoints(landmarks: &[Vec2]) -> Keypoints {
    Keypoints {
        left_eye: region_centroid(landmarks, regions::LEFT_EYE),
        right_eye: region_centroid(landmarks, regions::RIGHT_EYE),
        nose_tip: landmark_or_centroid(landmarks, 30),
        upper_lip: landmark_or_centroid(landmarks, 51),
        chin: landmark_or_centroid(landmarks, 8),
        left_ear: landmark_or_centroid(landmarks, 0),
        right_ear: landmark_or_centroid(landmarks, 16),
        forehead: (landmark_or_centroid(landmarks, 21) + landmark_or_centroid(landmarks, 22)) * 0.5,
    }
}

/// Derive `(pitch, yaw, roll)` from keypoints when the detector does not
/// supply pose angles directly (§4.2): roll from the eye line, pitch from
/// eye-vs-nose vertical offset, yaw from eye-center asymmetry around the
/// nose.
fn derive_pose_euler(keypoints: &Keypoints) -> (f32, f32, f32) {
    let eye_mid = (keypoints.left_eye + keypoints.right_eye) * 0.5;
    let eye_vec = keypoints.right_eye - keypoints.left_eye;
    let roll = eye_vec.y.atan2(eye_vec.x);

    let pitch = (eye_mid.y - keypoints.nose_tip.y) * 2.0;

    let dist_left = (keypoints.nose_tip - keypoints.left_eye).length();
    let dist_right = (keypoints.nose_tip - keypoints.right_eye).length();
    let eye_span = eye_vec.length().max(1e-6);
    let yaw = (dist_right - dist_left) / eye_span;

    (pitch, yaw, roll)
}

#[cfg(test)]
mod tests {
    use super::{
        build_observation, derive_pose_euler, DetectorRegions, DetectorResult, Detector,
        FaceAnalyzer, Orientation,
    };
    use crate::frame::Frame;
    use crate::observation::{Keypoints, LANDMARK_COUNT};
    use glam::Vec2;

    fn sample_regions() -> DetectorRegions {
        DetectorRegions {
            jaw: vec![Vec2::splat(0.1); 17],
            right_brow: vec![Vec2::splat(0.2); 5],
            left_brow: vec![Vec2::splat(0.2); 5],
            nose_crest: vec![Vec2::new(0.5, 0.5); 4],
            nose: vec![Vec2::splat(0.5); 5],
            right_eye: vec![Vec2::new(0.4, 0.4); 6],
            left_eye: vec![Vec2::new(0.6, 0.4); 6],
            outer_lips: vec![Vec2::splat(0.5); 12],
            inner_lips: vec![Vec2::splat(0.5); 8],
        }
    }

    struct StubDetector {
        result: Option<Result<Option<DetectorResult>, String>>,
    }

    impl Detector for StubDetector {
        fn detect(
            &mut self,
            _frame: &Frame<'_>,
            _orientation: Orientation,
        ) -> Result<Option<DetectorResult>, String> {
            self.result.take().unwrap_or(Ok(None))
        }
    }

    #[test]
    fn build_observation_produces_full_landmark_set() {
        let result = DetectorResult {
            bbox_bl: (0.25, 0.25, 0.5, 0.5),
            confidence: 0.9,
            regions: sample_regions(),
            pose_euler: None,
        };
        let obs = build_observation(&result);
        assert!(obs.present);
        assert_eq!(obs.landmarks.len(), LANDMARK_COUNT);
        assert!(obs.landmarks_well_formed());
        // bottom-left (0.25,0.25,0.5,0.5) -> top-left y = 1 - 0.25 - 0.5 = 0.25
        assert!((obs.bbox.y - 0.25).abs() < 1e-6);
    }

    #[test]
    fn detector_supplied_pose_is_adopted_verbatim() {
        let result = DetectorResult {
            bbox_bl: (0.0, 0.0, 1.0, 1.0),
            confidence: 1.0,
            regions: sample_regions(),
            pose_euler: Some((0.1, 0.2, 0.3)),
        };
        let obs = build_observation(&result);
        assert!((obs.pose.euler.x - 0.1).abs() < 1e-6);
        assert!((obs.pose.euler.y - 0.2).abs() < 1e-6);
        assert!((obs.pose.euler.z - 0.3).abs() < 1e-6);
    }

    #[test]
    fn level_eyes_yield_zero_roll() {
        let keypoints = Keypoints {
            left_eye: Vec2::new(0.4, 0.4),
            right_eye: Vec2::new(0.6, 0.4),
            nose_tip: Vec2::new(0.5, 0.5),
            ..Keypoints::centroid()
        };
        let (_, _, roll) = derive_pose_euler(&keypoints);
        assert!(roll.abs() < 1e-6);
    }

    #[test]
    fn analyzer_falls_back_to_absent_on_detector_error() {
        let mut analyzer = FaceAnalyzer::new(Box::new(StubDetector {
            result: Some(Err("model crashed".to_owned())),
        }));
        let data = vec![0u8; 4];
        let frame = Frame::packed(&data, 1, 1, 0);
        let obs = analyzer.analyze(&frame);
        assert!(!obs.present);
    }

    #[test]
    fn analyzer_reset_clears_last_observation() {
        let mut analyzer = FaceAnalyzer::new(Box::new(StubDetector {
            result: Some(Ok(Some(DetectorResult {
                bbox_bl: (0.0, 0.0, 1.0, 1.0),
                confidence: 1.0,
                regions: sample_regions(),
                pose_euler: None,
            }))),
        }));
        let data = vec![0u8; 4];
        let frame = Frame::packed(&data, 1, 1, 0);
        assert!(analyzer.analyze(&frame).present);
        analyzer.reset();
        assert!(!analyzer.last().present);
    }
}
