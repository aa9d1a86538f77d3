//! Pose & Mapping Engine (C3, design spec §4.3): head-pose reconstruction,
//! mask placement, and live↔texture UV correspondence.

mod mapping;
mod mesh;
mod placement;
mod rotation;

pub use mesh::{build_mask_geometry, FaceMesh, MaskGeometry};
pub use placement::{placement_3d, sticker_model_matrix};
pub use rotation::euler_to_matrix;

use glam::Mat4;

use crate::observation::FaceObservation;
use crate::options::MaskStyle;

/// Owns the optional registered texture face and derives mask geometry,
/// UVs, and placement matrices for each frame.
#[derive(Debug, Default)]
pub struct PoseMapper {
    texture_face: Option<FaceMesh>,
}

impl PoseMapper {
    /// An empty mapper with no registered texture face.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or clear, with `None`) the texture face used for UV
    /// correspondence. Computed once when the user loads a texture image,
    /// per §4.3.
    pub fn set_texture_face(&mut self, face: Option<FaceMesh>) {
        self.texture_face = face;
    }

    /// `true` if a texture face is currently registered.
    #[must_use]
    pub const fn has_texture_face(&self) -> bool {
        self.texture_face.is_some()
    }

    /// Build the mask geometry for `style`, with UVs derived from
    /// `observation`'s landmarks against the registered texture face (or
    /// the identity mapping if none is registered or the live face is
    /// incomplete).
    #[must_use]
    pub fn build_mask(&self, style: MaskStyle, observation: &FaceObservation) -> MaskGeometry {
        let Some(live_face) = FaceMesh::from_observation(observation) else {
            return mesh::build_mask_geometry(style);
        };

        if style == MaskStyle::LandmarkMesh {
            return mapping::landmark_mesh_geometry(&live_face, self.texture_face.as_ref());
        }

        let mut geometry = mesh::build_mask_geometry(style);
        geometry.uvs = mapping::generate_uvs(&geometry, self.texture_face.as_ref(), &live_face);
        geometry
    }

    /// Compute `(model, view_projection)` for placing the mask against
    /// `observation`, in sticker or 3D mode depending on `style`.
    #[must_use]
    pub fn placement(&self, style: MaskStyle, observation: &FaceObservation, aspect: f32, head_scale: f32) -> (Mat4, Mat4) {
        if style.is_sticker() {
            (sticker_model_matrix(observation.bbox), Mat4::IDENTITY)
        } else {
            placement_3d(observation.bbox, aspect, observation.pose.euler, head_scale)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PoseMapper;
    use crate::observation::FaceObservation;
    use crate::options::MaskStyle;
    use glam::Vec2;

    fn face_with_bbox() -> FaceObservation {
        let mut obs = FaceObservation::absent();
        obs.present = true;
        obs.bbox = crate::observation::NormalizedRect {
            x: 0.25,
            y: 0.25,
            w: 0.5,
            h: 0.5,
        };
        obs.landmarks = vec![Vec2::splat(0.5); crate::observation::LANDMARK_COUNT];
        obs
    }

    #[test]
    fn sticker_style_uses_identity_view_projection() {
        let mapper = PoseMapper::new();
        let (_, view_proj) = mapper.placement(MaskStyle::FlatDisc, &face_with_bbox(), 1.0, 1.33);
        assert!(view_proj.abs_diff_eq(glam::Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn helmet_style_uses_perspective_view_projection() {
        let mapper = PoseMapper::new();
        let (_, view_proj) = mapper.placement(MaskStyle::HemisphericHelmet, &face_with_bbox(), 1.0, 1.33);
        assert!(!view_proj.abs_diff_eq(glam::Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn build_mask_without_texture_face_uses_identity_uvs() {
        let mapper = PoseMapper::new();
        assert!(!mapper.has_texture_face());
        let geometry = mapper.build_mask(MaskStyle::FlatQuad, &face_with_bbox());
        assert!(geometry.is_well_formed());
        assert_eq!(geometry.uvs.len(), geometry.vertices.len());
    }

    #[test]
    fn landmark_mesh_style_builds_real_geometry_from_observation() {
        let mapper = PoseMapper::new();
        let geometry = mapper.build_mask(MaskStyle::LandmarkMesh, &face_with_bbox());
        assert!(geometry.is_well_formed());
        assert!(geometry.triangle_count() > 0);
    }
}
