//! Mask geometry and the landmark-derived face mesh (design spec §3).

use glam::{Vec2, Vec3};

use crate::observation::{FaceObservation, NormalizedRect};
use crate::options::MaskStyle;

/// A value-typed, immutable-after-construction mask mesh: positions,
/// triangle indices, and per-vertex UVs.
///
/// Invariant: `vertices.len() == uvs.len()`, every `indices[i] <
/// vertices.len()`, and `indices.len()` is a multiple of 3.
#[derive(Debug, Clone)]
pub struct MaskGeometry {
    /// Vertex positions in mask-local space.
    pub vertices: Vec<Vec3>,
    /// Triangle indices, three per triangle.
    pub indices: Vec<u16>,
    /// Per-vertex UVs, identity-mapped until [`super::generate_uvs`]
    /// replaces them.
    pub uvs: Vec<Vec2>,
}

impl MaskGeometry {
    /// `true` iff the structural invariants hold.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.vertices.len() == self.uvs.len()
            && self.indices.len() % 3 == 0
            && self
                .indices
                .iter()
                .all(|&i| (i as usize) < self.vertices.len())
    }

    /// Number of triangles.
    #[must_use]
    pub const fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A detected or registered face's landmark mesh (design spec §3, §4.3).
#[derive(Debug, Clone)]
pub struct FaceMesh {
    /// 68 landmark points, normalized `[0, 1]²`.
    pub points: Vec<Vec2>,
    /// Bounding box of `points`.
    pub bbox: NormalizedRect,
    /// Detector confidence for this mesh's source observation.
    pub confidence: f32,
}

impl FaceMesh {
    /// Build a face mesh from a live observation. Returns `None` if the
    /// observation doesn't carry a full 68-point landmark set (§4.3: "if
    /// the live face has fewer than 68 points", no mesh is usable).
    #[must_use]
    pub fn from_observation(observation: &FaceObservation) -> Option<Self> {
        if observation.landmarks.len() != crate::observation::LANDMARK_COUNT {
            return None;
        }
        Some(Self {
            points: observation.landmarks.clone(),
            bbox: observation.bbox,
            confidence: observation.confidence,
        })
    }
}

/// Build the canonical [`MaskGeometry`] for `style`. UVs are initialized
/// to the identity mapping (`v.xy + 0.5`); callers needing face-mesh
/// correspondence should pass the result through [`super::generate_uvs`].
#[must_use]
pub fn build_mask_geometry(style: MaskStyle) -> MaskGeometry {
    match style {
        MaskStyle::HemisphericHelmet => hemisphere(16, 10, Vec3::splat(1.0)),
        MaskStyle::OrganicEllipsoid => hemisphere(16, 10, Vec3::new(1.0, 1.15, 0.85)),
        MaskStyle::LowPolyHelmet => hemisphere(8, 5, Vec3::splat(1.0)),
        MaskStyle::FlatDisc => disc(24),
        MaskStyle::FlatQuad => quad(),
        MaskStyle::LandmarkMesh => {
            // Needs a live observation's landmarks to build real geometry;
            // `PoseMapper::build_mask` special-cases this style and calls
            // `super::mapping::landmark_mesh_geometry` directly instead of
            // going through this function. An empty shell here is what a
            // caller gets if it asks for this style with no observation.
            MaskGeometry {
                vertices: Vec::new(),
                indices: Vec::new(),
                uvs: Vec::new(),
            }
        }
    }
}

/// Build a hemisphere (latitude/longitude grid over the top half of a unit
/// sphere) scaled per-axis by `scale`, used for both the hemispheric
/// helmet and (with a non-uniform `scale`) the organic ellipsoid variant.
fn hemisphere(longitude_segments: u32, latitude_segments: u32, scale: Vec3) -> MaskGeometry {
    let mut vertices = Vec::new();
    let mut uvs = Vec::new();
    for lat in 0..=latitude_segments {
        let v = (lat as f32) / (latitude_segments as f32);
        let phi = v * std::f32::consts::FRAC_PI_2; // 0 at the pole, pi/2 at the equator
        for lon in 0..=longitude_segments {
            let u = (lon as f32) / (longitude_segments as f32);
            let theta = u * std::f32::consts::TAU;
            let x = phi.sin() * theta.cos();
            let y = phi.cos();
            let z = phi.sin() * theta.sin();
            vertices.push(Vec3::new(x, y, z) * scale);
            uvs.push(Vec2::new(u, 1.0 - v));
        }
    }

    let stride = longitude_segments + 1;
    let mut indices = Vec::new();
    for lat in 0..latitude_segments {
        for lon in 0..longitude_segments {
            let a = (lat * stride + lon) as u16;
            let b = ((lat + 1) * stride + lon) as u16;
            let c = ((lat + 1) * stride + lon + 1) as u16;
            let d = (lat * stride + lon + 1) as u16;
            indices.extend_from_slice(&[a, b, c, a, c, d]);
        }
    }

    MaskGeometry {
        vertices,
        indices,
        uvs,
    }
}

/// A flat disc sticker, `segments` wedges fanned from a center vertex.
fn disc(segments: u32) -> MaskGeometry {
    let mut vertices = vec![Vec3::ZERO];
    let mut uvs = vec![Vec2::splat(0.5)];
    for i in 0..segments {
        let theta = (i as f32) / (segments as f32) * std::f32::consts::TAU;
        let (s, c) = theta.sin_cos();
        vertices.push(Vec3::new(c, s, 0.0));
        uvs.push(Vec2::new(0.5 + 0.5 * c, 0.5 - 0.5 * s));
    }
    let mut indices = Vec::new();
    for i in 1..=segments {
        let next = if i == segments { 1 } else { i + 1 };
        indices.extend_from_slice(&[0u16, i as u16, next as u16]);
    }
    MaskGeometry {
        vertices,
        indices,
        uvs,
    }
}

/// A flat quad sticker, two triangles.
fn quad() -> MaskGeometry {
    MaskGeometry {
        vertices: vec![
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
        uvs: vec![
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 0.0),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::{build_mask_geometry, FaceMesh};
    use crate::observation::FaceObservation;
    use crate::options::MaskStyle;

    #[test]
    fn hemisphere_variants_are_well_formed() {
        for style in [
            MaskStyle::HemisphericHelmet,
            MaskStyle::OrganicEllipsoid,
            MaskStyle::LowPolyHelmet,
        ] {
            let geom = build_mask_geometry(style);
            assert!(geom.is_well_formed());
            assert!(geom.triangle_count() > 0);
        }
    }

    #[test]
    fn sticker_variants_are_well_formed() {
        for style in [MaskStyle::FlatDisc, MaskStyle::FlatQuad] {
            let geom = build_mask_geometry(style);
            assert!(geom.is_well_formed());
        }
    }

    #[test]
    fn face_mesh_rejects_partial_landmarks() {
        let mut obs = FaceObservation::absent();
        obs.present = true;
        obs.landmarks = vec![glam::Vec2::splat(0.5); 10];
        assert!(FaceMesh::from_observation(&obs).is_none());
    }

    #[test]
    fn face_mesh_accepts_full_landmark_set() {
        let mut obs = FaceObservation::absent();
        obs.present = true;
        obs.landmarks = vec![glam::Vec2::splat(0.5); crate::observation::LANDMARK_COUNT];
        assert!(FaceMesh::from_observation(&obs).is_some());
    }
}
