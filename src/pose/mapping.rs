//! Live↔texture face correspondence via anchor triangulation and
//! barycentric UV mapping (design spec §4.3).

use glam::Vec2;

use super::mesh::{FaceMesh, MaskGeometry};
use crate::observation::{regions, LANDMARK_COUNT};

/// Barycentric edge-spill tolerance: a point is considered inside a
/// triangle if all three coordinates are at least this value.
const BARYCENTRIC_TOLERANCE: f32 = -0.1;
/// Triangles with `|denom|` below this are treated as degenerate and
/// skipped.
const DENOM_EPSILON: f32 = 1e-9;

/// The nine semantically named anchor points used to triangulate a
/// correspondence between two face meshes.
#[derive(Debug, Clone, Copy)]
struct Anchors {
    forehead: Vec2,
    left_eye: Vec2,
    right_eye: Vec2,
    left_cheek: Vec2,
    right_cheek: Vec2,
    nose_tip: Vec2,
    left_mouth: Vec2,
    right_mouth: Vec2,
    chin: Vec2,
}

// Index aliases into `Anchors::as_array()`.
const FOREHEAD: usize = 0;
const LEFT_EYE: usize = 1;
const RIGHT_EYE: usize = 2;
const LEFT_CHEEK: usize = 3;
const RIGHT_CHEEK: usize = 4;
const NOSE_TIP: usize = 5;
const LEFT_MOUTH: usize = 6;
const RIGHT_MOUTH: usize = 7;
const CHIN: usize = 8;

/// The 11 fixed triangles over the anchor set (§4.3 step 2).
const TRIANGLES: [(usize, usize, usize); 11] = [
    (FOREHEAD, LEFT_EYE, RIGHT_EYE),
    (FOREHEAD, LEFT_EYE, LEFT_CHEEK),
    (FOREHEAD, RIGHT_EYE, RIGHT_CHEEK),
    (LEFT_CHEEK, LEFT_EYE, NOSE_TIP),
    (RIGHT_CHEEK, RIGHT_EYE, NOSE_TIP),
    (NOSE_TIP, LEFT_MOUTH, RIGHT_MOUTH),
    (LEFT_MOUTH, LEFT_CHEEK, NOSE_TIP),
    (RIGHT_MOUTH, RIGHT_CHEEK, NOSE_TIP),
    (CHIN, LEFT_CHEEK, LEFT_MOUTH),
    (CHIN, RIGHT_CHEEK, RIGHT_MOUTH),
    (CHIN, LEFT_MOUTH, RIGHT_MOUTH),
];

impl Anchors {
    fn as_array(self) -> [Vec2; 9] {
        [
            self.forehead,
            self.left_eye,
            self.right_eye,
            self.left_cheek,
            self.right_cheek,
            self.nose_tip,
            self.left_mouth,
            self.right_mouth,
            self.chin,
        ]
    }
}

/// Average a landmark range into a single point.
fn centroid(points: &[Vec2], range: std::ops::Range<usize>) -> Vec2 {
    let slice = &points[range];
    slice.iter().copied().sum::<Vec2>() / (slice.len() as f32)
}

/// Extract the nine named anchors from a full 68-point face mesh (§4.3
/// step 1).
fn extract_anchors(mesh: &FaceMesh) -> Anchors {
    let p = &mesh.points;
    Anchors {
        forehead: (p[21] + p[22]) * 0.5,
        left_eye: centroid(p, regions::LEFT_EYE),
        right_eye: centroid(p, regions::RIGHT_EYE),
        left_cheek: p[2],
        right_cheek: p[14],
        nose_tip: p[30],
        left_mouth: p[48],
        right_mouth: p[54],
        chin: p[8],
    }
}

/// Barycentric coordinates of `point` in triangle `(v1, v2, v3)`, using
/// the two-edge-dot formulation from §4.3. Returns `None` if the triangle
/// is degenerate or the point falls outside the tolerance.
fn barycentric(point: Vec2, v1: Vec2, v2: Vec2, v3: Vec2) -> Option<(f32, f32, f32)> {
    let v0 = v3 - v1;
    let v1e = v2 - v1;
    let v2e = point - v1;

    let dot00 = v0.dot(v0);
    let dot01 = v0.dot(v1e);
    let dot11 = v1e.dot(v1e);
    let dot02 = v0.dot(v2e);
    let dot12 = v1e.dot(v2e);

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom.abs() < DENOM_EPSILON {
        return None;
    }

    let inv_denom = 1.0 / denom;
    let u = (dot11 * dot02 - dot01 * dot12) * inv_denom;
    let v = (dot00 * dot12 - dot01 * dot02) * inv_denom;
    let w = 1.0 - u - v;

    if u >= BARYCENTRIC_TOLERANCE && v >= BARYCENTRIC_TOLERANCE && w >= BARYCENTRIC_TOLERANCE {
        Some((u, v, w))
    } else {
        None
    }
}

/// Affine fallback mapping (§4.3 step 4): translate bbox center to bbox
/// center, scale by bbox size ratio, clamp to `[0,1]²`.
fn affine_fallback(point: Vec2, live: &FaceMesh, texture: &FaceMesh) -> Vec2 {
    let live_center = live.bbox.center();
    let texture_center = texture.bbox.center();
    let scale = Vec2::new(
        texture.bbox.w / live.bbox.w.max(1e-6),
        texture.bbox.h / live.bbox.h.max(1e-6),
    );
    let mapped = texture_center + (point - live_center) * scale;
    mapped.clamp(Vec2::ZERO, Vec2::ONE)
}

/// Derive UVs for every vertex of `mask` from the live↔texture face
/// correspondence (§4.3). Falls back to the identity UV if no texture
/// face is registered or `live_face` does not carry a full landmark set.
#[must_use]
pub fn generate_uvs(mask: &MaskGeometry, texture_face: Option<&FaceMesh>, live_face: &FaceMesh) -> Vec<Vec2> {
    let Some(texture_face) = texture_face else {
        return identity_uvs(mask);
    };
    if live_face.points.len() != LANDMARK_COUNT || texture_face.points.len() != LANDMARK_COUNT {
        return identity_uvs(mask);
    }

    let live_anchors = extract_anchors(live_face).as_array();
    let texture_anchors = extract_anchors(texture_face).as_array();

    mask.vertices
        .iter()
        .map(|vertex| {
            let live_point = Vec2::new(vertex.x + 0.5, vertex.y + 0.5);
            for &(a, b, c) in &TRIANGLES {
                if let Some((u, v, w)) = barycentric(live_point, live_anchors[a], live_anchors[b], live_anchors[c]) {
                    let uv = texture_anchors[a] * w + texture_anchors[b] * v + texture_anchors[c] * u;
                    return uv.clamp(Vec2::ZERO, Vec2::ONE);
                }
            }
            affine_fallback(live_point, live_face, texture_face)
        })
        .collect()
}

fn identity_uvs(mask: &MaskGeometry) -> Vec<Vec2> {
    mask.vertices
        .iter()
        .map(|v| Vec2::new(v.x + 0.5, v.y + 0.5))
        .collect()
}

/// Closed outline loop used to fan-triangulate [`landmark_mesh_geometry`]:
/// the jaw contour followed by the brow line walked back right-to-left,
/// tracing the face silhouette.
const OUTLINE: [usize; 26] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 26, 25, 24, 23, 22, 21, 20, 19, 18,
];

/// Build mask geometry directly from a live face's 68 landmarks (§4.3: the
/// `LandmarkMesh` style skins the detected points themselves rather than a
/// canned shape). Vertices are the live points, centered and flipped into
/// mask-local space; the silhouette loop is fan-triangulated around the
/// point centroid so every landmark contributes a vertex.
///
/// UVs use direct landmark-index correspondence against `texture_face` (the
/// live mesh and a registered texture face share the same 68-point schema,
/// so point `i` always corresponds to texture point `i` with no barycentric
/// search needed) and fall back to the identity mapping otherwise.
#[must_use]
pub fn landmark_mesh_geometry(live_face: &FaceMesh, texture_face: Option<&FaceMesh>) -> MaskGeometry {
    let centroid = live_face.points.iter().copied().sum::<Vec2>() / (live_face.points.len() as f32);

    let to_local = |p: Vec2| glam::Vec3::new(p.x - 0.5, 0.5 - p.y, 0.0);

    let mut vertices: Vec<glam::Vec3> = live_face.points.iter().map(|&p| to_local(p)).collect();
    let hub_index = vertices.len() as u16;
    vertices.push(to_local(centroid));

    let mut indices = Vec::with_capacity(OUTLINE.len() * 3);
    for i in 0..OUTLINE.len() {
        let a = OUTLINE[i] as u16;
        let b = OUTLINE[(i + 1) % OUTLINE.len()] as u16;
        indices.extend_from_slice(&[hub_index, a, b]);
    }

    let uvs = if let Some(texture_face) = texture_face.filter(|t| t.points.len() == LANDMARK_COUNT) {
        let mut uvs: Vec<Vec2> = texture_face.points.clone();
        let texture_centroid =
            texture_face.points.iter().copied().sum::<Vec2>() / (texture_face.points.len() as f32);
        uvs.push(texture_centroid);
        uvs
    } else {
        vertices.iter().map(|v| Vec2::new(v.x + 0.5, 1.0 - (v.y + 0.5))).collect()
    };

    MaskGeometry {
        vertices,
        indices,
        uvs,
    }
}

#[cfg(test)]
mod tests {
    use super::{affine_fallback, barycentric, generate_uvs, landmark_mesh_geometry};
    use crate::observation::NormalizedRect;
    use crate::pose::mesh::{FaceMesh, MaskGeometry};
    use glam::{Vec2, Vec3};

    fn canonical_face() -> FaceMesh {
        // A plausible, schema-ordered 68-point layout: not anatomically
        // exact, but internally consistent enough to exercise the
        // triangulation (jaw spans left-to-right across y=0.7, brows and
        // eyes at y=0.4-0.5, nose down the center, mouth near the chin).
        let mut points = vec![Vec2::splat(0.5); 68];
        for (i, p) in points.iter_mut().enumerate().take(17) {
            let t = i as f32 / 16.0;
            *p = Vec2::new(0.1 + 0.8 * t, 0.75 + 0.15 * (t - 0.5).abs());
        }
        points[2] = Vec2::new(0.2, 0.6);
        points[14] = Vec2::new(0.8, 0.6);
        points[8] = Vec2::new(0.5, 0.95);
        points[21] = Vec2::new(0.45, 0.35);
        points[22] = Vec2::new(0.55, 0.35);
        points[30] = Vec2::new(0.5, 0.55);
        points[48] = Vec2::new(0.4, 0.75);
        points[54] = Vec2::new(0.6, 0.75);
        for i in 36..42 {
            points[i] = Vec2::new(0.38, 0.45);
        }
        for i in 42..48 {
            points[i] = Vec2::new(0.62, 0.45);
        }
        FaceMesh {
            points,
            bbox: NormalizedRect {
                x: 0.1,
                y: 0.1,
                w: 0.8,
                h: 0.8,
            },
            confidence: 1.0,
        }
    }

    #[test]
    fn barycentric_sums_to_one_inside_triangle() {
        let v1 = Vec2::new(0.0, 0.0);
        let v2 = Vec2::new(1.0, 0.0);
        let v3 = Vec2::new(0.0, 1.0);
        let (u, v, w) = barycentric(Vec2::new(0.25, 0.25), v1, v2, v3).expect("inside");
        assert!((u + v + w - 1.0).abs() < 1e-5);
    }

    #[test]
    fn barycentric_rejects_far_outside_point() {
        let v1 = Vec2::new(0.0, 0.0);
        let v2 = Vec2::new(1.0, 0.0);
        let v3 = Vec2::new(0.0, 1.0);
        assert!(barycentric(Vec2::new(5.0, 5.0), v1, v2, v3).is_none());
    }

    #[test]
    fn barycentric_skips_degenerate_triangle() {
        let v1 = Vec2::new(0.0, 0.0);
        let v2 = Vec2::new(1.0, 0.0);
        let v3 = Vec2::new(2.0, 0.0);
        assert!(barycentric(Vec2::new(0.5, 0.0), v1, v2, v3).is_none());
    }

    #[test]
    fn identity_faces_yield_identity_uvs() {
        let face = canonical_face();
        let mask = MaskGeometry {
            vertices: vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.2, -0.1, 0.0)],
            indices: Vec::new(),
            uvs: Vec::new(),
        };
        let uvs = generate_uvs(&mask, Some(&face), &face);
        assert!((uvs[0] - Vec2::new(0.5, 0.5)).length() < 1e-4);
        assert!((uvs[1] - Vec2::new(0.7, 0.4)).length() < 1e-4);
    }

    #[test]
    fn no_texture_face_falls_back_to_identity_uv() {
        let face = canonical_face();
        let mask = MaskGeometry {
            vertices: vec![Vec3::new(0.1, 0.2, 0.0)],
            indices: Vec::new(),
            uvs: Vec::new(),
        };
        let uvs = generate_uvs(&mask, None, &face);
        assert!((uvs[0] - Vec2::new(0.6, 0.7)).length() < 1e-4);
    }

    #[test]
    fn affine_fallback_maps_bbox_center_to_bbox_center() {
        let live = canonical_face();
        let mut texture = canonical_face();
        texture.bbox = NormalizedRect {
            x: 0.0,
            y: 0.0,
            w: 1.0,
            h: 1.0,
        };
        let mapped = affine_fallback(live.bbox.center(), &live, &texture);
        assert!((mapped - texture.bbox.center()).length() < 1e-4);
    }

    #[test]
    fn landmark_mesh_has_one_vertex_per_point_plus_hub() {
        let face = canonical_face();
        let geom = landmark_mesh_geometry(&face, None);
        assert_eq!(geom.vertices.len(), face.points.len() + 1);
        assert!(geom.is_well_formed());
        assert_eq!(geom.triangle_count(), 26);
    }

    #[test]
    fn landmark_mesh_uvs_follow_registered_texture_face_by_index() {
        let live = canonical_face();
        let mut texture = canonical_face();
        texture.points[0] = Vec2::new(0.9, 0.9);
        let geom = landmark_mesh_geometry(&live, Some(&texture));
        assert_eq!(geom.uvs[0], texture.points[0]);
    }
}
