//! Mask placement math: 2D sticker mode and 3D head-locked mode (design
//! spec §4.3).

use glam::{Mat4, Vec3};

use crate::observation::NormalizedRect;

use super::rotation::euler_to_matrix;

/// Vertical field of view used for 3D placement and its view-projection,
/// 45 degrees.
const FOV_Y_RADIANS: f32 = std::f32::consts::FRAC_PI_4;
const NEAR: f32 = 0.1;
const FAR: f32 = 100.0;

/// Model matrix for a 2D sticker overlay: translate to the bbox center in
/// NDC, scale to the bbox extents. View-projection is the identity.
#[must_use]
pub fn sticker_model_matrix(bbox: NormalizedRect) -> Mat4 {
    let center = bbox.center();
    let ndc = Vec3::new(2.0 * center.x - 1.0, 2.0 * center.y - 1.0, 0.0);
    let extents = Vec3::new(2.0 * bbox.w, 2.0 * bbox.h, 1.0);
    Mat4::from_translation(ndc) * Mat4::from_scale(extents)
}

/// 3D placement: model matrix locking the mask to the detected head pose
/// and bbox-derived distance, plus the shared right-handed perspective
/// view-projection.
#[must_use]
pub fn placement_3d(bbox: NormalizedRect, aspect: f32, euler: Vec3, head_scale: f32) -> (Mat4, Mat4) {
    let half_fov_tan = (FOV_Y_RADIANS * 0.5).tan();
    let center = bbox.center();
    let ndc = Vec3::new(2.0 * center.x - 1.0, 2.0 * center.y - 1.0, 0.0);

    let distance = 1.0 / (bbox.w * half_fov_tan * 1.5);
    let world = Vec3::new(
        ndc.x * distance * aspect * half_fov_tan,
        ndc.y * distance * half_fov_tan,
        -distance,
    );

    let rotation = euler_to_matrix(euler);
    let model = Mat4::from_translation(world) * rotation * Mat4::from_scale(Vec3::splat(head_scale));
    let view_proj = Mat4::perspective_rh(FOV_Y_RADIANS, aspect, NEAR, FAR);
    (model, view_proj)
}

#[cfg(test)]
mod tests {
    use super::{placement_3d, sticker_model_matrix};
    use crate::observation::NormalizedRect;
    use glam::Vec3;

    #[test]
    fn sticker_matrix_centers_on_bbox() {
        let bbox = NormalizedRect {
            x: 0.25,
            y: 0.25,
            w: 0.5,
            h: 0.5,
        };
        let mat = sticker_model_matrix(bbox);
        let translated = mat.transform_point3(Vec3::ZERO);
        assert!((translated.x - 0.0).abs() < 1e-5);
        assert!((translated.y - 0.0).abs() < 1e-5);
    }

    #[test]
    fn placement_3d_places_mask_in_front_of_camera() {
        let bbox = NormalizedRect {
            x: 0.25,
            y: 0.25,
            w: 0.5,
            h: 0.5,
        };
        let (model, view_proj) = placement_3d(bbox, 16.0 / 9.0, Vec3::ZERO, 1.33);
        let world_pos = model.transform_point3(Vec3::ZERO);
        assert!(world_pos.z < 0.0, "mask must be in front of a camera looking down -Z");
        assert!(view_proj.is_finite());
    }

    #[test]
    fn larger_bbox_places_mask_closer() {
        let near_bbox = NormalizedRect {
            x: 0.1,
            y: 0.1,
            w: 0.8,
            h: 0.8,
        };
        let far_bbox = NormalizedRect {
            x: 0.4,
            y: 0.4,
            w: 0.2,
            h: 0.2,
        };
        let (near_model, _) = placement_3d(near_bbox, 1.0, Vec3::ZERO, 1.33);
        let (far_model, _) = placement_3d(far_bbox, 1.0, Vec3::ZERO, 1.33);
        let near_z = near_model.transform_point3(Vec3::ZERO).z;
        let far_z = far_model.transform_point3(Vec3::ZERO).z;
        assert!(near_z.abs() < far_z.abs(), "a larger bbox should sit closer to the camera");
    }
}
