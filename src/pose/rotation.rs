//! Euler-angle head-pose reconstruction (design spec §4.3).

use glam::{EulerRot, Mat4, Vec3};

/// Build `R = Rz·Ry·Rx` from `(pitch, yaw, roll)` radians, the standard
/// right-handed Tait-Bryan composition this crate uses for head pose.
#[must_use]
pub fn euler_to_matrix(euler: Vec3) -> Mat4 {
    let (pitch, yaw, roll) = (euler.x, euler.y, euler.z);
    Mat4::from_rotation_z(roll) * Mat4::from_rotation_y(yaw) * Mat4::from_rotation_x(pitch)
}

/// Inverse of [`euler_to_matrix`], valid away from gimbal lock
/// (`|pitch|, |roll| < π/2 − ε`). Used only by tests to assert the
/// round-trip law.
#[must_use]
#[cfg(test)]
fn matrix_to_euler(mat: Mat4) -> Vec3 {
    let (_, quat, _) = mat.to_scale_rotation_translation();
    let (z, y, x) = quat.to_euler(EulerRot::ZYX);
    Vec3::new(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::{euler_to_matrix, matrix_to_euler};
    use glam::Vec3;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn identity_angles_give_identity_matrix() {
        let mat = euler_to_matrix(Vec3::ZERO);
        assert!(mat.abs_diff_eq(glam::Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn euler_round_trips_away_from_gimbal_lock() {
        let original = Vec3::new(FRAC_PI_4 * 0.5, FRAC_PI_4 * 0.7, FRAC_PI_4 * 0.3);
        let mat = euler_to_matrix(original);
        let recovered = matrix_to_euler(mat);
        assert!((recovered.x - original.x).abs() < 1e-4);
        assert!((recovered.y - original.y).abs() < 1e-4);
        assert!((recovered.z - original.z).abs() < 1e-4);
    }
}
