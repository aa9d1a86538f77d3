//! GPU-visible uniform structs for the background and mask passes. Field
//! layout and padding mirror the corresponding WGSL struct exactly.

use glam::Mat4;

/// Uniforms for `assets/shaders/background.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BackgroundParams {
    /// `(x, y, w, h)` face bbox, top-left-origin UV space.
    pub bbox: [f32; 4],
    /// Axis-gizmo orientation for the debug overlay.
    pub orientation_matrix: [[f32; 4]; 4],
    /// Nonzero iff a face was detected this frame.
    pub has_face: u32,
    /// Pixelation grid cell size; `0.0` disables pixelation.
    pub pixel_size: f32,
    /// Nonzero to draw the bbox/axis debug overlay.
    pub debug_enabled: u32,
    _pad: u32,
}

impl BackgroundParams {
    /// Build the uniform for one frame.
    #[must_use]
    pub fn new(bbox: [f32; 4], orientation_matrix: Mat4, has_face: bool, pixel_size: f32, debug_enabled: bool) -> Self {
        Self {
            bbox,
            orientation_matrix: orientation_matrix.to_cols_array_2d(),
            has_face: u32::from(has_face),
            pixel_size,
            debug_enabled: u32::from(debug_enabled),
            _pad: 0,
        }
    }
}

/// Uniforms for `assets/shaders/mask.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaskParams {
    /// Model matrix placing the mask in view space.
    pub model: [[f32; 4]; 4],
    /// View-projection matrix (identity in sticker mode).
    pub view_proj: [[f32; 4]; 4],
    /// Tint color, linear RGB with alpha.
    pub color: [f32; 4],
    /// Nonzero bypasses lighting (2D sticker overlay).
    pub sticker_mode: u32,
    /// Nonzero iff a mask texture is bound.
    pub has_texture: u32,
    /// Seconds elapsed since the pipeline started, for the sine pattern.
    pub time: f32,
    _pad: u32,
}

impl MaskParams {
    /// Build the uniform for one frame.
    #[must_use]
    pub fn new(model: Mat4, view_proj: Mat4, color: [f32; 4], sticker_mode: bool, has_texture: bool, time: f32) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            view_proj: view_proj.to_cols_array_2d(),
            color,
            sticker_mode: u32::from(sticker_mode),
            has_texture: u32::from(has_texture),
            time,
            _pad: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BackgroundParams, MaskParams};

    #[test]
    fn background_params_matches_wgsl_layout_size() {
        assert_eq!(std::mem::size_of::<BackgroundParams>(), 96);
    }

    #[test]
    fn mask_params_matches_wgsl_layout_size() {
        assert_eq!(std::mem::size_of::<MaskParams>(), 160);
    }
}
