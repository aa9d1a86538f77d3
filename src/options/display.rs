use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Background-quad display toggles (design spec §4.4).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Display", inline)]
#[serde(default)]
pub struct DisplayOptions {
    /// Enable the pixelation grid over the detected face bbox. `0.0`
    /// disables pixelation regardless of `hasFace`.
    pub pixel_size: f32,
    /// Show the green bbox outline + RGB axis gizmo debug overlay.
    pub debug_overlay: bool,
    /// Apply horizontal mirroring (selfie view) before compositing.
    pub mirrored: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            pixel_size: 0.03,
            debug_overlay: false,
            mirrored: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DisplayOptions;

    #[test]
    fn default_pixel_size_matches_spec() {
        assert!((DisplayOptions::default().pixel_size - 0.03).abs() < 1e-6);
    }
}
