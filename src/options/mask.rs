use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One of the five canonical mask geometry variants, plus a
/// landmark-derived mesh (design spec §3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MaskStyle {
    /// Hemispheric helmet.
    #[default]
    HemisphericHelmet,
    /// Organic ellipsoid.
    OrganicEllipsoid,
    /// Low-poly helmet.
    LowPolyHelmet,
    /// Flat disc sticker.
    FlatDisc,
    /// Flat quad sticker.
    FlatQuad,
    /// Mesh derived from a registered texture face's landmarks.
    LandmarkMesh,
}

impl MaskStyle {
    /// `true` for the 2D sticker variants that bypass 3D pose (§4.3,
    /// "sticker mode").
    #[must_use]
    pub const fn is_sticker(self) -> bool {
        matches!(self, Self::FlatDisc | Self::FlatQuad)
    }
}

/// Mask appearance and placement settings (design spec §5: published from
/// the UI executor to the processing executor as an atomic-per-frame
/// hand-off).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Mask", inline)]
#[serde(default)]
pub struct MaskOptions {
    /// Whether the mask overlay is drawn at all.
    pub enabled: bool,
    /// Geometry variant.
    pub style: MaskStyle,
    /// Tint color, linear RGB in `[0, 1]`.
    pub color: [f32; 3],
    /// Uniform head scale applied in the 3D model matrix.
    pub scale: f32,
}

impl Default for MaskOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            style: MaskStyle::HemisphericHelmet,
            color: [0.8, 0.8, 0.85],
            scale: 1.33,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MaskStyle;

    #[test]
    fn sticker_styles_flagged() {
        assert!(MaskStyle::FlatDisc.is_sticker());
        assert!(MaskStyle::FlatQuad.is_sticker());
        assert!(!MaskStyle::HemisphericHelmet.is_sticker());
    }
}
