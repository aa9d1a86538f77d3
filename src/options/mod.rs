//! Centralized runtime configuration with TOML preset support.
//!
//! All tweakable settings (mask style, pixelation, color, debug overlays)
//! are consolidated here. Options serialize to/from TOML so a UI shell can
//! persist named presets; this crate only reads/writes the TOML, never the
//! UI itself (persistence is an external concern, §6).

mod display;
mod mask;

use std::path::Path;

pub use display::DisplayOptions;
pub use mask::{MaskOptions, MaskStyle};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::AnonCamError;

/// Top-level options container. All sub-structs use `#[serde(default)]`
/// so partial TOML files (e.g. only overriding `[mask]`) work correctly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
#[serde(default)]
pub struct AnonCamOptions {
    /// Background/pixelation display toggles.
    pub display: DisplayOptions,
    /// Mask style, color, and scale.
    pub mask: MaskOptions,
}

impl AnonCamOptions {
    /// Generate a JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(AnonCamOptions)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AnonCamError::Io`] if the file cannot be read, or
    /// [`AnonCamError::OptionsParse`] if it is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, AnonCamError> {
        let content = std::fs::read_to_string(path).map_err(AnonCamError::Io)?;
        toml::from_str(&content).map_err(|e| AnonCamError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`AnonCamError::OptionsParse`] if serialization fails, or
    /// [`AnonCamError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), AnonCamError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| AnonCamError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(AnonCamError::Io)?;
        }
        std::fs::write(path, content).map_err(AnonCamError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::{AnonCamOptions, MaskStyle};

    #[test]
    fn default_round_trips_through_toml() {
        let opts = AnonCamOptions::default();
        let toml_str = toml::to_string_pretty(&opts).expect("serialize");
        let parsed: AnonCamOptions = toml::from_str(&toml_str).expect("parse");
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
[mask]
style = "flat_disc"
"#;
        let opts: AnonCamOptions = toml::from_str(toml_str).expect("parse");
        assert_eq!(opts.mask.style, MaskStyle::FlatDisc);
        assert!((opts.display.pixel_size - 0.03).abs() < 1e-6);
    }

    #[test]
    fn schema_has_expected_properties() {
        let schema_value = serde_json::to_value(AnonCamOptions::json_schema()).expect("schema");
        let props = schema_value["properties"].as_object().expect("object");
        assert!(props.contains_key("display"));
        assert!(props.contains_key("mask"));
    }
}
