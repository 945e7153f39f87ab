//! Tunable preview settings.
//!
//! Every field has a default matching the stock configurator, so an empty
//! JSON object deserializes to the standard behaviour:
//!
//! ```json
//! {
//!   "opacity": { "primary": 0.9, "secondary": 0.75, "hardware": 0.85 },
//!   "fallbackColor": "#d9d9d9",
//!   "snapshotQuality": 80,
//!   "snapshotBackground": "#ffffff"
//! }
//! ```

use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::color::{self, FALLBACK_COLOR};
use crate::layer::LayerKind;

/// Display opacity of each overlay on the live preview.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct LayerOpacities {
    pub primary: f32,
    pub secondary: f32,
    pub hardware: f32,
}

impl Default for LayerOpacities {
    fn default() -> Self {
        Self {
            primary: 0.90,
            secondary: 0.75,
            hardware: 0.85,
        }
    }
}

impl LayerOpacities {
    /// Opacity for `kind`, clamped to 0.0-1.0.
    pub fn get(&self, kind: LayerKind) -> f32 {
        let value = match kind {
            LayerKind::Primary => self.primary,
            LayerKind::Secondary => self.secondary,
            LayerKind::Hardware => self.hardware,
        };
        value.clamp(0.0, 1.0)
    }
}

/// Settings for tinting and snapshot encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(default, rename_all = "camelCase")]
pub struct PreviewSettings {
    /// Per-layer display opacity.
    pub opacity: LayerOpacities,

    /// Colour used for unknown swatch or hardware references.
    pub fallback_color: String,

    /// JPEG quality of the flattened snapshot (1-100).
    pub snapshot_quality: u8,

    /// Opaque background the snapshot is matted onto before encoding.
    pub snapshot_background: String,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            opacity: LayerOpacities::default(),
            fallback_color: color::to_hex(FALLBACK_COLOR),
            snapshot_quality: 80,
            snapshot_background: "#ffffff".to_string(),
        }
    }
}

impl PreviewSettings {
    /// The fallback colour, or the built-in grey if the setting is malformed.
    pub fn fallback_rgb(&self) -> Srgb<u8> {
        color::parse_or(Some(&self.fallback_color), FALLBACK_COLOR)
    }

    /// The snapshot matte colour, white if malformed.
    pub fn background_rgb(&self) -> Srgb<u8> {
        color::parse_or(Some(&self.snapshot_background), Srgb::new(255, 255, 255))
    }

    /// JPEG quality clamped to the encoder's accepted range.
    pub fn quality(&self) -> u8 {
        self.snapshot_quality.clamp(1, 100)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
