//! Static reference data for the configurator.
//!
//! A [`Catalog`] is supplied by the storefront as JSON and treated as an
//! immutable lookup table. Field names follow the storefront's camelCase
//! conventions:
//!
//! ```json
//! {
//!   "productName": "Waterproof adjustable leash 20mm",
//!   "lengths": [{ "id": "3m", "label": "3 m", "description": "", "price": 20.0 }],
//!   "colors": [{ "file": "red.jpg", "name": "Red", "hexColor": "#cc0000" }],
//!   "carabiners": [{ "id": "silver", "name": "Silver", "file": "silver.png", "price": 0.0, "hexColor": "#c0c0c0" }],
//!   "masks": { "primary": "masks/primary.png", "secondary": "masks/secondary.png", "hardware": "masks/hardware.png" }
//! }
//! ```

use std::path::Path;

use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::color;
use crate::error::CatalogError;
use crate::mask_store::{MaskSource, MaskSources};

/// One purchasable length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct LengthTier {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
}

/// A tape colour swatch. Swatches are identified by their image file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct Swatch {
    pub file: String,
    pub name: String,
    pub hex_color: String,
}

impl Swatch {
    pub fn color(&self) -> Option<Srgb<u8>> {
        color::parse_hex(&self.hex_color)
    }
}

/// A hardware (carabiner) finish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct HardwareOption {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub price: f64,
    pub hex_color: String,
}

impl HardwareOption {
    pub fn color(&self) -> Option<Srgb<u8>> {
        color::parse_hex(&self.hex_color)
    }
}

/// Locations of the three region masks, relative to an asset root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct MaskPaths {
    pub primary: String,
    pub secondary: String,
    pub hardware: String,
}

/// The complete reference data set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// Product name written onto every configured item.
    #[serde(default = "default_product_name")]
    pub product_name: String,

    /// Ordered length tiers; the first is the default.
    pub lengths: Vec<LengthTier>,

    /// Ordered tape swatches; the first is the default primary colour.
    #[serde(rename = "colors")]
    pub swatches: Vec<Swatch>,

    /// Ordered hardware options; the first is the default.
    #[serde(rename = "carabiners")]
    pub hardware: Vec<HardwareOption>,

    pub masks: MaskPaths,

    /// Base photograph shown beneath the overlays.
    #[serde(default)]
    pub base_photo: String,

    /// Public directory holding swatch images.
    #[serde(default = "default_swatch_dir")]
    pub swatch_dir: String,

    /// Price added when two tape colours are chosen.
    #[serde(default = "default_surcharge")]
    pub two_color_surcharge: f64,
}

fn default_product_name() -> String {
    "Leash".to_string()
}

fn default_swatch_dir() -> String {
    "/kolory".to_string()
}

fn default_surcharge() -> f64 {
    5.0
}

impl Catalog {
    /// Parses and validates a catalog.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Reads, parses and validates a catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Every list must be non-empty so a default configuration exists.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.lengths.is_empty() {
            return Err(CatalogError::Empty("length tiers"));
        }
        if self.swatches.is_empty() {
            return Err(CatalogError::Empty("colour swatches"));
        }
        if self.hardware.is_empty() {
            return Err(CatalogError::Empty("hardware options"));
        }
        Ok(())
    }

    pub fn length(&self, id: &str) -> Option<&LengthTier> {
        self.lengths.iter().find(|l| l.id == id)
    }

    pub fn swatch(&self, file: &str) -> Option<&Swatch> {
        self.swatches.iter().find(|s| s.file == file)
    }

    pub fn hardware(&self, id: &str) -> Option<&HardwareOption> {
        self.hardware.iter().find(|h| h.id == id)
    }

    /// Colour of a swatch, or `fallback` if the swatch is unknown or its
    /// hex value is malformed.
    pub fn swatch_color(&self, file: Option<&str>, fallback: Srgb<u8>) -> Srgb<u8> {
        file.and_then(|f| self.swatch(f))
            .and_then(Swatch::color)
            .unwrap_or(fallback)
    }

    /// Colour of a hardware finish, with the same fallback rule as swatches.
    pub fn hardware_color(&self, id: &str, fallback: Srgb<u8>) -> Srgb<u8> {
        self.hardware(id)
            .and_then(HardwareOption::color)
            .unwrap_or(fallback)
    }

    /// Public path of a swatch's source image.
    pub fn swatch_path(&self, file: &str) -> String {
        format!("{}/{}", self.swatch_dir.trim_end_matches('/'), file)
    }

    /// Mask sources resolved against `root`.
    pub fn mask_sources(&self, root: impl AsRef<Path>) -> MaskSources {
        let root = root.as_ref();
        MaskSources {
            primary: MaskSource::Path(root.join(&self.masks.primary)),
            secondary: MaskSource::Path(root.join(&self.masks.secondary)),
            hardware: MaskSource::Path(root.join(&self.masks.hardware)),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::color::FALLBACK_COLOR;

    pub(crate) const CATALOG_JSON: &str = r##"{
        "productName": "Waterproof adjustable leash 20mm",
        "lengths": [
            { "id": "3m", "label": "3 m", "description": "three clips", "price": 20.0 },
            { "id": "5m", "label": "5 m", "price": 26.0 }
        ],
        "colors": [
            { "file": "red.jpg", "name": "Red", "hexColor": "#cc0000" },
            { "file": "navy.jpg", "name": "Navy", "hexColor": "#001f5b" },
            { "file": "broken.jpg", "name": "Broken", "hexColor": "not a colour" }
        ],
        "carabiners": [
            { "id": "silver", "name": "Silver", "file": "silver.png", "price": 0.0, "hexColor": "#c0c0c0" },
            { "id": "gold", "name": "Gold", "file": "gold.png", "price": 7.5, "hexColor": "#d4af37" }
        ],
        "masks": {
            "primary": "masks/primary.png",
            "secondary": "masks/secondary.png",
            "hardware": "masks/hardware.png"
        },
        "basePhoto": "/zdjecia/smycz.jpg"
    }"##;

    pub(crate) fn sample() -> Catalog {
        Catalog::from_json(CATALOG_JSON).unwrap()
    }

    #[test]
    fn parses_storefront_field_names() {
        let catalog = sample();
        assert_eq!(catalog.lengths.len(), 2);
        assert_eq!(catalog.swatches[1].name, "Navy");
        assert_eq!(catalog.hardware[1].price, 7.5);
        assert_eq!(catalog.two_color_surcharge, 5.0);
        assert_eq!(catalog.swatch_dir, "/kolory");
        assert_eq!(catalog.length("5m").unwrap().description, "");
    }

    #[test]
    fn unknown_references_fall_back() {
        let catalog = sample();
        assert_eq!(
            catalog.swatch_color(Some("red.jpg"), FALLBACK_COLOR),
            Srgb::new(0xcc, 0, 0)
        );
        assert_eq!(catalog.swatch_color(Some("teal.jpg"), FALLBACK_COLOR), FALLBACK_COLOR);
        assert_eq!(catalog.swatch_color(None, FALLBACK_COLOR), FALLBACK_COLOR);
        assert_eq!(catalog.swatch_color(Some("broken.jpg"), FALLBACK_COLOR), FALLBACK_COLOR);
        assert_eq!(catalog.hardware_color("titanium", FALLBACK_COLOR), FALLBACK_COLOR);
    }

    #[test]
    fn empty_lists_are_rejected() {
        let json = CATALOG_JSON.replace(
            r#""carabiners": ["#,
            r#""carabiners": [], "unused": ["#,
        );
        let err = Catalog::from_json(&json).unwrap_err();
        assert!(matches!(err, CatalogError::Empty("hardware options")));
    }

    #[test]
    fn swatch_path_joins_directory() {
        let mut catalog = sample();
        assert_eq!(catalog.swatch_path("red.jpg"), "/kolory/red.jpg");
        catalog.swatch_dir = "/assets/swatches/".into();
        assert_eq!(catalog.swatch_path("red.jpg"), "/assets/swatches/red.jpg");
    }

    #[test]
    fn mask_sources_resolve_against_root() {
        let sources = sample().mask_sources("/srv/static");
        assert_eq!(
            sources.hardware,
            MaskSource::Path("/srv/static/masks/hardware.png".into())
        );
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, CATALOG_JSON).unwrap();
        assert_eq!(Catalog::load(&path).unwrap(), sample());

        let missing = Catalog::load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, CatalogError::Io(_)));
    }
}
