//! The configured item handed to the cart.

use serde::{Deserialize, Serialize};

/// The configuration part of a cart item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ItemConfig {
    pub length_id: String,
    pub colors: Vec<String>,
    pub carabiner_id: String,
    /// Human-readable summary, e.g. `"3 m, Red + Navy, Silver"`.
    pub description: String,
}

/// A finished configuration, priced and with its preview attached.
///
/// Created once per "add to cart" and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ConfiguredItem {
    pub name: String,
    pub config: ItemConfig,
    pub price: f64,
    pub quantity: u32,
    /// Snapshot `data:` URL, or the primary swatch path if no snapshot
    /// could be made.
    #[serde(alias = "image")]
    pub preview_image: String,
}

impl ConfiguredItem {
    /// True if the preview is a rendered snapshot rather than the fallback path.
    pub fn has_snapshot(&self) -> bool {
        self.preview_image.starts_with("data:")
    }

    /// Price times quantity.
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn item(price: f64, quantity: u32) -> ConfiguredItem {
        ConfiguredItem {
            name: "Leash".into(),
            config: ItemConfig {
                length_id: "3m".into(),
                colors: vec!["red.jpg".into()],
                carabiner_id: "silver".into(),
                description: "3 m, Red, Silver".into(),
            },
            price,
            quantity,
            preview_image: "/kolory/red.jpg".into(),
        }
    }

    #[test]
    fn serializes_camel_case() {
        let json = item(20.0, 1).to_json().unwrap();
        assert!(json.contains(r#""previewImage":"/kolory/red.jpg""#));
        assert!(json.contains(r#""carabinerId":"silver""#));
        assert!(json.contains(r#""lengthId":"3m""#));
    }

    #[test]
    fn accepts_legacy_image_field() {
        let json = r#"{"name":"L","config":{"lengthId":"3m","colors":["a"],"carabinerId":"s","description":"d"},"price":1.0,"quantity":2,"image":"/x.jpg"}"#;
        let item: ConfiguredItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.preview_image, "/x.jpg");
        assert!(!item.has_snapshot());
        assert_eq!(item.line_total(), 2.0);
    }
}
