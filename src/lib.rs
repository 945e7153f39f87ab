//! leash-preview: live colour preview for a configurable leash
//!
//! This crate tints three region masks (primary tape, secondary tape and
//! hardware) according to the buyer's choices, stacks them over a product
//! photograph, and flattens the result into a JPEG snapshot that travels
//! with the item into the cart.
//!
//! # Example
//!
//! ```no_run
//! use leash_preview::{Cart, Catalog, ColorMode, Configurator, PreviewSettings};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Catalog::load("catalog.json")?;
//! let sources = catalog.mask_sources("public");
//!
//! let mut configurator = Configurator::new(catalog, PreviewSettings::default());
//! configurator.load_masks(&sources).await?;
//!
//! configurator.set_color_mode(ColorMode::Dual);
//! configurator.select_color("navy.jpg");
//! configurator.set_hardware("gold");
//!
//! let mut cart = Cart::new();
//! let item = configurator.add_to_cart(&mut cart);
//! println!("{} for {:.2}", item.config.description, item.price);
//! # Ok(())
//! # }
//! ```
//!
//! # Serializable State
//!
//! The configuration, catalog, settings and cart items all serialize to the
//! storefront's camelCase JSON:
//!
//! ```
//! use leash_preview::Configuration;
//!
//! let config = Configuration::new("3m", "red.jpg", "silver");
//! let json = config.to_json().unwrap();
//! assert_eq!(Configuration::from_json(&json).unwrap(), config);
//! ```

mod cart;
mod catalog;
mod color;
mod configuration;
mod configurator;
mod decode;
mod error;
mod item;
mod layer;
mod mask_store;
mod raster;
mod settings;
mod snapshot;

pub use cart::{Cart, CartEntry, CartSink};
pub use catalog::{Catalog, HardwareOption, LengthTier, MaskPaths, Swatch};
pub use color::{FALLBACK_COLOR, parse_hex, parse_or, to_hex};
pub use configuration::{ColorMode, ColorSlot, Configuration, ConfigurationState, Mutation};
pub use configurator::{Configurator, SessionState};
pub use error::{AssetLoadError, CatalogError, ConfigError, DecodeError, FlattenError, TintError};
pub use item::{ConfiguredItem, ItemConfig};
pub use layer::{
    BASE_PHOTO_Z, Layer, LayerCompositor, LayerKind, PreviewSurface, RetainedSurfaces,
    SurfaceFrame, layer_color, tint, tint_into,
};
pub use mask_store::{MaskSource, MaskSources, MaskStore};
pub use raster::{LayerRaster, RegionMask, SizePx};
pub use settings::{LayerOpacities, PreviewSettings};
pub use snapshot::{Snapshot, composite_over, data_url, flatten};
