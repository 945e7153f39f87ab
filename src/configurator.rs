//! The configurator session.
//!
//! [`Configurator`] owns everything one product page needs: the catalog, the
//! mask store, the configuration state and the layer compositor. It drives
//! the `Loading → Ready` transition and re-tints the preview whenever a
//! mutation changes the configuration.
//!
//! # Example
//!
//! ```
//! use leash_preview::{Cart, Catalog, Configurator, Mutation, PreviewSettings};
//!
//! let catalog = Catalog::from_json(r##"{
//!     "lengths": [{ "id": "3m", "label": "3 m", "price": 20.0 }],
//!     "colors": [{ "file": "red.jpg", "name": "Red", "hexColor": "#cc0000" }],
//!     "carabiners": [{ "id": "silver", "name": "Silver", "price": 0.0, "hexColor": "#c0c0c0" }],
//!     "masks": { "primary": "p.png", "secondary": "s.png", "hardware": "h.png" }
//! }"##).unwrap();
//!
//! let mut configurator = Configurator::new(catalog, PreviewSettings::default());
//! configurator.dispatch(Mutation::SetHardware("silver".into())).unwrap();
//!
//! // Masks were never loaded, so the preview falls back to the swatch image.
//! let mut cart = Cart::new();
//! let item = configurator.add_to_cart(&mut cart);
//! assert_eq!(item.preview_image, "/kolory/red.jpg");
//! assert_eq!(cart.total(), 20.0);
//! ```

use tracing::{debug, info, warn};

use crate::cart::CartSink;
use crate::catalog::Catalog;
use crate::configuration::{ColorMode, ColorSlot, Configuration, ConfigurationState, Mutation};
use crate::error::{AssetLoadError, ConfigError, FlattenError};
use crate::item::{ConfiguredItem, ItemConfig};
use crate::layer::{LayerCompositor, PreviewSurface, RetainedSurfaces};
use crate::mask_store::{MaskSources, MaskStore};
use crate::settings::PreviewSettings;
use crate::snapshot::{self, Snapshot};

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Masks not decoded yet; mutations are recorded but nothing is drawn.
    Loading,
    /// Masks decoded and rasters allocated.
    Ready,
}

// ============================================================================
// Configurator
// ============================================================================

/// One configurator session.
pub struct Configurator<S: PreviewSurface = RetainedSurfaces> {
    catalog: Catalog,
    settings: PreviewSettings,
    masks: MaskStore,
    state: ConfigurationState,
    compositor: LayerCompositor<S>,
}

impl Configurator {
    /// Creates a session in the `Loading` state with the catalog defaults.
    pub fn new(catalog: Catalog, settings: PreviewSettings) -> Self {
        Self::with_surface(catalog, settings, RetainedSurfaces::new())
    }
}

impl<S: PreviewSurface> Configurator<S> {
    /// Creates a session that publishes layers to `surface`.
    pub fn with_surface(catalog: Catalog, settings: PreviewSettings, surface: S) -> Self {
        let state = ConfigurationState::new(Configuration::defaults_for(&catalog));
        let compositor = LayerCompositor::new(&settings, surface);
        Self {
            catalog,
            settings,
            masks: MaskStore::new(),
            state,
            compositor,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &PreviewSettings {
        &self.settings
    }

    pub fn configuration(&self) -> &Configuration {
        self.state.current()
    }

    pub fn compositor(&self) -> &LayerCompositor<S> {
        &self.compositor
    }

    pub fn surface(&self) -> &S {
        self.compositor.surface()
    }

    pub fn session_state(&self) -> SessionState {
        if self.masks.is_ready() {
            SessionState::Ready
        } else {
            SessionState::Loading
        }
    }

    /// Registers an observer called after every configuration change.
    pub fn subscribe(&mut self, observer: impl FnMut(&Configuration) + Send + 'static) {
        self.state.subscribe(observer);
    }

    // ------------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------------

    /// Loads the three masks and, on success, moves to `Ready` and draws the
    /// current configuration.
    ///
    /// On failure the session stays in `Loading`; the error has already been
    /// logged by the store. Calling this once ready does nothing.
    pub async fn load_masks(&mut self, sources: &MaskSources) -> Result<(), AssetLoadError> {
        if self.masks.is_ready() {
            return Ok(());
        }
        self.masks.load_all(sources).await?;
        self.on_ready();
        Ok(())
    }

    /// Installs an already loaded store. Ignored once ready or if `masks`
    /// is not ready itself.
    pub fn attach_masks(&mut self, masks: MaskStore) {
        if self.masks.is_ready() || !masks.is_ready() {
            return;
        }
        self.masks = masks;
        self.on_ready();
    }

    fn on_ready(&mut self) {
        self.compositor.allocate(&self.masks);
        info!("configurator ready");
        self.redraw();
    }

    fn redraw(&mut self) -> usize {
        self.compositor
            .recompute(self.state.current(), &self.catalog, &self.masks)
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Applies a mutation, redrawing if the configuration changed.
    ///
    /// Returns whether it changed. Lengths must exist in the catalog; colour
    /// and hardware ids are accepted as given and fall back to grey when
    /// drawn.
    pub fn dispatch(&mut self, mutation: Mutation) -> Result<bool, ConfigError> {
        if let Mutation::SetLength(id) = &mutation {
            if self.catalog.length(id).is_none() {
                return Err(ConfigError::UnknownLength(id.clone()));
            }
        }

        let changed = self.state.apply(mutation);
        if changed {
            let redrawn = self.redraw();
            debug!(revision = self.state.revision(), redrawn, "configuration changed");
        }
        Ok(changed)
    }

    /// Replaces the whole configuration, e.g. one restored from JSON.
    pub fn replace_configuration(&mut self, config: Configuration) -> Result<bool, ConfigError> {
        if self.catalog.length(config.length_id()).is_none() {
            return Err(ConfigError::UnknownLength(config.length_id().to_string()));
        }
        let changed = self.state.replace(config);
        if changed {
            self.redraw();
        }
        Ok(changed)
    }

    pub fn set_length(&mut self, id: impl Into<String>) -> Result<bool, ConfigError> {
        self.dispatch(Mutation::SetLength(id.into()))
    }

    pub fn set_color_mode(&mut self, mode: ColorMode) -> bool {
        self.apply(Mutation::SetColorMode(mode))
    }

    pub fn select_color(&mut self, file: impl Into<String>) -> bool {
        self.apply(Mutation::SelectColor(file.into()))
    }

    pub fn set_hardware(&mut self, id: impl Into<String>) -> bool {
        self.apply(Mutation::SetHardware(id.into()))
    }

    pub fn set_active_slot(&mut self, slot: ColorSlot) -> bool {
        self.apply(Mutation::SetActiveSlot(slot))
    }

    // Only length mutations can be rejected.
    fn apply(&mut self, mutation: Mutation) -> bool {
        self.dispatch(mutation).unwrap_or(false)
    }

    // ------------------------------------------------------------------------
    // Pricing and description
    // ------------------------------------------------------------------------

    /// Length price plus hardware price, plus the surcharge in dual mode.
    pub fn total_price(&self) -> f64 {
        let config = self.configuration();
        let length = self
            .catalog
            .length(config.length_id())
            .map_or(0.0, |l| l.price);
        let hardware = self
            .catalog
            .hardware(config.hardware_id())
            .map_or(0.0, |h| h.price);
        let surcharge = match config.color_mode() {
            ColorMode::Single => 0.0,
            ColorMode::Dual => self.catalog.two_color_surcharge,
        };
        length + hardware + surcharge
    }

    /// `"{length}, {colour}[ + {colour}], {hardware}"`, with ids standing in
    /// for unknown entries.
    pub fn description(&self) -> String {
        let config = self.configuration();
        let length = self
            .catalog
            .length(config.length_id())
            .map_or(config.length_id(), |l| l.label.as_str());
        let colors = config
            .selected_colors()
            .into_iter()
            .map(|file| self.catalog.swatch(file).map_or(file, |s| s.name.as_str()))
            .collect::<Vec<_>>()
            .join(" + ");
        let hardware = self
            .catalog
            .hardware(config.hardware_id())
            .map_or(config.hardware_id(), |h| h.name.as_str());
        format!("{length}, {colors}, {hardware}")
    }

    // ------------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------------

    /// Flattens the current layers.
    pub fn snapshot(&self) -> Result<Snapshot, FlattenError> {
        snapshot::flatten(&self.compositor, &self.settings)
    }

    /// The snapshot as a data URL, or the primary swatch path if no snapshot
    /// can be made.
    pub fn preview_image(&self) -> String {
        match self.snapshot() {
            Ok(snapshot) => snapshot.to_data_url(),
            Err(e) => {
                warn!(error = %e, "snapshot unavailable, using swatch image");
                self.catalog
                    .swatch_path(self.configuration().primary_color())
            }
        }
    }

    /// Builds the item for the current configuration with quantity 1.
    pub fn build_item(&self) -> ConfiguredItem {
        let config = self.configuration();
        ConfiguredItem {
            name: self.catalog.product_name.clone(),
            config: ItemConfig {
                length_id: config.length_id().to_string(),
                colors: config.selected_colors().into_iter().map(String::from).collect(),
                carabiner_id: config.hardware_id().to_string(),
                description: self.description(),
            },
            price: self.total_price(),
            quantity: 1,
            preview_image: self.preview_image(),
        }
    }

    /// Builds the item and hands it to `cart`. Never fails; a missing
    /// snapshot only changes the preview image.
    pub fn add_to_cart(&self, cart: &mut impl CartSink) -> ConfiguredItem {
        let item = self.build_item();
        let id = cart.add_item(item.clone());
        info!(%id, price = item.price, snapshot = item.has_snapshot(), "added configuration to cart");
        item
    }
}

// ============================================================================
// Tests
// ============================================================================
