//! Layer compositing for the live preview.
//!
//! The preview is a base photograph with three tinted overlays stacked on
//! top. Each overlay is a [`Layer`] owning a scratch raster sized from its
//! region mask. [`LayerCompositor::recompute`] re-tints every layer from the
//! current configuration and publishes the result to a [`PreviewSurface`].
//!
//! # Stacking order
//!
//! ```text
//! ┌────────────┐
//! │  Hardware  │ z=3  opacity 0.85  ◄── hardware finish colour
//! ├────────────┤
//! │ Secondary  │ z=2  opacity 0.75  ◄── colors[1] in dual mode, else colors[0]
//! ├────────────┤
//! │  Primary   │ z=1  opacity 0.90  ◄── colors[0]
//! ├────────────┤
//! │ Base photo │ z=0
//! └────────────┘
//! ```
//!
//! Hardware must stay on top: fittings sit on tape seams and the masks
//! overlap there.

pub mod surface;
pub mod tint;

pub use surface::{PreviewSurface, RetainedSurfaces, SurfaceFrame};
pub use tint::{tint, tint_into};

use std::fmt;

use palette::Srgb;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::configuration::Configuration;
use crate::mask_store::MaskStore;
use crate::raster::LayerRaster;
use crate::settings::{LayerOpacities, PreviewSettings};

/// Z-index of the base photograph beneath all overlays.
pub const BASE_PHOTO_Z: u8 = 0;

// ============================================================================
// LayerKind
// ============================================================================

/// The three named overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Main tape region.
    Primary,
    /// Accent tape region.
    Secondary,
    /// Metal fittings.
    Hardware,
}

impl LayerKind {
    /// All layers, bottom to top.
    pub const ALL: [Self; 3] = [Self::Primary, Self::Secondary, Self::Hardware];

    pub fn z_index(self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Hardware => "hardware",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Secondary => 1,
            Self::Hardware => 2,
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Colour policy
// ============================================================================

/// Resolves the tint colour of `kind` for a configuration.
///
/// In single-colour mode the secondary silhouette takes the primary colour so
/// the accent region never shows as a hole. Unknown references resolve to
/// `fallback`.
pub fn layer_color(
    kind: LayerKind,
    config: &Configuration,
    catalog: &Catalog,
    fallback: Srgb<u8>,
) -> Srgb<u8> {
    match kind {
        LayerKind::Primary => catalog.swatch_color(Some(config.primary_color()), fallback),
        LayerKind::Secondary => {
            catalog.swatch_color(Some(config.effective_secondary_color()), fallback)
        }
        LayerKind::Hardware => catalog.hardware_color(config.hardware_id(), fallback),
    }
}

// ============================================================================
// Layer
// ============================================================================

/// One overlay: its scratch raster plus redraw bookkeeping.
#[derive(Debug, Clone)]
pub struct Layer {
    kind: LayerKind,
    raster: Option<LayerRaster>,
    generation: u64,
    color: Option<Srgb<u8>>,
}

impl Layer {
    fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            raster: None,
            generation: 0,
            color: None,
        }
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// The raster, once allocated.
    pub fn raster(&self) -> Option<&LayerRaster> {
        self.raster.as_ref()
    }

    /// Number of successful redraws so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Colour of the most recent successful redraw.
    pub fn color(&self) -> Option<Srgb<u8>> {
        self.color
    }
}

// ============================================================================
// LayerCompositor
// ============================================================================

/// Re-tints and publishes the three overlays.
///
/// Rasters are allocated once by [`allocate`](Self::allocate) when the masks
/// become ready and then reused by every recompute.
pub struct LayerCompositor<S: PreviewSurface = RetainedSurfaces> {
    layers: [Layer; 3],
    opacity: LayerOpacities,
    fallback: Srgb<u8>,
    surface: S,
}

impl<S: PreviewSurface> LayerCompositor<S> {
    pub fn new(settings: &PreviewSettings, surface: S) -> Self {
        Self {
            layers: LayerKind::ALL.map(Layer::new),
            opacity: settings.opacity,
            fallback: settings.fallback_rgb(),
            surface,
        }
    }

    /// Allocates one raster per loaded mask, sized to the mask.
    ///
    /// Only the first call on a ready store has any effect; returns whether
    /// rasters were allocated by this call.
    pub fn allocate(&mut self, masks: &MaskStore) -> bool {
        if !masks.is_ready() || self.is_allocated() {
            return false;
        }
        for layer in &mut self.layers {
            layer.raster = masks.get(layer.kind).map(|mask| LayerRaster::for_mask(mask));
        }
        true
    }

    /// True once any layer has a raster.
    pub fn is_allocated(&self) -> bool {
        self.layers.iter().any(|l| l.raster.is_some())
    }

    pub fn layer(&self, kind: LayerKind) -> &Layer {
        &self.layers[kind.index()]
    }

    /// Current raster contents of a layer.
    pub fn raster(&self, kind: LayerKind) -> Option<&LayerRaster> {
        self.layer(kind).raster()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Tint colour `kind` would get for `config`.
    pub fn color_for(&self, kind: LayerKind, config: &Configuration, catalog: &Catalog) -> Srgb<u8> {
        layer_color(kind, config, catalog, self.fallback)
    }

    /// Re-tints every layer and publishes it.
    ///
    /// Does nothing until `masks` is ready. A layer whose mask or raster is
    /// missing, or whose tint fails, is skipped; the others still update.
    /// Returns the number of layers redrawn.
    pub fn recompute(&mut self, config: &Configuration, catalog: &Catalog, masks: &MaskStore) -> usize {
        if !masks.is_ready() {
            return 0;
        }

        let mut redrawn = 0;
        for kind in LayerKind::ALL {
            let color = layer_color(kind, config, catalog, self.fallback);
            let layer = &mut self.layers[kind.index()];

            let Some(mask) = masks.get(kind) else {
                warn!(layer = %kind, "mask missing, skipping layer");
                continue;
            };
            let Some(raster) = layer.raster.as_mut() else {
                warn!(layer = %kind, "raster not allocated, skipping layer");
                continue;
            };

            if let Err(e) = tint_into(mask, color, raster) {
                warn!(layer = %kind, error = %e, "tint failed, skipping layer");
                continue;
            }

            layer.generation += 1;
            layer.color = Some(color);
            self.surface
                .publish(kind, raster.image(), self.opacity.get(kind));
            redrawn += 1;
        }

        debug!(redrawn, "recomputed preview layers");
        redrawn
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::tests::sample;
    use crate::color::FALLBACK_COLOR;
    use crate::configuration::{ColorMode, Mutation};
    use crate::raster::RegionMask;
    use image::{Rgba, RgbaImage};

    /// Primary covers the left half, secondary the right half, hardware a
    /// centre column overlapping the secondary region.
    pub(crate) fn test_masks() -> MaskStore {
        let (w, h) = (8, 4);
        let mut primary = RgbaImage::new(w, h);
        let mut secondary = RgbaImage::new(w, h);
        let mut hardware = RgbaImage::new(w, h);
        for y in 0..h {
            for x in 0..w {
                if x < 4 {
                    primary.put_pixel(x, y, Rgba([0, 0, 0, 255]));
                } else {
                    secondary.put_pixel(x, y, Rgba([0, 0, 0, 255]));
                }
                if x == 4 || x == 5 {
                    hardware.put_pixel(x, y, Rgba([0, 0, 0, 255]));
                }
            }
        }
        // Soft edge on the primary region.
        primary.put_pixel(3, 0, Rgba([0, 0, 0, 128]));

        MaskStore::from_masks(
            RegionMask::new(LayerKind::Primary, primary),
            RegionMask::new(LayerKind::Secondary, secondary),
            RegionMask::new(LayerKind::Hardware, hardware),
        )
    }

    fn compositor(masks: &MaskStore) -> LayerCompositor {
        let mut c = LayerCompositor::new(&PreviewSettings::default(), RetainedSurfaces::new());
        assert!(c.allocate(masks));
        c
    }

    fn dual(catalog: &Catalog) -> Configuration {
        let mut config = Configuration::defaults_for(catalog);
        config = config.with(Mutation::SetColorMode(ColorMode::Dual));
        config.with(Mutation::SelectColor("navy.jpg".into()))
    }

    #[test]
    fn stacking_order_is_fixed() {
        assert_eq!(BASE_PHOTO_Z, 0);
        let z: Vec<_> = LayerKind::ALL.iter().map(|k| k.z_index()).collect();
        assert_eq!(z, vec![1, 2, 3]);
    }

    #[test]
    fn recompute_is_noop_until_ready() {
        let catalog = sample();
        let mut c = LayerCompositor::new(&PreviewSettings::default(), RetainedSurfaces::new());
        let not_ready = MaskStore::new();

        assert!(!c.allocate(&not_ready));
        let redrawn = c.recompute(&Configuration::defaults_for(&catalog), &catalog, &not_ready);

        assert_eq!(redrawn, 0);
        assert_eq!(c.surface().publishes(), 0);
        assert!(c.raster(LayerKind::Primary).is_none());
    }

    #[test]
    fn allocation_happens_once() {
        let masks = test_masks();
        let mut c = compositor(&masks);
        assert!(!c.allocate(&masks));
        assert_eq!(c.raster(LayerKind::Hardware).unwrap().size().as_tuple(), (8, 4));
    }

    #[test]
    fn recompute_publishes_all_layers_with_opacity() {
        let catalog = sample();
        let masks = test_masks();
        let mut c = compositor(&masks);

        assert_eq!(c.recompute(&dual(&catalog), &catalog, &masks), 3);

        let surfaces = c.surface();
        assert_eq!(surfaces.frame(LayerKind::Primary).unwrap().opacity, 0.90);
        assert_eq!(surfaces.frame(LayerKind::Secondary).unwrap().opacity, 0.75);
        assert_eq!(surfaces.frame(LayerKind::Hardware).unwrap().opacity, 0.85);

        let primary = c.raster(LayerKind::Primary).unwrap().image();
        assert_eq!(primary.get_pixel(0, 0).0, [0xcc, 0, 0, 255]);
        assert_eq!(primary.get_pixel(3, 0).0, [0xcc, 0, 0, 128]);
        assert_eq!(primary.get_pixel(6, 0).0, [0, 0, 0, 0]);

        let secondary = c.raster(LayerKind::Secondary).unwrap().image();
        assert_eq!(secondary.get_pixel(6, 0).0, [0x00, 0x1f, 0x5b, 255]);
    }

    #[test]
    fn recompute_is_idempotent() {
        let catalog = sample();
        let masks = test_masks();
        let mut c = compositor(&masks);
        let config = dual(&catalog);

        c.recompute(&config, &catalog, &masks);
        let first: Vec<_> = LayerKind::ALL
            .iter()
            .map(|k| c.raster(*k).unwrap().clone())
            .collect();
        c.recompute(&config, &catalog, &masks);
        let second: Vec<_> = LayerKind::ALL
            .iter()
            .map(|k| c.raster(*k).unwrap().clone())
            .collect();

        assert_eq!(first, second);
        assert_eq!(c.layer(LayerKind::Primary).generation(), 2);
    }

    #[test]
    fn single_mode_secondary_uses_primary_colour() {
        let catalog = sample();
        let masks = test_masks();
        let mut c = compositor(&masks);

        for swatch in &catalog.swatches {
            let config = dual(&catalog)
                .with(Mutation::SetColorMode(ColorMode::Single))
                .with(Mutation::SelectColor(swatch.file.clone()));
            c.recompute(&config, &catalog, &masks);
            assert_eq!(
                c.layer(LayerKind::Secondary).color(),
                c.layer(LayerKind::Primary).color()
            );
        }
    }

    #[test]
    fn mode_round_trip_restores_secondary_tint() {
        let catalog = sample();
        let masks = test_masks();
        let mut c = compositor(&masks);

        let config = dual(&catalog);
        c.recompute(&config, &catalog, &masks);
        let before = c.raster(LayerKind::Secondary).unwrap().clone();

        let config = config.with(Mutation::SetColorMode(ColorMode::Single));
        c.recompute(&config, &catalog, &masks);
        assert_ne!(c.raster(LayerKind::Secondary).unwrap(), &before);

        let config = config.with(Mutation::SetColorMode(ColorMode::Dual));
        c.recompute(&config, &catalog, &masks);
        assert_eq!(c.raster(LayerKind::Secondary).unwrap(), &before);
    }

    #[test]
    fn unknown_references_use_fallback_grey() {
        let catalog = sample();
        let masks = test_masks();
        let c = compositor(&masks);

        let config = Configuration::defaults_for(&catalog)
            .with(Mutation::SelectColor("teal.jpg".into()))
            .with(Mutation::SetHardware("titanium".into()));

        assert_eq!(c.color_for(LayerKind::Primary, &config, &catalog), FALLBACK_COLOR);
        assert_eq!(c.color_for(LayerKind::Hardware, &config, &catalog), FALLBACK_COLOR);
    }

    #[test]
    fn mismatched_layer_is_skipped_others_update() {
        let catalog = sample();
        let masks = test_masks();
        let mut c = compositor(&masks);

        // Swap in a raster of the wrong size for the secondary layer.
        let wrong = RegionMask::new(LayerKind::Secondary, RgbaImage::new(2, 2));
        c.layers[LayerKind::Secondary.index()].raster = Some(LayerRaster::for_mask(&wrong));

        let redrawn = c.recompute(&dual(&catalog), &catalog, &masks);

        assert_eq!(redrawn, 2);
        assert_eq!(c.layer(LayerKind::Secondary).generation(), 0);
        assert_eq!(c.layer(LayerKind::Hardware).generation(), 1);
        assert!(c.surface().frame(LayerKind::Secondary).is_none());
    }

    #[test]
    fn layer_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&LayerKind::Hardware).unwrap(),
            "\"hardware\""
        );
        assert_eq!(LayerKind::Secondary.to_string(), "secondary");
    }
}
