//! Raster types shared by the mask store, compositor and flattener.
//!
//! A [`RegionMask`] is the decoded, immutable silhouette of one leash part.
//! A [`LayerRaster`] is the scratch buffer a layer tints into; it is sized
//! from its mask once and then only ever overwritten.

use crate::layer::LayerKind;
use image::RgbaImage;

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the size of an RGBA image.
    pub fn of(image: &RgbaImage) -> Self {
        Self::new(image.width(), image.height())
    }

    /// Returns true if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_tuple(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// A decoded region mask.
///
/// The alpha channel defines where the part appears on the base photograph;
/// the colour channels are irrelevant once tinted. Masks are never mutated
/// after decoding, so they are shared behind an `Arc` by the mask store.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMask {
    kind: LayerKind,
    data: RgbaImage,
}

impl RegionMask {
    pub fn new(kind: LayerKind, data: RgbaImage) -> Self {
        Self { kind, data }
    }

    /// Which layer this mask belongs to.
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Native decoded dimensions.
    pub fn size(&self) -> SizePx {
        SizePx::of(&self.data)
    }

    /// The decoded pixels.
    pub fn image(&self) -> &RgbaImage {
        &self.data
    }

    /// Number of pixels with non-zero alpha.
    pub fn coverage(&self) -> usize {
        self.data.pixels().filter(|p| p[3] > 0).count()
    }
}

/// Per-layer scratch raster.
///
/// Allocated transparent with the dimensions of its mask. The compositor
/// rewrites its pixels in place; the dimensions never change.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRaster {
    data: RgbaImage,
}

impl LayerRaster {
    /// Allocates a fully transparent raster for `mask`.
    pub fn for_mask(mask: &RegionMask) -> Self {
        let size = mask.size();
        Self {
            data: RgbaImage::new(size.width, size.height),
        }
    }

    pub fn size(&self) -> SizePx {
        SizePx::of(&self.data)
    }

    /// Current pixel contents.
    pub fn image(&self) -> &RgbaImage {
        &self.data
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn size_px_empty() {
        assert!(SizePx::new(0, 10).is_empty());
        assert!(!SizePx::new(3, 10).is_empty());
    }

    #[test]
    fn mask_coverage_counts_visible_pixels() {
        let mut img = RgbaImage::new(4, 4);
        img.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 0, 0, 10]));
        let mask = RegionMask::new(LayerKind::Primary, img);
        assert_eq!(mask.coverage(), 2);
        assert_eq!(mask.size(), SizePx::new(4, 4));
    }

    #[test]
    fn layer_raster_matches_mask_and_starts_transparent() {
        let mask = RegionMask::new(
            LayerKind::Secondary,
            RgbaImage::from_pixel(7, 3, Rgba([255, 255, 255, 255])),
        );
        let raster = LayerRaster::for_mask(&mask);
        assert_eq!(raster.size(), SizePx::new(7, 3));
        assert!(raster.image().pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }
}
