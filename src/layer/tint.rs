//! Flat-colour tinting of region masks.
//!
//! Tinting is a "source-atop" fill with an opaque colour: wherever the mask
//! has coverage its RGB becomes the fill colour and its alpha is kept
//! untouched, so anti-aliased edges stay soft. Uncovered pixels are fully
//! transparent in the output.

use image::RgbaImage;
use palette::Srgb;

use crate::error::TintError;
use crate::raster::{LayerRaster, RegionMask};

/// Returns a tinted copy of `mask`.
pub fn tint(mask: &RegionMask, color: Srgb<u8>) -> RgbaImage {
    let mut out = mask.image().clone();
    fill_atop(&mut out, color);
    out
}

/// Tints `mask` into an existing raster without reallocating it.
///
/// The raster must have exactly the mask's dimensions.
pub fn tint_into(
    mask: &RegionMask,
    color: Srgb<u8>,
    raster: &mut LayerRaster,
) -> Result<(), TintError> {
    let expected = mask.size();
    if expected.is_empty() {
        return Err(TintError::EmptyMask);
    }
    let actual = raster.size();
    if actual != expected {
        return Err(TintError::DimensionMismatch {
            expected: expected.as_tuple(),
            actual: actual.as_tuple(),
        });
    }

    let dst: &mut [u8] = raster.pixels_mut();
    dst.copy_from_slice(mask.image().as_raw());
    fill_atop(raster.pixels_mut(), color);
    Ok(())
}

fn fill_atop(img: &mut RgbaImage, color: Srgb<u8>) {
    let (r, g, b) = color.into_components();
    for pixel in img.pixels_mut() {
        let a = pixel[3];
        pixel.0 = if a == 0 { [0, 0, 0, 0] } else { [r, g, b, a] };
    }
}
