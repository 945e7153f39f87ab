//! Flattening the preview into a single portable image.
//!
//! The snapshot stacks the raw tinted layer rasters (primary, secondary,
//! hardware) at full coverage; display opacity is not applied. The result is
//! matted onto an opaque background and JPEG-encoded.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use palette::Srgb;
use tracing::{debug, warn};

use crate::error::FlattenError;
use crate::layer::{LayerCompositor, LayerKind, PreviewSurface};
use crate::raster::SizePx;
use crate::settings::PreviewSettings;

/// Builds a `data:` URL for `bytes`.
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

// ============================================================================
// Snapshot
// ============================================================================

/// A flattened, encoded preview.
#[derive(Debug, Clone)]
pub struct Snapshot {
    raster: RgbaImage,
    jpeg: Vec<u8>,
}

impl Snapshot {
    /// Dimensions of the flattened image.
    pub fn dimensions(&self) -> SizePx {
        SizePx::of(&self.raster)
    }

    /// The stacked layers before matting and encoding.
    pub fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    /// Encoded JPEG bytes.
    pub fn jpeg_bytes(&self) -> &[u8] {
        &self.jpeg
    }

    /// The snapshot as a `data:image/jpeg;base64,...` URL.
    pub fn to_data_url(&self) -> String {
        data_url("image/jpeg", &self.jpeg)
    }
}

// ============================================================================
// Flattening
// ============================================================================

/// Stacks the compositor's current layer rasters into one image.
///
/// The output takes the primary raster's dimensions. Secondary or hardware
/// layers without a raster are left out; a missing primary raster is an
/// error.
pub fn flatten<S: PreviewSurface>(
    compositor: &LayerCompositor<S>,
    settings: &PreviewSettings,
) -> Result<Snapshot, FlattenError> {
    if !compositor.is_allocated() {
        return Err(FlattenError::NotReady);
    }
    let reference = compositor
        .raster(LayerKind::Primary)
        .ok_or(FlattenError::MissingLayer(LayerKind::Primary))?;

    let size = reference.size();
    let mut out = RgbaImage::new(size.width, size.height);
    for kind in LayerKind::ALL {
        match compositor.raster(kind) {
            Some(raster) => composite_over(&mut out, raster.image(), 0, 0),
            None => warn!(layer = %kind, "no raster, leaving layer out of snapshot"),
        }
    }

    let matted = matte(&out, settings.background_rgb());
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, settings.quality()).encode_image(&matted)?;

    debug!(
        width = size.width,
        height = size.height,
        bytes = jpeg.len(),
        "flattened snapshot"
    );
    Ok(Snapshot { raster: out, jpeg })
}

/// Composites `src` onto `dest` at the given offset (source over).
pub fn composite_over(dest: &mut RgbaImage, src: &RgbaImage, x: i32, y: i32) {
    let dest_width = dest.width() as i32;
    let dest_height = dest.height() as i32;

    for (sx, sy, src_pixel) in src.enumerate_pixels() {
        let dx = x + sx as i32;
        let dy = y + sy as i32;
        if dx < 0 || dy < 0 || dx >= dest_width || dy >= dest_height {
            continue;
        }
        if src_pixel[3] == 0 {
            continue;
        }

        let dst_pixel = dest.get_pixel_mut(dx as u32, dy as u32);
        *dst_pixel = alpha_blend(*src_pixel, *dst_pixel);
    }
}

/// Straight-alpha source-over blend.
fn alpha_blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |s: u8, d: u8| -> u8 {
        let sf = s as f32 / 255.0;
        let df = d as f32 / 255.0;
        let out = (sf * sa + df * da * (1.0 - sa)) / out_a;
        (out * 255.0).round() as u8
    };

    Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

/// Drops alpha by blending onto an opaque background.
fn matte(img: &RgbaImage, background: Srgb<u8>) -> RgbImage {
    let (br, bg, bb) = background.into_components();
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let p = img.get_pixel(x, y);
        let a = p[3] as f32 / 255.0;
        let mix = |c: u8, b: u8| (c as f32 * a + b as f32 * (1.0 - a)).round() as u8;
        Rgb([mix(p[0], br), mix(p[1], bg), mix(p[2], bb)])
    })
}

// ============================================================================
// Tests
// ============================================================================
