//! Mask decoding.
//!
//! Raster formats go through `image`; SVG documents are rasterized at their
//! intrinsic size with resvg so vector masks line up with raster ones.

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

use crate::error::DecodeError;

/// Decodes encoded mask bytes into straight-alpha RGBA.
pub fn decode_mask(bytes: &[u8]) -> Result<RgbaImage, DecodeError> {
    let image = if looks_like_svg(bytes) {
        rasterize_svg(bytes)?
    } else {
        image::load_from_memory(bytes)?.to_rgba8()
    };

    if image.width() == 0 || image.height() == 0 {
        return Err(DecodeError::Empty);
    }
    Ok(image)
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let text = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let start = text
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(text.len());
    let text = &text[start..];
    text.starts_with(b"<svg") || text.starts_with(b"<?xml")
}

fn rasterize_svg(bytes: &[u8]) -> Result<RgbaImage, DecodeError> {
    let tree = Tree::from_data(bytes, &Options::default())?;

    let size = tree.size();
    let width = size.width().ceil() as u32;
    let height = size.height().ceil() as u32;

    let mut pixmap = Pixmap::new(width, height).ok_or(DecodeError::Empty)?;
    resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

    Ok(pixmap_to_rgba_image(&pixmap))
}

/// Converts a premultiplied tiny_skia pixmap to straight-alpha RGBA.
fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());

    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let (r, g, b, a) = unpremultiply(src.red(), src.green(), src.blue(), src.alpha());
        *dst = Rgba([r, g, b, a]);
    }

    img
}

fn unpremultiply(r: u8, g: u8, b: u8, a: u8) -> (u8, u8, u8, u8) {
    if a == 0 {
        (0, 0, 0, 0)
    } else {
        let a_f = a as f32 / 255.0;
        (
            (r as f32 / a_f).round().min(255.0) as u8,
            (g as f32 / a_f).round().min(255.0) as u8,
            (b as f32 / a_f).round().min(255.0) as u8,
            a,
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::ImageFormat;
    use std::io::Cursor;

    pub(crate) fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    const RECT_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="6"><rect x="0" y="0" width="5" height="6" fill="#000000"/></svg>"##;

    #[test]
    fn decodes_png() {
        let img = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 128]));
        let decoded = decode_mask(&png_bytes(&img)).unwrap();
        assert_eq!(decoded, img);
    }

    #[test]
    fn rasterizes_svg_at_intrinsic_size() {
        let decoded = decode_mask(RECT_SVG.as_bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 6));
        assert_eq!(decoded.get_pixel(2, 3)[3], 255);
        assert_eq!(decoded.get_pixel(8, 3)[3], 0);
    }

    #[test]
    fn leading_whitespace_still_detects_svg() {
        let padded = format!("\n  {RECT_SVG}");
        assert!(looks_like_svg(padded.as_bytes()));
        assert!(!looks_like_svg(b"\x89PNG"));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode_mask(b"definitely not an image").is_err());
        assert!(matches!(
            decode_mask(b"<svg oops").unwrap_err(),
            DecodeError::Svg(_)
        ));
    }

    #[test]
    fn unpremultiply_transparent() {
        assert_eq!(unpremultiply(0, 0, 0, 0), (0, 0, 0, 0));
        assert_eq!(unpremultiply(64, 0, 0, 128), (128, 0, 0, 128));
    }
}
