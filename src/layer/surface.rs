//! Display surfaces the compositor publishes tinted layers to.
//!
//! Tinting is pure; publishing is the effect at the boundary. The compositor
//! only ever calls [`PreviewSurface::publish`], so a page can plug in any
//! display target while tests use [`RetainedSurfaces`].

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};

use super::LayerKind;
use crate::snapshot::data_url;

/// Receiver of freshly tinted layers.
pub trait PreviewSurface {
    /// Shows `image` for `kind` at the given display opacity.
    ///
    /// Called once per layer per recompute, in stacking order.
    fn publish(&mut self, kind: LayerKind, image: &RgbaImage, opacity: f32);
}

/// The last frame published for one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceFrame {
    pub image: RgbaImage,
    pub opacity: f32,
}

impl SurfaceFrame {
    /// Stacking position above the base photograph.
    pub fn z_index(&self, kind: LayerKind) -> u8 {
        kind.z_index()
    }

    /// Encodes the frame as a PNG `data:` URL for use as a CSS background.
    pub fn to_png_data_url(&self) -> Result<String, image::ImageError> {
        let mut buf = Cursor::new(Vec::new());
        self.image.write_to(&mut buf, ImageFormat::Png)?;
        Ok(data_url("image/png", buf.get_ref()))
    }
}

/// In-memory surfaces keeping the latest frame of every layer.
#[derive(Debug, Clone, Default)]
pub struct RetainedSurfaces {
    frames: [Option<SurfaceFrame>; 3],
    publishes: u64,
}

impl RetainedSurfaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self, kind: LayerKind) -> Option<&SurfaceFrame> {
        self.frames[kind.index()].as_ref()
    }

    /// Published frames from bottom to top.
    pub fn stacked(&self) -> impl Iterator<Item = (LayerKind, &SurfaceFrame)> {
        LayerKind::ALL
            .into_iter()
            .filter_map(|kind| self.frame(kind).map(|f| (kind, f)))
    }

    /// Total number of publish calls received.
    pub fn publishes(&self) -> u64 {
        self.publishes
    }
}

impl PreviewSurface for RetainedSurfaces {
    fn publish(&mut self, kind: LayerKind, image: &RgbaImage, opacity: f32) {
        self.publishes += 1;
        let slot = &mut self.frames[kind.index()];
        match slot {
            Some(frame) => {
                frame.image.clone_from(image);
                frame.opacity = opacity;
            }
            None => {
                *slot = Some(SurfaceFrame {
                    image: image.clone(),
                    opacity,
                });
            }
        }
    }
}
