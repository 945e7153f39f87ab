//! Error types for mask loading, tinting, flattening and catalog handling.
//!
//! Only [`AssetLoadError`] and [`CatalogError`] ever reach callers as hard
//! failures. Tint and flatten failures are recovered inside the pipeline
//! (a skipped layer, a fallback preview path) and surface as log events.

use crate::layer::LayerKind;
use thiserror::Error;

/// A named region mask could not be read or decoded.
#[derive(Debug, Error)]
#[error("failed to load {name} mask: {reason}")]
pub struct AssetLoadError {
    /// Which mask failed.
    pub name: LayerKind,
    /// Human-readable cause (I/O error, decoder message, ...).
    pub reason: String,
}

impl AssetLoadError {
    pub fn new(name: LayerKind, reason: impl Into<String>) -> Self {
        Self {
            name,
            reason: reason.into(),
        }
    }
}

/// A mask source could not be turned into pixels.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error("invalid SVG: {0}")]
    Svg(#[from] resvg::usvg::Error),

    #[error("image has zero width or height")]
    Empty,
}

/// Failure while tinting a single layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TintError {
    #[error("layer raster is {actual:?} but the mask is {expected:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("mask has no pixels")]
    EmptyMask,
}

/// Failure while flattening the layers into a snapshot.
#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("mask store never became ready")]
    NotReady,

    #[error("{0} layer has no raster to flatten")]
    MissingLayer(LayerKind),

    #[error("snapshot encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Problems with catalog or settings data.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog has no {0}")]
    Empty(&'static str),
}

/// Rejected configuration mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown length tier '{0}'")]
    UnknownLength(String),
}
