//! Loading and holding the three region masks.
//!
//! The store is empty (not ready) until [`MaskStore::load_all`] has decoded
//! every mask. Loading is all-or-nothing: if any source fails, nothing is
//! kept and the store stays not ready. Once ready it never reloads.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::decode;
use crate::error::AssetLoadError;
use crate::layer::LayerKind;
use crate::raster::RegionMask;

// ============================================================================
// MaskSource
// ============================================================================

/// Where a mask's encoded bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaskSource {
    /// A file on disk (PNG, JPEG, SVG, ...).
    Path(PathBuf),

    /// Encoded bytes already in memory, e.g. embedded with `include_bytes!`.
    Bytes(Arc<[u8]>),
}

impl MaskSource {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into().into())
    }

    async fn read(self, kind: LayerKind) -> Result<Arc<[u8]>, AssetLoadError> {
        match self {
            Self::Path(path) => tokio::fs::read(&path)
                .await
                .map(Arc::from)
                .map_err(|e| AssetLoadError::new(kind, format!("{}: {e}", path.display()))),
            Self::Bytes(bytes) => Ok(bytes),
        }
    }
}

impl From<PathBuf> for MaskSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

/// The three mask sources of one configurator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskSources {
    pub primary: MaskSource,
    pub secondary: MaskSource,
    pub hardware: MaskSource,
}

impl MaskSources {
    pub fn get(&self, kind: LayerKind) -> &MaskSource {
        match kind {
            LayerKind::Primary => &self.primary,
            LayerKind::Secondary => &self.secondary,
            LayerKind::Hardware => &self.hardware,
        }
    }
}

// ============================================================================
// MaskStore
// ============================================================================

#[derive(Debug, Clone)]
struct LoadedMasks {
    primary: Arc<RegionMask>,
    secondary: Arc<RegionMask>,
    hardware: Arc<RegionMask>,
}

/// Decoded region masks for one configurator session.
#[derive(Debug, Clone, Default)]
pub struct MaskStore {
    masks: Option<LoadedMasks>,
}

impl MaskStore {
    /// Creates an empty, not-ready store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ready store from already decoded masks.
    pub fn from_masks(primary: RegionMask, secondary: RegionMask, hardware: RegionMask) -> Self {
        Self {
            masks: Some(LoadedMasks {
                primary: Arc::new(primary),
                secondary: Arc::new(secondary),
                hardware: Arc::new(hardware),
            }),
        }
    }

    /// True once all three masks are decoded.
    pub fn is_ready(&self) -> bool {
        self.masks.is_some()
    }

    /// Returns the mask for `kind`, if loaded.
    pub fn get(&self, kind: LayerKind) -> Option<&Arc<RegionMask>> {
        let masks = self.masks.as_ref()?;
        Some(match kind {
            LayerKind::Primary => &masks.primary,
            LayerKind::Secondary => &masks.secondary,
            LayerKind::Hardware => &masks.hardware,
        })
    }

    /// Loads all three masks concurrently.
    ///
    /// File reads run on the async runtime and decoding on the blocking pool.
    /// Fails with the first [`AssetLoadError`] encountered; the store is left
    /// untouched in that case. Calling this on a ready store does nothing.
    #[tracing::instrument(skip_all)]
    pub async fn load_all(&mut self, sources: &MaskSources) -> Result<(), AssetLoadError> {
        if self.is_ready() {
            debug!("masks already loaded, ignoring reload");
            return Ok(());
        }

        let (primary, secondary, hardware) = tokio::try_join!(
            load_mask(LayerKind::Primary, sources.primary.clone()),
            load_mask(LayerKind::Secondary, sources.secondary.clone()),
            load_mask(LayerKind::Hardware, sources.hardware.clone()),
        )
        .inspect_err(|e| error!(mask = %e.name, reason = %e.reason, "failed to load masks"))?;

        info!(
            width = primary.size().width,
            height = primary.size().height,
            "masks ready"
        );
        self.masks = Some(LoadedMasks {
            primary,
            secondary,
            hardware,
        });
        Ok(())
    }
}

async fn load_mask(kind: LayerKind, source: MaskSource) -> Result<Arc<RegionMask>, AssetLoadError> {
    let bytes = source.read(kind).await?;

    let image = tokio::task::spawn_blocking(move || decode::decode_mask(&bytes))
        .await
        .map_err(|e| AssetLoadError::new(kind, format!("decoder task failed: {e}")))?
        .map_err(|e| AssetLoadError::new(kind, e.to_string()))?;

    debug!(mask = %kind, width = image.width(), height = image.height(), "decoded mask");
    Ok(Arc::new(RegionMask::new(kind, image)))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::tests::png_bytes;
    use crate::raster::SizePx;
    use image::{Rgba, RgbaImage};

    fn solid(width: u32, height: u32) -> MaskSource {
        let img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
        MaskSource::from_bytes(png_bytes(&img))
    }

    fn sources() -> MaskSources {
        MaskSources {
            primary: solid(8, 4),
            secondary: solid(8, 4),
            hardware: solid(8, 4),
        }
    }

    #[tokio::test]
    async fn loads_all_three_masks() {
        let mut store = MaskStore::new();
        assert!(!store.is_ready());
        assert!(store.get(LayerKind::Primary).is_none());

        store.load_all(&sources()).await.unwrap();

        assert!(store.is_ready());
        for kind in LayerKind::ALL {
            let mask = store.get(kind).unwrap();
            assert_eq!(mask.kind(), kind);
            assert_eq!(mask.size(), SizePx::new(8, 4));
        }
    }

    #[tokio::test]
    async fn failure_names_the_mask_and_leaves_store_empty() {
        let mut bad = sources();
        bad.secondary = MaskSource::from_bytes(b"garbage".to_vec());

        let mut store = MaskStore::new();
        let err = store.load_all(&bad).await.unwrap_err();

        assert_eq!(err.name, LayerKind::Secondary);
        assert!(!store.is_ready());
    }

    #[tokio::test]
    async fn missing_file_reports_path() {
        let mut bad = sources();
        bad.hardware = MaskSource::Path("/definitely/not/here.png".into());

        let err = MaskStore::new().load_all(&bad).await.unwrap_err();
        assert_eq!(err.name, LayerKind::Hardware);
        assert!(err.reason.contains("/definitely/not/here.png"));
    }

    #[tokio::test]
    async fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbaImage::from_pixel(5, 5, Rgba([0, 0, 0, 200]));
        let path = dir.path().join("primary.png");
        std::fs::write(&path, png_bytes(&img)).unwrap();

        let mut srcs = sources();
        srcs.primary = MaskSource::Path(path);

        let mut store = MaskStore::new();
        store.load_all(&srcs).await.unwrap();
        assert_eq!(
            store.get(LayerKind::Primary).unwrap().size(),
            SizePx::new(5, 5)
        );
    }

    #[tokio::test]
    async fn ready_store_does_not_reload() {
        let mut store = MaskStore::new();
        store.load_all(&sources()).await.unwrap();
        let before = Arc::clone(store.get(LayerKind::Primary).unwrap());

        let mut other = sources();
        other.primary = solid(2, 2);
        store.load_all(&other).await.unwrap();

        assert!(Arc::ptr_eq(&before, store.get(LayerKind::Primary).unwrap()));
    }
}
