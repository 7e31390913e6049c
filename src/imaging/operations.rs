//! The render pipeline shared by the live preview and the export.
//!
//! normalize → resolve icon → layout → composite. Preview and export run
//! exactly the same code; they differ only in the container they pass
//! (the preview viewport vs. [`Size::UNBOUNDED`]), which is what makes the
//! preview a faithful picture of the exported file.

use super::calculations::{LayoutEngine, LayoutResult};
use super::compositor::Compositor;
use super::params::RenderParams;
use crate::brand::BrandIconResolver;
use crate::config::PreviewConfig;
use crate::metadata::{DisplayMetadata, ExifMetadata, normalize};
use crate::types::Size;
use image::RgbaImage;
use std::sync::Arc;

/// Display-ready band content for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkContent {
    pub display: DisplayMetadata,
    /// Resolved brand icon, `""` when the make matched nothing.
    pub icon_id: String,
}

/// Normalize metadata and resolve the brand icon for the band.
pub fn prepare_watermark(raw: &ExifMetadata, resolver: &BrandIconResolver) -> WatermarkContent {
    let shown = normalize(raw);
    let icon_id = resolver.resolve(&shown.camera_make);
    if icon_id.is_empty() && !shown.camera_make.is_empty() {
        tracing::debug!(make = %shown.camera_make, "no brand icon for camera make");
    }
    WatermarkContent {
        display: shown,
        icon_id,
    }
}

/// One rendered composite and the geometry it was drawn with.
#[derive(Debug, Clone)]
pub struct Composite {
    pub layout: LayoutResult,
    pub raster: RgbaImage,
}

/// Everything needed to turn (image, metadata, params) into a composite.
/// Cheap to clone; clones share fonts, icons and the brand registry.
#[derive(Debug, Clone)]
pub struct Pipeline {
    engine: LayoutEngine,
    compositor: Compositor,
    resolver: Arc<BrandIconResolver>,
}

impl Pipeline {
    pub fn new(engine: LayoutEngine, compositor: Compositor, resolver: BrandIconResolver) -> Self {
        Self {
            engine,
            compositor,
            resolver: Arc::new(resolver),
        }
    }

    pub fn from_config(config: &PreviewConfig) -> Self {
        Self::new(
            LayoutEngine::new(config.watermark.band_height),
            Compositor::from_config(config),
            BrandIconResolver::with_entries(&config.icons.brands),
        )
    }

    /// Run the full pipeline. `metadata` is `None` when none is available,
    /// in which case the composite is just the bordered image.
    pub fn compose(
        &self,
        image: &RgbaImage,
        metadata: Option<&ExifMetadata>,
        params: &RenderParams,
        container: Size,
    ) -> Composite {
        let watermark = metadata.map(|raw| prepare_watermark(raw, &self.resolver));
        let intrinsic = Size::new(image.width(), image.height());
        let layout = self
            .engine
            .layout(intrinsic, container, params, watermark.is_some());

        tracing::debug!(
            composite = %layout.composite,
            scale = layout.scale,
            band = layout.has_band(),
            "composing"
        );

        let raster = match &watermark {
            Some(w) => {
                self.compositor
                    .render(image, Some(&w.display), &w.icon_id, &layout, params)
            }
            None => self.compositor.render(image, None, "", &layout, params),
        };

        Composite { layout, raster }
    }
}
