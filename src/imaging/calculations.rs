//! Layout geometry for the composite.
//!
//! All functions here are pure and testable without any I/O or images. The
//! engine is recomputed from scratch on every call; callers decide when a
//! new layout is needed (image, border, container or metadata changed).
//!
//! Geometry, bottom band:
//!
//! ```text
//! ┌──────────────────────────────┐  ─┐
//! │           border             │   │ b
//! │   ┌──────────────────────┐   │  ─┘
//! │   │        image         │   │
//! │   ├──────────────────────┤   │
//! │   │    watermark band    │   │  band_height (0 without metadata)
//! │   └──────────────────────┘   │
//! │                              │
//! └──────────────────────────────┘
//! ```
//!
//! A top band swaps the image and band rows. The band always spans the
//! drawn image's width, so composite width is `draw_width + 2b` and
//! composite height is `draw_height + 2b + band_height`.

use super::params::RenderParams;
use crate::types::{Position, Rect, Size};

/// Computes composite geometry. Holds only the fixed band height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutEngine {
    pub band_height: u32,
}

/// Geometry of one composite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutResult {
    /// Full raster size.
    pub composite: Size,
    /// Where the (possibly downscaled) image is drawn.
    pub image: Rect,
    /// Watermark band. Zero height when there is no metadata.
    pub band: Rect,
    /// Part of the band for camera text, shooting parameters and icon.
    pub content: Rect,
    /// Strip at the top or bottom edge of the band reserved for copyright.
    pub copyright: Option<Rect>,
    /// Drawn size / intrinsic size, never above 1.
    pub scale: f64,
    pub border: u32,
}

impl LayoutResult {
    pub fn has_band(&self) -> bool {
        self.band.height > 0
    }
}

impl LayoutEngine {
    pub const fn new(band_height: u32) -> Self {
        Self { band_height }
    }

    /// Compute the layout for `image` inside `container` with the given
    /// parameters. Pass [`Size::UNBOUNDED`] as the container to keep the
    /// image at intrinsic size (export).
    pub fn layout(
        &self,
        image: Size,
        container: Size,
        params: &RenderParams,
        has_metadata: bool,
    ) -> LayoutResult {
        let b = params.border_size;
        let band_h = if has_metadata { self.band_height } else { 0 };

        let available = Size::new(
            container.width.saturating_sub(b.saturating_mul(2)),
            container
                .height
                .saturating_sub(b.saturating_mul(2).saturating_add(band_h)),
        );
        let (drawn, scale) = fit_within(image, available);

        let (image_rect, band) = match params.watermark_position {
            Position::Bottom => (
                Rect::new(b, b, drawn.width, drawn.height),
                Rect::new(b, b.saturating_add(drawn.height), drawn.width, band_h),
            ),
            Position::Top => (
                Rect::new(b, b.saturating_add(band_h), drawn.width, drawn.height),
                Rect::new(b, b, drawn.width, band_h),
            ),
        };

        let (content, copyright) = if has_metadata && !params.copyright.trim().is_empty() {
            split_copyright_strip(band, params.copyright_position)
        } else {
            (band, None)
        };

        LayoutResult {
            composite: Size::new(
                drawn.width.saturating_add(b.saturating_mul(2)),
                drawn
                    .height
                    .saturating_add(b.saturating_mul(2))
                    .saturating_add(band_h),
            ),
            image: image_rect,
            band,
            content,
            copyright,
            scale,
            border: b,
        }
    }
}

/// Scale `source` down (never up) so it fits inside `available`, keeping
/// aspect ratio. Returns the drawn size and the scale factor.
///
/// Drawn dimensions never drop below 1 pixel.
pub fn fit_within(source: Size, available: Size) -> (Size, f64) {
    if source.width == 0 || source.height == 0 {
        return (source, 1.0);
    }

    let scale = 1.0_f64
        .min(available.width as f64 / source.width as f64)
        .min(available.height as f64 / source.height as f64);

    if scale >= 1.0 {
        return (source, 1.0);
    }

    let scaled = |v: u32| ((v as f64 * scale).round() as u32).clamp(1, v);
    (Size::new(scaled(source.width), scaled(source.height)), scale)
}

/// Split a band into the content area and a copyright strip along the
/// chosen edge. The strip takes a quarter of the band height.
fn split_copyright_strip(band: Rect, position: Position) -> (Rect, Option<Rect>) {
    if band.height < 2 {
        return (band, None);
    }
    let strip_h = (band.height / 4).max(1);
    let content_h = band.height - strip_h;

    match position {
        Position::Top => (
            Rect::new(band.x, band.y + strip_h, band.width, content_h),
            Some(Rect::new(band.x, band.y, band.width, strip_h)),
        ),
        Position::Bottom => (
            Rect::new(band.x, band.y, band.width, content_h),
            Some(Rect::new(band.x, band.y + content_h, band.width, strip_h)),
        ),
    }
}
