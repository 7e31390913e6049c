//! Font discovery and immediate-mode text drawing.
//!
//! [`FontBook`] resolves a family name to a loaded font: it looks for
//! `<family>.ttf` / `<family>.otf` (and `-Regular` variants) in each
//! configured directory, then walks the fallback list of font files. Results
//! are cached per family, including misses, so a missing font is reported
//! once rather than on every frame.
//!
//! Drawing goes glyph by glyph with kerning, blending coverage into the
//! canvas and clipping to a caller-supplied rectangle. With no font
//! available the compositor skips text entirely; the rest of the composite
//! is unaffected.

use crate::config::FontsConfig;
use crate::types::{Color, Rect};
use ab_glyph::{Font, FontVec, GlyphId, PxScale, ScaleFont, point};
use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a usable font file: {0}")]
    Invalid(PathBuf),
}

/// Font files searched for a family inside each font directory.
fn family_candidates(family: &str) -> [String; 4] {
    [
        format!("{family}.ttf"),
        format!("{family}.otf"),
        format!("{family}-Regular.ttf"),
        format!("{family}-Regular.otf"),
    ]
}

/// Load a font file. Collections (`.ttc`) use their first face.
pub fn load_font(path: &Path) -> Result<FontVec, FontError> {
    let bytes = std::fs::read(path)?;
    FontVec::try_from_vec_and_index(bytes, 0).map_err(|_| FontError::Invalid(path.to_path_buf()))
}

/// Family name → loaded font, with directory search and fallbacks.
#[derive(Default)]
pub struct FontBook {
    dirs: Vec<PathBuf>,
    fallback: Vec<PathBuf>,
    loaded: Mutex<HashMap<String, Option<Arc<FontVec>>>>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("dirs", &self.dirs)
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl FontBook {
    pub fn new(config: &FontsConfig) -> Self {
        Self {
            dirs: config.dirs.clone(),
            fallback: config.fallback.clone(),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// A font book that never finds anything. Text is skipped.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The font for `family`, or the first usable fallback, or `None`.
    pub fn resolve(&self, family: &str) -> Option<Arc<FontVec>> {
        let mut loaded = self.loaded.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = loaded.get(family) {
            return hit.clone();
        }

        let found = self.locate(family).map(Arc::new);
        if found.is_none() {
            tracing::warn!(family, "no usable font found; watermark text will be skipped");
        }
        loaded.insert(family.to_string(), found.clone());
        found
    }

    fn locate(&self, family: &str) -> Option<FontVec> {
        let named = self
            .dirs
            .iter()
            .flat_map(|dir| family_candidates(family).map(|name| dir.join(name)));

        named.chain(self.fallback.iter().cloned()).find_map(|path| {
            if !path.is_file() {
                return None;
            }
            match load_font(&path) {
                Ok(font) => {
                    tracing::debug!(family, path = %path.display(), "loaded font");
                    Some(font)
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping font");
                    None
                }
            }
        })
    }
}

/// Horizontal and vertical extent of a line of text at a given size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub width: f32,
    pub ascent: f32,
    /// Negative: distance below the baseline.
    pub descent: f32,
}

impl TextMetrics {
    pub fn height(&self) -> f32 {
        self.ascent - self.descent
    }
}

/// Measure `text` set in `font` at `size` pixels.
pub fn measure(font: &FontVec, size: f32, text: &str) -> TextMetrics {
    let scaled = font.as_scaled(PxScale::from(size));
    let mut width = 0.0f32;
    let mut prev: Option<GlyphId> = None;

    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(p) = prev {
            width += scaled.kern(p, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }

    TextMetrics {
        width,
        ascent: scaled.ascent(),
        descent: scaled.descent(),
    }
}

/// Largest size not above `size` at which `text` fits in `max_width`.
///
/// Never returns less than `min_size`; the caller clips anything wider.
pub fn fit_size(font: &FontVec, text: &str, size: f32, max_width: f32, min_size: f32) -> f32 {
    let width = measure(font, size, text).width;
    if width <= max_width || width <= 0.0 {
        return size;
    }
    (size * max_width / width).max(min_size)
}

/// Font, pixel size and color for one run of text.
#[derive(Clone, Copy)]
pub struct TextStyle<'a> {
    pub font: &'a FontVec,
    pub size: f32,
    pub color: Color,
}

impl TextStyle<'_> {
    pub fn measure(&self, text: &str) -> TextMetrics {
        measure(self.font, self.size, text)
    }
}

/// Draw one line of text with its top edge at `top`, clipped to `clip`.
pub fn draw_text(
    canvas: &mut RgbaImage,
    style: TextStyle<'_>,
    x: f32,
    top: f32,
    text: &str,
    clip: Rect,
) {
    let TextStyle { font, size, color } = style;
    let scale = PxScale::from(size);
    let scaled = font.as_scaled(scale);
    let baseline = top + scaled.ascent();
    let clip = clip_to_canvas(clip, canvas);

    let mut cursor = x;
    let mut prev: Option<GlyphId> = None;

    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(p) = prev {
            cursor += scaled.kern(p, id);
        }

        let glyph = id.with_scale_and_position(scale, point(cursor, baseline));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i64 + gx as i64;
                let py = bounds.min.y as i64 + gy as i64;
                if px < clip.x as i64
                    || py < clip.y as i64
                    || px >= clip.right() as i64
                    || py >= clip.bottom() as i64
                {
                    return;
                }
                blend_pixel(canvas, px as u32, py as u32, color, coverage);
            });
        }

        cursor += scaled.h_advance(id);
        prev = Some(id);
    }
}

fn clip_to_canvas(clip: Rect, canvas: &RgbaImage) -> Rect {
    let right = clip.right().min(canvas.width());
    let bottom = clip.bottom().min(canvas.height());
    Rect::new(
        clip.x,
        clip.y,
        right.saturating_sub(clip.x),
        bottom.saturating_sub(clip.y),
    )
}

/// Source-over blend of `color` at `coverage` (0..=1) onto one pixel.
pub fn blend_pixel(canvas: &mut RgbaImage, x: u32, y: u32, color: Color, coverage: f32) {
    let src_a = coverage.clamp(0.0, 1.0) * color.a as f32 / 255.0;
    if src_a <= 0.0 {
        return;
    }
    let Rgba([dr, dg, db, da]) = *canvas.get_pixel(x, y);
    let dst_a = da as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);

    let mix = |s: u8, d: u8| -> u8 {
        let v = (s as f32 * src_a + d as f32 * dst_a * (1.0 - src_a)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };

    canvas.put_pixel(
        x,
        y,
        Rgba([
            mix(color.r, dr),
            mix(color.g, dg),
            mix(color.b, db),
            (out_a * 255.0).round() as u8,
        ]),
    );
}
