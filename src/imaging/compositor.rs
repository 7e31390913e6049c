//! Immediate-mode compositor.
//!
//! Paints one composite raster from a source image, display metadata, a
//! resolved icon id, a [`LayoutResult`] and the current [`RenderParams`].
//! Layering is fixed:
//!
//! 1. the whole canvas in `border_color`
//! 2. the image rectangle in the neutral image background
//! 3. the image (resized when the layout downscaled it)
//! 4. the watermark band, only with metadata: camera and lens on the left,
//!    shooting parameters and timestamp right-aligned on the right, a
//!    `text_color` divider left of them, the brand icon left of the divider
//! 5. copyright centered in its strip at the top or bottom of the band
//!
//! Output depends only on the inputs, so rendering twice gives identical
//! bytes. Missing fonts or icon graphics drop that element and nothing else.

use super::calculations::LayoutResult;
use super::icons::IconSet;
use super::params::RenderParams;
use super::text::{FontBook, TextStyle, draw_text, fit_size, measure};
use crate::config::PreviewConfig;
use crate::metadata::DisplayMetadata;
use crate::types::{Color, Rect};
use ab_glyph::FontVec;
use image::RgbaImage;
use image::imageops::{self, FilterType};
use std::borrow::Cow;
use std::sync::Arc;

const DIVIDER_WIDTH: u32 = 2;
/// Smallest size text is shrunk to before it is clipped instead.
const MIN_TEXT_SIZE: f32 = 6.0;
const LENS_SCALE: f32 = 0.85;
const PARAMS_SCALE: f32 = 0.85;
const TIMESTAMP_SCALE: f32 = 0.7;
const COPYRIGHT_SCALE: f32 = 0.75;
/// Vertical gap between stacked lines, as a fraction of the line's size.
const LINE_GAP: f32 = 0.15;

/// Shared, cheaply clonable drawing context: fonts, icons and the neutral
/// fill used under the image.
#[derive(Debug, Clone)]
pub struct Compositor {
    fonts: Arc<FontBook>,
    icons: Arc<IconSet>,
    image_background: Color,
}

/// Where each element of the band goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BandPlan {
    left: Rect,
    right: Rect,
    divider: Rect,
    icon: Option<Rect>,
}

struct Line {
    text: String,
    size: f32,
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

impl Compositor {
    pub fn new(fonts: Arc<FontBook>, icons: Arc<IconSet>, image_background: Color) -> Self {
        Self {
            fonts,
            icons,
            image_background,
        }
    }

    pub fn from_config(config: &PreviewConfig) -> Self {
        Self::new(
            Arc::new(FontBook::new(&config.fonts)),
            Arc::new(IconSet::new(config.icons.dir.clone())),
            config.preview.image_background,
        )
    }

    /// Paint the composite. `metadata` is `None` when no metadata is
    /// available; the band is then skipped even if the layout has one.
    pub fn render(
        &self,
        image: &RgbaImage,
        metadata: Option<&DisplayMetadata>,
        icon: &str,
        layout: &LayoutResult,
        params: &RenderParams,
    ) -> RgbaImage {
        let size = layout.composite;
        let mut canvas =
            RgbaImage::from_pixel(size.width, size.height, params.border_color.to_pixel());

        fill_rect(&mut canvas, layout.image, self.image_background);
        self.draw_image(&mut canvas, image, layout.image);

        if let Some(meta) = metadata.filter(|_| layout.has_band()) {
            let font = self.fonts.resolve(&params.font_family);
            self.draw_band(&mut canvas, font.as_deref(), meta, icon, layout.content, params);

            if let (Some(strip), Some(font)) = (layout.copyright, font.as_deref()) {
                draw_copyright(&mut canvas, font, strip, params);
            }
        }

        canvas
    }

    fn draw_image(&self, canvas: &mut RgbaImage, image: &RgbaImage, target: Rect) {
        if target.is_empty() {
            return;
        }
        let source = if image.dimensions() == (target.width, target.height) {
            Cow::Borrowed(image)
        } else {
            Cow::Owned(imageops::resize(image, target.width, target.height, FilterType::Triangle))
        };
        imageops::overlay(canvas, &*source, target.x as i64, target.y as i64);
    }

    fn draw_band(
        &self,
        canvas: &mut RgbaImage,
        font: Option<&FontVec>,
        meta: &DisplayMetadata,
        icon_id: &str,
        content: Rect,
        params: &RenderParams,
    ) {
        if content.is_empty() {
            return;
        }
        let primary = params.font_size as f32;

        let left_lines = lines([
            (meta.camera_model.clone(), primary),
            (meta.lens_model.clone(), primary * LENS_SCALE),
        ]);
        let mut right_lines = lines([
            (meta.shooting_line(), primary * PARAMS_SCALE),
            (meta.timestamp.clone(), primary * TIMESTAMP_SCALE),
        ]);

        // Right block takes at most half the band
        let right_width = font.map_or(0, |font| {
            fit_lines(font, &mut right_lines, (content.width / 2) as f32);
            block_width(font, &right_lines)
        });

        let icon = self.icons.get(icon_id, params.icon_size.min(content.height));
        let plan = plan_band(content, right_width, icon.as_ref().map(|i| i.dimensions()));

        fill_rect(canvas, plan.divider, params.text_color);

        if let (Some(icon), Some(at)) = (icon.as_deref(), plan.icon) {
            imageops::overlay(canvas, icon, at.x as i64, at.y as i64);
        }

        if let Some(font) = font {
            draw_block(canvas, font, params.text_color, left_lines, plan.left, Align::Left);
            draw_block(canvas, font, params.text_color, right_lines, plan.right, Align::Right);
        }
    }
}

fn lines<const N: usize>(entries: [(String, f32); N]) -> Vec<Line> {
    entries
        .into_iter()
        .filter(|(text, _)| !text.is_empty())
        .map(|(text, size)| Line { text, size })
        .collect()
}

fn fit_lines(font: &FontVec, lines: &mut [Line], max_width: f32) {
    for line in lines {
        line.size = fit_size(font, &line.text, line.size, max_width, MIN_TEXT_SIZE);
    }
}

fn block_width(font: &FontVec, lines: &[Line]) -> u32 {
    lines
        .iter()
        .map(|l| measure(font, l.size, &l.text).width.ceil() as u32)
        .max()
        .unwrap_or(0)
}

/// Stack `lines` vertically centered in `area`, aligned to one side.
fn draw_block(
    canvas: &mut RgbaImage,
    font: &FontVec,
    color: Color,
    mut lines: Vec<Line>,
    area: Rect,
    align: Align,
) {
    if area.is_empty() || lines.is_empty() {
        return;
    }
    fit_lines(font, &mut lines, area.width as f32);

    let styled: Vec<_> = lines
        .iter()
        .map(|l| {
            let style = TextStyle {
                font,
                size: l.size,
                color,
            };
            (style, style.measure(&l.text), l.text.as_str())
        })
        .collect();

    let total: f32 = styled.iter().map(|(_, m, _)| m.height()).sum::<f32>()
        + styled
            .iter()
            .skip(1)
            .map(|(s, _, _)| s.size * LINE_GAP)
            .sum::<f32>();

    let mut top = area.y as f32 + (area.height as f32 - total) / 2.0;
    for (i, (style, metrics, text)) in styled.iter().enumerate() {
        if i > 0 {
            top += style.size * LINE_GAP;
        }
        let x = match align {
            Align::Left => area.x as f32,
            Align::Right => area.right() as f32 - metrics.width,
        };
        draw_text(canvas, *style, x, top.round(), text, area);
        top += metrics.height();
    }
}

fn draw_copyright(canvas: &mut RgbaImage, font: &FontVec, strip: Rect, params: &RenderParams) {
    let text = params.copyright.trim();
    if text.is_empty() || strip.is_empty() {
        return;
    }
    let pad = (strip.height / 2).max(1);
    let max_width = strip.width.saturating_sub(2 * pad) as f32;
    let size = (params.font_size as f32 * COPYRIGHT_SCALE).min(strip.height as f32 / 1.25);
    let style = TextStyle {
        font,
        size: fit_size(font, text, size, max_width, MIN_TEXT_SIZE),
        color: params.text_color,
    };
    let metrics = style.measure(text);
    let x = strip.x as f32 + (strip.width as f32 - metrics.width) / 2.0;
    let top = strip.y as f32 + (strip.height as f32 - metrics.height()) / 2.0;
    draw_text(canvas, style, x, top.round(), text, strip);
}

/// Lay out the band: right block flush right, divider and icon to its left,
/// left block taking what remains.
fn plan_band(content: Rect, right_width: u32, icon: Option<(u32, u32)>) -> BandPlan {
    let pad = (content.height / 4).max(2);
    let gap = (pad / 2).max(2);
    let inner_right = content.right().saturating_sub(pad).max(content.x);

    let right_w = right_width.min(content.width.saturating_sub(2 * pad));
    let right_x = inner_right - right_w.min(inner_right - content.x);
    let right = Rect::new(right_x, content.y, right_w, content.height);

    let divider_h = (content.height / 2).max(1);
    let divider = Rect::new(
        right.x.saturating_sub(gap + DIVIDER_WIDTH).max(content.x),
        content.y + (content.height - divider_h) / 2,
        DIVIDER_WIDTH.min(content.width),
        divider_h,
    );

    let left_x = content.x + pad;
    let icon = icon.and_then(|(w, h)| {
        let x = divider.x.checked_sub(gap + w)?;
        (x >= left_x).then(|| {
            Rect::new(
                x,
                content.y + content.height.saturating_sub(h) / 2,
                w,
                h.min(content.height),
            )
        })
    });

    let left_limit = icon.map_or(divider.x, |r| r.x).saturating_sub(gap);
    let left = Rect::new(left_x, content.y, left_limit.saturating_sub(left_x), content.height);

    BandPlan {
        left,
        right,
        divider,
        icon,
    }
}

fn fill_rect(canvas: &mut RgbaImage, rect: Rect, color: Color) {
    let pixel = color.to_pixel();
    let right = rect.right().min(canvas.width());
    let bottom = rect.bottom().min(canvas.height());
    for y in rect.y..bottom {
        for x in rect.x..right {
            canvas.put_pixel(x, y, pixel);
        }
    }
}
