//! Render parameters and their versioned store.
//!
//! [`RenderParams`] describes *what* the composite should look like; the
//! layout engine and compositor decide *how*. Every edit goes through
//! [`ParamsStore`], which clamps numeric values into their configured
//! [`ParamBounds`] and bumps a version counter whenever the stored value
//! actually changes. Readers get an `Arc` snapshot, so a render job keeps
//! the exact parameters it was started with even if the store moves on.
//!
//! ## Types
//!
//! - [`RenderParams`]: border, colors, font, icon size, copyright, positions.
//! - [`ParamBounds`]: slider ranges for border size, font size and icon size.
//! - [`ParamChange`]: a single-field edit.
//! - [`ParamsStore`]: current snapshot + monotonically increasing version.

use crate::config::{Bounds, PreviewConfig};
use crate::types::{Color, Position};
use std::sync::Arc;

/// Everything the user can adjust about the composite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderParams {
    pub border_size: u32,
    pub border_color: Color,
    pub text_color: Color,
    pub font_family: String,
    pub font_size: u32,
    pub icon_size: u32,
    pub copyright: String,
    pub copyright_position: Position,
    pub watermark_position: Position,
}

impl RenderParams {
    /// Starting parameters for a freshly opened image.
    pub fn from_config(config: &PreviewConfig) -> Self {
        Self {
            border_size: config.border.default,
            border_color: config.border.color,
            text_color: config.text.color,
            font_family: config.text.font_family.clone(),
            font_size: config.text.font_size.default,
            icon_size: config.icons.size.default,
            copyright: config.watermark.copyright.clone(),
            copyright_position: config.watermark.copyright_position,
            watermark_position: config.watermark.position,
        }
    }
}

impl Default for RenderParams {
    fn default() -> Self {
        Self::from_config(&PreviewConfig::default())
    }
}

/// Allowed ranges for the slider-backed parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamBounds {
    pub border_size: Bounds,
    pub font_size: Bounds,
    pub icon_size: Bounds,
}

impl ParamBounds {
    pub fn from_config(config: &PreviewConfig) -> Self {
        Self {
            border_size: config.border.size(),
            font_size: config.text.font_size,
            icon_size: config.icons.size,
        }
    }

    /// Pull every bounded field into range.
    pub fn clamp(&self, mut params: RenderParams) -> RenderParams {
        params.border_size = self.border_size.clamp(params.border_size);
        params.font_size = self.font_size.clamp(params.font_size);
        params.icon_size = self.icon_size.clamp(params.icon_size);
        params
    }
}

impl Default for ParamBounds {
    fn default() -> Self {
        Self::from_config(&PreviewConfig::default())
    }
}

/// A single-field edit to [`RenderParams`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamChange {
    BorderSize(u32),
    BorderColor(Color),
    TextColor(Color),
    FontFamily(String),
    FontSize(u32),
    IconSize(u32),
    Copyright(String),
    CopyrightPosition(Position),
    WatermarkPosition(Position),
}

impl ParamChange {
    fn apply_to(self, params: &mut RenderParams) {
        match self {
            ParamChange::BorderSize(v) => params.border_size = v,
            ParamChange::BorderColor(c) => params.border_color = c,
            ParamChange::TextColor(c) => params.text_color = c,
            ParamChange::FontFamily(f) => params.font_family = f,
            ParamChange::FontSize(v) => params.font_size = v,
            ParamChange::IconSize(v) => params.icon_size = v,
            ParamChange::Copyright(s) => params.copyright = s,
            ParamChange::CopyrightPosition(p) => params.copyright_position = p,
            ParamChange::WatermarkPosition(p) => params.watermark_position = p,
        }
    }
}

/// Current parameters plus a version that increments on every real change.
#[derive(Debug, Clone)]
pub struct ParamsStore {
    bounds: ParamBounds,
    current: Arc<RenderParams>,
    version: u64,
}

impl ParamsStore {
    /// Store seeded with `initial`, clamped into `bounds`. Starts at version 0.
    pub fn new(bounds: ParamBounds, initial: RenderParams) -> Self {
        Self {
            current: Arc::new(bounds.clamp(initial)),
            bounds,
            version: 0,
        }
    }

    pub fn from_config(config: &PreviewConfig) -> Self {
        Self::new(
            ParamBounds::from_config(config),
            RenderParams::from_config(config),
        )
    }

    /// Apply one edit. Returns `true` when the stored parameters changed
    /// (and the version was bumped).
    pub fn apply(&mut self, change: ParamChange) -> bool {
        let mut next = (*self.current).clone();
        change.apply_to(&mut next);
        self.replace(next)
    }

    /// Replace all parameters at once. Same clamping and versioning as
    /// [`apply`](Self::apply).
    pub fn replace(&mut self, params: RenderParams) -> bool {
        let next = self.bounds.clamp(params);
        if next == *self.current {
            return false;
        }
        self.current = Arc::new(next);
        self.version += 1;
        true
    }

    pub fn snapshot(&self) -> Arc<RenderParams> {
        Arc::clone(&self.current)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn bounds(&self) -> ParamBounds {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_come_from_config() {
        let params = RenderParams::default();
        assert_eq!(params.border_size, 40);
        assert_eq!(params.font_size, 14);
        assert_eq!(params.icon_size, 32);
        assert_eq!(params.border_color, Color::WHITE);
        assert_eq!(params.text_color, Color::BLACK);
        assert_eq!(params.watermark_position, Position::Bottom);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let mut store = ParamsStore::from_config(&PreviewConfig::default());
        assert!(store.apply(ParamChange::BorderSize(500)));
        assert_eq!(store.snapshot().border_size, 100);
        assert!(store.apply(ParamChange::FontSize(1)));
        assert_eq!(store.snapshot().font_size, 10);
        assert!(store.apply(ParamChange::IconSize(1000)));
        assert_eq!(store.snapshot().icon_size, 48);
    }

    #[test]
    fn initial_params_are_clamped() {
        let initial = RenderParams {
            border_size: 9999,
            ..RenderParams::default()
        };
        let store = ParamsStore::new(ParamBounds::default(), initial);
        assert_eq!(store.snapshot().border_size, 100);
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn version_bumps_only_on_change() {
        let mut store = ParamsStore::from_config(&PreviewConfig::default());
        assert_eq!(store.version(), 0);

        assert!(store.apply(ParamChange::BorderSize(10)));
        assert_eq!(store.version(), 1);

        assert!(!store.apply(ParamChange::BorderSize(10)));
        assert_eq!(store.version(), 1);

        // 150 and 200 both clamp to 100: the second is not a change
        assert!(store.apply(ParamChange::BorderSize(150)));
        assert!(!store.apply(ParamChange::BorderSize(200)));
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn snapshots_are_immutable() {
        let mut store = ParamsStore::from_config(&PreviewConfig::default());
        let before = store.snapshot();
        store.apply(ParamChange::BorderColor(Color::rgb(255, 0, 0)));
        assert_eq!(before.border_color, Color::WHITE);
        assert_eq!(store.snapshot().border_color, Color::rgb(255, 0, 0));
    }

    #[test]
    fn every_field_is_editable() {
        let mut store = ParamsStore::from_config(&PreviewConfig::default());
        let changes = vec![
            ParamChange::TextColor(Color::rgb(1, 2, 3)),
            ParamChange::FontFamily("Inter".into()),
            ParamChange::Copyright("© Someone".into()),
            ParamChange::CopyrightPosition(Position::Top),
            ParamChange::WatermarkPosition(Position::Top),
        ];
        for change in changes {
            assert!(store.apply(change));
        }
        let p = store.snapshot();
        assert_eq!(p.text_color, Color::rgb(1, 2, 3));
        assert_eq!(p.font_family, "Inter");
        assert_eq!(p.copyright, "© Someone");
        assert_eq!(p.copyright_position, Position::Top);
        assert_eq!(p.watermark_position, Position::Top);
        assert_eq!(store.version(), 5);
    }
}
