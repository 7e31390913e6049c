//! Preview and export configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by whatever keys the user file sets; everything else keeps its
//! default.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [border]
//! min = 0                     # Smallest border the size control allows
//! max = 100                   # Largest border the size control allows
//! default = 40                # Border applied to a freshly opened image
//! color = "#ffffff"
//!
//! [text]
//! color = "#000000"
//! font_family = "Montserrat"
//!
//! [text.font_size]
//! min = 10
//! max = 24
//! default = 14
//!
//! [icons]
//! dir = "icons"               # Where <icon-id>.png graphics live
//!
//! [icons.size]
//! min = 16
//! max = 48
//! default = 32
//!
//! [watermark]
//! band_height = 64            # Height of the metadata band in pixels
//! position = "bottom"         # Band below ("bottom") or above ("top") the image
//! copyright = ""
//! copyright_position = "bottom"
//!
//! [fonts]
//! dirs = ["fonts"]            # Searched for <font_family>.ttf / .otf
//! fallback = [ ... ]          # Font files tried when the family is missing
//!
//! [preview]
//! container_width = 1280
//! container_height = 800
//! image_background = "#ffffff"
//!
//! [cache]
//! enabled = true
//! # path = "/tmp/photo-border/last-metadata.json"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::types::{Color, Position, Size};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Largest `border.max` accepted. Keeps composite dimensions far from
/// `u32` overflow and encoder limits.
pub const MAX_BORDER: u32 = 4096;

/// Largest `watermark.band_height` accepted.
pub const MAX_BAND_HEIGHT: u32 = 4096;

/// Full configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    pub border: BorderConfig,
    pub text: TextConfig,
    pub icons: IconsConfig,
    pub watermark: WatermarkConfig,
    pub fonts: FontsConfig,
    pub preview: ContainerConfig,
    pub cache: CacheConfig,
}

impl PreviewConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.border.size().validate("border")?;
        if self.border.max > MAX_BORDER {
            return Err(ConfigError::Validation(format!(
                "border.max ({}) must not exceed {MAX_BORDER}",
                self.border.max
            )));
        }
        self.text.font_size.validate("text.font_size")?;
        self.icons.size.validate("icons.size")?;
        if self.watermark.band_height == 0 {
            return Err(ConfigError::Validation(
                "watermark.band_height must be non-zero".into(),
            ));
        }
        if self.watermark.band_height > MAX_BAND_HEIGHT {
            return Err(ConfigError::Validation(format!(
                "watermark.band_height ({}) must not exceed {MAX_BAND_HEIGHT}",
                self.watermark.band_height
            )));
        }
        if self.preview.container_width == 0 || self.preview.container_height == 0 {
            return Err(ConfigError::Validation(
                "preview.container_width and container_height must be non-zero".into(),
            ));
        }
        if self.text.font_family.trim().is_empty() {
            return Err(ConfigError::Validation(
                "text.font_family must not be empty".into(),
            ));
        }
        for entry in &self.icons.brands {
            if entry.key.trim().is_empty() || entry.icons.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "icons.brands entry {:?} needs a key and at least one icon",
                    entry.key
                )));
            }
        }
        Ok(())
    }

    /// The preview container as a [`Size`].
    pub fn container(&self) -> Size {
        Size::new(self.preview.container_width, self.preview.container_height)
    }
}

/// An integer setting exposed as a slider: a range plus a starting value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bounds {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

impl Bounds {
    pub const fn new(min: u32, max: u32, default: u32) -> Self {
        Self { min, max, default }
    }

    /// Clamp a requested value into range. Out-of-range values are never
    /// rejected, only pulled to the nearest bound.
    pub fn clamp(&self, value: u32) -> u32 {
        value.clamp(self.min, self.max)
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::Validation(format!(
                "{name}: min ({}) must not exceed max ({})",
                self.min, self.max
            )));
        }
        if self.default < self.min || self.default > self.max {
            return Err(ConfigError::Validation(format!(
                "{name}: default ({}) must lie within {}..={}",
                self.default, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Border size range and color.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BorderConfig {
    pub min: u32,
    pub max: u32,
    pub default: u32,
    pub color: Color,
}

impl BorderConfig {
    /// The border size range as [`Bounds`].
    pub fn size(&self) -> Bounds {
        Bounds::new(self.min, self.max, self.default)
    }
}

impl Default for BorderConfig {
    fn default() -> Self {
        Self {
            min: 0,
            max: 100,
            default: 40,
            color: Color::WHITE,
        }
    }
}

/// Watermark text styling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextConfig {
    pub color: Color,
    pub font_family: String,
    pub font_size: Bounds,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            font_family: "Montserrat".to_string(),
            font_size: Bounds::new(10, 24, 14),
        }
    }
}

/// One extra brand registry entry from `[[icons.brands]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrandEntry {
    pub key: String,
    pub icons: Vec<String>,
}

/// Brand icon graphics and sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IconsConfig {
    /// Directory holding `<icon-id>.png` files.
    pub dir: PathBuf,
    pub size: Bounds,
    /// Appended after the built-in registry, in file order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub brands: Vec<BrandEntry>,
}

impl Default for IconsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("icons"),
            size: Bounds::new(16, 48, 32),
            brands: Vec::new(),
        }
    }
}

/// Metadata band geometry and the copyright line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatermarkConfig {
    pub band_height: u32,
    pub position: Position,
    pub copyright: String,
    pub copyright_position: Position,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            band_height: 64,
            position: Position::Bottom,
            copyright: String::new(),
            copyright_position: Position::Bottom,
        }
    }
}

/// Font discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontsConfig {
    pub dirs: Vec<PathBuf>,
    pub fallback: Vec<PathBuf>,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            dirs: vec![PathBuf::from("fonts")],
            fallback: [
                "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
                "/usr/share/fonts/TTF/DejaVuSans.ttf",
                "/usr/share/fonts/dejavu/DejaVuSans.ttf",
                "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
                "/System/Library/Fonts/Helvetica.ttc",
                "/System/Library/Fonts/SFNSText.ttf",
                "C:\\Windows\\Fonts\\arial.ttf",
            ]
            .iter()
            .map(PathBuf::from)
            .collect(),
        }
    }
}

/// The on-screen area the preview must fit into.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerConfig {
    pub container_width: u32,
    pub container_height: u32,
    /// Neutral fill drawn under the image so translucent pixels don't show
    /// the border color through.
    pub image_background: Color,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            container_width: 1280,
            container_height: 800,
            image_background: Color::WHITE,
        }
    }
}

/// Advisory last-metadata cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

impl CacheConfig {
    /// Where the cache slot lives: the configured path, or a fixed file
    /// under the system temp directory.
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            std::env::temp_dir()
                .join("photo-border")
                .join("last-metadata.json")
        })
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PreviewConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<PreviewConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PreviewConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load a specific config file.
pub fn load_config_file(path: &Path) -> Result<PreviewConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Load `config.toml` from `dir` if it exists, otherwise the stock defaults.
pub fn load_config(dir: &Path) -> Result<PreviewConfig, ConfigError> {
    let path = dir.join("config.toml");
    if !path.exists() {
        return resolve_config(None);
    }
    load_config_file(&path)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Photo Border Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Border
# ---------------------------------------------------------------------------
[border]
# Range of the border size control, in pixels. Requests outside the range
# are clamped.
min = 0
max = 100
# Border applied when an image is opened.
default = 40
color = "#ffffff"

# ---------------------------------------------------------------------------
# Watermark text
# ---------------------------------------------------------------------------
[text]
color = "#000000"
# Looked up as <font_family>.ttf / .otf in [fonts].dirs.
font_family = "Montserrat"

[text.font_size]
min = 10
max = 24
default = 14

# ---------------------------------------------------------------------------
# Brand icons
# ---------------------------------------------------------------------------
[icons]
# Directory holding one <icon-id>.png per icon (e.g. icon-nikon.png).
dir = "icons"

[icons.size]
min = 16
max = 48
default = 32

# Extra brands are matched after the built-in registry, in this order.
# [[icons.brands]]
# key = "gopro"
# icons = ["icon-gopro"]

# ---------------------------------------------------------------------------
# Watermark band
# ---------------------------------------------------------------------------
[watermark]
# Height of the metadata band. The band is omitted when an image has no
# readable metadata.
band_height = 64
# "bottom" puts the band under the image, "top" above it.
position = "bottom"
# Optional copyright line drawn along one edge of the band.
copyright = ""
copyright_position = "bottom"

# ---------------------------------------------------------------------------
# Fonts
# ---------------------------------------------------------------------------
[fonts]
dirs = ["fonts"]
# Tried in order when the configured family cannot be found.
fallback = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "/System/Library/Fonts/SFNSText.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
]

# ---------------------------------------------------------------------------
# Preview surface
# ---------------------------------------------------------------------------
[preview]
# The preview is downscaled (never upscaled) to fit this area.
container_width = 1280
container_height = 800
# Drawn under the image so translucent pixels stay neutral.
image_background = "#ffffff"

# ---------------------------------------------------------------------------
# Metadata cache
# ---------------------------------------------------------------------------
[cache]
# The last successfully read metadata is written to a single cache file.
enabled = true
# path = "/tmp/photo-border/last-metadata.json"
"##
}
