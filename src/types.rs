//! Shared value types used by every stage of the preview pipeline.
//!
//! These are small `Copy` values that flow between configuration, layout,
//! compositing and the export bridge. Colors serialize as hex strings so
//! they read naturally in `config.toml` and in cached metadata blobs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("color must start with '#', got {0:?}")]
    MissingHash(String),
    #[error("color must be #RGB, #RRGGBB or #RRGGBBAA, got {0} hex digits")]
    BadLength(usize),
    #[error("invalid hex digit in {0:?}")]
    BadDigit(String),
}

/// An RGBA quadruple, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Channels in `[r, g, b, a]` order, the layout the export bridge expects.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_pixel(self) -> image::Rgba<u8> {
        image::Rgba(self.to_array())
    }

    /// Render as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Parse a hex color string.
///
/// Supports `#RGB`, `#RRGGBB` and `#RRGGBBAA`. Short form digits are
/// doubled (`#abc` → `#aabbcc`).
pub fn parse_hex_color(hex: &str) -> Result<Color, ColorError> {
    let digits = hex
        .trim()
        .strip_prefix('#')
        .ok_or_else(|| ColorError::MissingHash(hex.to_string()))?;

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ColorError::BadDigit(hex.to_string()));
    }

    let channel = |s: &str| {
        u8::from_str_radix(s, 16).map_err(|_| ColorError::BadDigit(hex.to_string()))
    };

    match digits.len() {
        3 => Ok(Color::rgb(
            channel(&digits[0..1])? * 17,
            channel(&digits[1..2])? * 17,
            channel(&digits[2..3])? * 17,
        )),
        6 => Ok(Color::rgb(
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        )),
        8 => Ok(Color::rgba(
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
            channel(&digits[6..8])?,
        )),
        n => Err(ColorError::BadLength(n)),
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex_color(s)
    }
}

impl TryFrom<String> for Color {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_hex_color(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Which edge something attaches to: the watermark band relative to the
/// image, or the copyright line relative to the band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Top,
    #[default]
    Bottom,
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Position::Top),
            "bottom" => Ok(Position::Bottom),
            other => Err(format!("expected 'top' or 'bottom', got '{other}'")),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Top => f.write_str("top"),
            Position::Bottom => f.write_str("bottom"),
        }
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    /// A container that never constrains the image (used for export).
    pub const UNBOUNDED: Size = Size {
        width: u32::MAX,
        height: u32::MAX,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Size {
    type Err = String;

    /// Parse `WIDTHxHEIGHT`, e.g. `1280x800`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
        let dim = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid dimension '{v}' in '{s}'"))
        };
        Ok(Size::new(dim(w)?, dim(h)?))
    }
}

/// Axis-aligned rectangle in composite pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// True when the two rectangles share at least one pixel.
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_long_and_short_hex() {
        assert_eq!(parse_hex_color("#FF0000").unwrap(), Color::rgb(255, 0, 0));
        assert_eq!(parse_hex_color("#abc").unwrap(), Color::rgb(170, 187, 204));
        assert_eq!(
            parse_hex_color("#11223380").unwrap(),
            Color::rgba(0x11, 0x22, 0x33, 0x80)
        );
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(matches!(
            parse_hex_color("ffffff"),
            Err(ColorError::MissingHash(_))
        ));
        assert!(matches!(parse_hex_color("#ffff"), Err(ColorError::BadLength(4))));
        assert!(matches!(parse_hex_color("#gggggg"), Err(ColorError::BadDigit(_))));
        assert!(matches!(parse_hex_color("#ééé"), Err(ColorError::BadDigit(_))));
    }

    #[test]
    fn hex_output_omits_opaque_alpha() {
        assert_eq!(Color::WHITE.to_hex(), "#ffffff");
        assert_eq!(Color::rgba(0, 0, 0, 0).to_hex(), "#00000000");
    }

    #[test]
    fn color_serializes_as_hex_string() {
        let json = serde_json::to_string(&Color::rgb(1, 2, 3)).unwrap();
        assert_eq!(json, "\"#010203\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::rgb(1, 2, 3));
    }

    #[test]
    fn position_parses_case_insensitively() {
        assert_eq!("Top".parse::<Position>().unwrap(), Position::Top);
        assert_eq!(" bottom ".parse::<Position>().unwrap(), Position::Bottom);
        assert!("left".parse::<Position>().is_err());
    }

    #[test]
    fn size_parses_width_by_height() {
        assert_eq!("1280x800".parse::<Size>().unwrap(), Size::new(1280, 800));
        assert_eq!(" 640X480 ".parse::<Size>().unwrap(), Size::new(640, 480));
        assert!("1280".parse::<Size>().is_err());
        assert!("axb".parse::<Size>().is_err());
        assert_eq!(Size::new(3, 4).to_string(), "3x4");
    }

    #[test]
    fn rect_intersection() {
        let a = Rect::new(0, 0, 10, 10);
        assert!(a.intersects(&Rect::new(9, 9, 5, 5)));
        assert!(!a.intersects(&Rect::new(10, 0, 5, 5)));
        assert!(!a.intersects(&Rect::new(2, 2, 0, 5)));
    }
}
