//! Shared test utilities for the photo-border test suite.
//!
//! Provides canned metadata that looks like what a real camera writes
//! (quoted strings, list-formatted lens) and small image builders.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let display = sample_display();
//! assert_eq!(display.camera_make, "NIKON CORPORATION");
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let path = tmp.path().join("photo.png");
//! write_png(&path, &solid_image(40, 30, [255, 0, 0, 255]));
//! ```

use ab_glyph::FontVec;
use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::FontsConfig;
use crate::imaging::text::FontBook;
use crate::metadata::{DisplayMetadata, ExifMetadata, normalize};

// =========================================================================
// Metadata
// =========================================================================

/// Raw metadata as a Nikon body reports it through the EXIF reader.
pub fn sample_exif() -> ExifMetadata {
    ExifMetadata {
        camera_make: Some("\"NIKON CORPORATION\"".into()),
        camera_model: Some("\"NIKON Z 6_2\"".into()),
        lens_model: Some("\"NIKKOR Z 24-70mm f/4 S\", \"\"".into()),
        f_number: Some("4".into()),
        iso: Some("100".into()),
        focal_length: Some("35".into()),
        exposure_time: Some("1/250".into()),
        date_time: Some("2023:08:15 10:22:33".into()),
        ..Default::default()
    }
}

/// [`sample_exif`] after normalization.
pub fn sample_display() -> DisplayMetadata {
    normalize(&sample_exif())
}

// =========================================================================
// Images
// =========================================================================

pub fn solid_image(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(rgba))
}

/// Save `image` as PNG, creating parent directories.
pub fn write_png(path: &Path, image: &RgbaImage) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    image.save_with_format(path, image::ImageFormat::Png).unwrap();
}

// =========================================================================
// EXIF fixtures
// =========================================================================

fn ascii(tag: Tag, text: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    }
}

fn rationals(tag: Tag, parts: &[(u32, u32)]) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Rational(parts.iter().map(|&(num, denom)| Rational { num, denom }).collect()),
    }
}

/// The EXIF fields a Nikon Z 6II writes for a photo taken in Sydney.
pub fn nikon_exif_fields(width: u32, height: u32) -> Vec<Field> {
    vec![
        ascii(Tag::Make, "NIKON CORPORATION"),
        ascii(Tag::Model, "NIKON Z 6_2"),
        ascii(Tag::LensModel, "NIKKOR Z 24-70mm f/4 S"),
        ascii(Tag::DateTimeOriginal, "2023:08:15 10:22:33"),
        rationals(Tag::FNumber, &[(4, 1)]),
        rationals(Tag::ExposureTime, &[(1, 250)]),
        rationals(Tag::FocalLength, &[(35, 1)]),
        Field {
            tag: Tag::PhotographicSensitivity,
            ifd_num: In::PRIMARY,
            value: Value::Short(vec![100]),
        },
        Field {
            tag: Tag::PixelXDimension,
            ifd_num: In::PRIMARY,
            value: Value::Long(vec![width]),
        },
        Field {
            tag: Tag::PixelYDimension,
            ifd_num: In::PRIMARY,
            value: Value::Long(vec![height]),
        },
        rationals(Tag::GPSLatitude, &[(33, 1), (51, 1), (36, 1)]),
        ascii(Tag::GPSLatitudeRef, "S"),
        rationals(Tag::GPSLongitude, &[(151, 1), (12, 1), (36, 1)]),
        ascii(Tag::GPSLongitudeRef, "E"),
    ]
}

/// Encode `image` as JPEG with `fields` in an APP1 `Exif` segment.
pub fn jpeg_with_exif(image: &RgbaImage, fields: &[Field]) -> Vec<u8> {
    let mut tiff = Cursor::new(Vec::new());
    let mut writer = Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    writer.write(&mut tiff, false).unwrap();
    let tiff = tiff.into_inner();

    let mut jpeg = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image.clone())
        .to_rgb8()
        .write_to(&mut jpeg, ImageFormat::Jpeg)
        .unwrap();
    let jpeg = jpeg.into_inner();

    // SOI, then APP1, then the encoder's own segments
    let len = u16::try_from(2 + 6 + tiff.len()).unwrap();
    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Write a JPEG of `image` carrying [`nikon_exif_fields`].
pub fn write_nikon_jpeg(path: &Path, image: &RgbaImage) {
    let fields = nikon_exif_fields(image.width(), image.height());
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, jpeg_with_exif(image, &fields)).unwrap();
}

// =========================================================================
// Fonts
// =========================================================================

/// Sans-serif faces commonly installed on Linux, macOS and Windows.
const SYSTEM_SANS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Font config that falls back to whatever system sans face exists.
pub fn system_fonts() -> FontsConfig {
    FontsConfig {
        dirs: vec![],
        fallback: SYSTEM_SANS.iter().map(PathBuf::from).collect(),
    }
}

/// A real font for text tests, or `None` on a machine without any of
/// [`SYSTEM_SANS`]. Tests that need glyphs return early on `None`.
pub fn system_font() -> Option<Arc<FontVec>> {
    let font = FontBook::new(&system_fonts()).resolve("sans-serif");
    if font.is_none() {
        eprintln!("no system sans font found; skipping glyph assertions");
    }
    font
}
