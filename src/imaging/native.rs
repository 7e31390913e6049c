//! In-process bridge: EXIF via `kamadak-exif`, export via the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | EXIF read | `exif::Reader::read_from_container` (JPEG, TIFF, PNG, WebP, HEIF) |
//! | Decode | `image::ImageReader` with format sniffing |
//! | Composite | [`Pipeline::compose`] with an unbounded container |
//! | Encode | `image` JPEG / PNG / TIFF / WebP encoders, chosen by output extension |
//!
//! Exports are written to a hidden sibling file first and renamed into
//! place only after encoding succeeds, so a failed export never leaves a
//! file at the destination.

use super::bridge::{BridgeError, ExportBridge, ExportRequest};
use super::operations::Pipeline;
use super::params::ParamBounds;
use crate::config::PreviewConfig;
use crate::metadata::ExifMetadata;
use crate::types::Size;
use exif::{Exif, In, Reader, Tag, Value};
use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Output extensions and the encoder used for each.
const OUTPUT_FORMATS: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

#[derive(Debug, Clone)]
pub struct NativeBridge {
    pipeline: Pipeline,
    bounds: ParamBounds,
}

impl NativeBridge {
    /// Requests are clamped into `bounds` before rendering, the same ranges
    /// the preview's parameter store enforces.
    pub fn new(pipeline: Pipeline, bounds: ParamBounds) -> Self {
        Self { pipeline, bounds }
    }

    pub fn from_config(config: &PreviewConfig) -> Self {
        Self::new(Pipeline::from_config(config), ParamBounds::from_config(config))
    }
}

impl ExportBridge for NativeBridge {
    fn fetch_metadata(&self, path: &Path) -> Result<ExifMetadata, BridgeError> {
        read_exif(path)
    }

    fn export_composite(&self, request: &ExportRequest) -> Result<(), BridgeError> {
        let format = output_format(&request.output)?;
        let image = decode_image(&request.source)?;

        let metadata = match read_exif(&request.source) {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::warn!(
                    source = %request.source.display(),
                    error = %e,
                    "no metadata for export; writing border only"
                );
                None
            }
        };

        let params = self.bounds.clamp(request.to_params());
        let composite = self
            .pipeline
            .compose(&image, metadata.as_ref(), &params, Size::UNBOUNDED);

        write_atomically(composite.raster, &request.output, format)?;
        tracing::info!(
            output = %request.output.display(),
            size = %composite.layout.composite,
            "exported composite"
        );
        Ok(())
    }
}

/// Load and decode an image from disk as RGBA.
pub fn decode_image(path: &Path) -> Result<RgbaImage, BridgeError> {
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(image.to_rgba8())
}

/// Encode `raster` to `output`, format chosen by extension.
pub fn save_raster(raster: &RgbaImage, output: &Path) -> Result<(), BridgeError> {
    let format = output_format(output)?;
    write_atomically(raster.clone(), output, format)
}

/// Encoder for an output path, from its extension.
pub fn output_format(path: &Path) -> Result<ImageFormat, BridgeError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    OUTPUT_FORMATS
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, format)| *format)
        .ok_or(BridgeError::UnsupportedFormat(ext))
}

fn partial_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!(".{name}.partial"))
}

fn write_atomically(
    raster: RgbaImage,
    output: &Path,
    format: ImageFormat,
) -> Result<(), BridgeError> {
    // JPEG has no alpha channel
    let image = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(raster).to_rgb8()),
        _ => DynamicImage::ImageRgba8(raster),
    };

    let partial = partial_path(output);
    let written = image
        .save_with_format(&partial, format)
        .map_err(BridgeError::from)
        .and_then(|()| std::fs::rename(&partial, output).map_err(BridgeError::from));

    if written.is_err() {
        let _ = std::fs::remove_file(&partial);
    }
    written
}

// =============================================================================
// EXIF
// =============================================================================

/// Read the metadata fields the watermark and the cache use.
pub fn read_exif(path: &Path) -> Result<ExifMetadata, BridgeError> {
    let file = File::open(path)?;
    let exif = Reader::new().read_from_container(&mut BufReader::new(file))?;

    let text = |tag: Tag| {
        exif.get_field(tag, In::PRIMARY)
            .map(|f| f.display_value().to_string())
            .filter(|s| !s.trim().is_empty())
    };
    let uint = |tag: Tag| {
        exif.get_field(tag, In::PRIMARY)
            .and_then(|f| f.value.get_uint(0))
    };

    Ok(ExifMetadata {
        camera_make: text(Tag::Make),
        camera_model: text(Tag::Model),
        exposure_time: text(Tag::ExposureTime),
        f_number: text(Tag::FNumber),
        iso: text(Tag::PhotographicSensitivity),
        focal_length: text(Tag::FocalLength),
        date_time: text(Tag::DateTimeOriginal).or_else(|| text(Tag::DateTime)),
        lens_make: text(Tag::LensMake),
        lens_model: text(Tag::LensModel),
        focal_length_35mm: text(Tag::FocalLengthIn35mmFilm),
        exposure_program: text(Tag::ExposureProgram),
        exposure_mode: text(Tag::ExposureMode),
        metering_mode: text(Tag::MeteringMode),
        flash: text(Tag::Flash),
        white_balance: text(Tag::WhiteBalance),
        exposure_bias: text(Tag::ExposureBiasValue),
        software: text(Tag::Software),
        artist: text(Tag::Artist),
        copyright: text(Tag::Copyright),
        gps_latitude: gps_coordinate(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef),
        gps_longitude: gps_coordinate(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef),
        image_width: uint(Tag::PixelXDimension).or_else(|| uint(Tag::ImageWidth)),
        image_height: uint(Tag::PixelYDimension).or_else(|| uint(Tag::ImageLength)),
        orientation: text(Tag::Orientation),
        scene_type: text(Tag::SceneType),
        color_space: text(Tag::ColorSpace),
    })
}

/// Degrees/minutes/seconds plus hemisphere reference → signed degrees.
fn gps_coordinate(exif: &Exif, value_tag: Tag, ref_tag: Tag) -> Option<f64> {
    let dms = match &exif.get_field(value_tag, In::PRIMARY)?.value {
        Value::Rational(v) if v.len() >= 3 => [v[0].to_f64(), v[1].to_f64(), v[2].to_f64()],
        _ => return None,
    };
    let reference = exif
        .get_field(ref_tag, In::PRIMARY)
        .map(|f| f.display_value().to_string())
        .unwrap_or_default();
    Some(signed_degrees(dms, &reference))
}

fn signed_degrees([degrees, minutes, seconds]: [f64; 3], reference: &str) -> f64 {
    let magnitude = degrees + minutes / 60.0 + seconds / 3600.0;
    let reference = reference.trim().trim_matches('"').to_ascii_uppercase();
    if matches!(reference.as_str(), "S" | "W") {
        -magnitude
    } else {
        magnitude
    }
}
