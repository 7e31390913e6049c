//! The boundary to the metadata/export service.
//!
//! [`ExportBridge`] is the only way the preview reaches outside the
//! process: it reads EXIF from the source file and bakes the
//! full-resolution composite to disk. The production implementation is
//! [`NativeBridge`](super::native::NativeBridge); tests use the recording
//! `MockBridge` in this module's `tests`.
//!
//! Both calls are blocking. The preview runs them on worker threads so the
//! interaction thread never waits on disk.

use super::params::RenderParams;
use crate::metadata::ExifMetadata;
use crate::types::{Color, Position};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("EXIF error: {0}")]
    Exif(#[from] exif::Error),
    #[error("Unsupported output format: {0:?}")]
    UnsupportedFormat(String),
    #[error("{0}")]
    Failed(String),
}

/// Everything the exporter needs to reproduce the preview at full size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub source: PathBuf,
    pub output: PathBuf,
    pub border_size: u32,
    pub text_color: Color,
    pub border_color: Color,
    /// Copyright text; `None` when there is none.
    pub watermark_text: Option<String>,
    /// Band position; `None` means the default (bottom).
    pub watermark_position: Option<Position>,
    pub font_family: String,
    pub font_size: u32,
    pub icon_size: u32,
    pub copyright_position: Position,
}

impl ExportRequest {
    pub fn from_params(source: &Path, output: &Path, params: &RenderParams) -> Self {
        let text = params.copyright.trim();
        Self {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            border_size: params.border_size,
            text_color: params.text_color,
            border_color: params.border_color,
            watermark_text: (!text.is_empty()).then(|| text.to_string()),
            watermark_position: Some(params.watermark_position),
            font_family: params.font_family.clone(),
            font_size: params.font_size,
            icon_size: params.icon_size,
            copyright_position: params.copyright_position,
        }
    }

    /// The render parameters this request describes.
    pub fn to_params(&self) -> RenderParams {
        RenderParams {
            border_size: self.border_size,
            border_color: self.border_color,
            text_color: self.text_color,
            font_family: self.font_family.clone(),
            font_size: self.font_size,
            icon_size: self.icon_size,
            copyright: self.watermark_text.clone().unwrap_or_default(),
            copyright_position: self.copyright_position,
            watermark_position: self.watermark_position.unwrap_or_default(),
        }
    }
}

/// External metadata and export service.
///
/// `Send + Sync` so one bridge can be shared by the metadata and export
/// worker threads.
pub trait ExportBridge: Send + Sync {
    /// Read the raw metadata of an image file.
    fn fetch_metadata(&self, path: &Path) -> Result<ExifMetadata, BridgeError>;

    /// Render and write the full-resolution composite.
    fn export_composite(&self, request: &ExportRequest) -> Result<(), BridgeError>;
}
