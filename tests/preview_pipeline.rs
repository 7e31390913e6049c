//! End-to-end: preview and export through the native bridge on real files.
//!
//! Generated PNGs carry no EXIF and exercise the degraded path (bordered
//! image, no band) that must always work, plus the export notices. One
//! JPEG with a hand-built EXIF segment drives the metadata path through
//! the real reader, the band layout, the cache file and the export.

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use image::{ImageFormat, Rgba, RgbaImage};
use photo_border::config::{self, PreviewConfig};
use photo_border::imaging::native::{self, NativeBridge};
use photo_border::imaging::ParamChange;
use photo_border::preview::{ExportStatus, NoticeLevel, PreviewController, PreviewState};
use photo_border::types::{Color, Size};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(30);

fn config(tmp: &Path) -> PreviewConfig {
    let overlay: toml::Value = toml::from_str(&format!(
        r#"
        [border]
        default = 8

        [preview]
        container_width = 400
        container_height = 400

        [cache]
        path = "{}"
        "#,
        tmp.join("cache/last.json").display()
    ))
    .unwrap();
    config::resolve_config(Some(overlay)).unwrap()
}

fn write_photo(path: &Path, width: u32, height: u32) {
    RgbaImage::from_pixel(width, height, Rgba([30, 60, 90, 255]))
        .save(path)
        .unwrap();
}

/// Write a JPEG whose APP1 segment carries camera make, model, capture
/// time and aperture.
fn write_photo_with_exif(path: &Path, width: u32, height: u32) {
    let ascii = |tag, text: &str| Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    };
    let fields = [
        ascii(Tag::Make, "FUJIFILM"),
        ascii(Tag::Model, "X-T5"),
        ascii(Tag::DateTimeOriginal, "2024:01:02 03:04:05"),
        Field {
            tag: Tag::FNumber,
            ifd_num: In::PRIMARY,
            value: Value::Rational(vec![Rational { num: 28, denom: 10 }]),
        },
    ];
    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();
    let tiff = tiff.into_inner();

    let mut jpeg = Cursor::new(Vec::new());
    image::RgbImage::from_pixel(width, height, image::Rgb([30, 60, 90]))
        .write_to(&mut jpeg, ImageFormat::Jpeg)
        .unwrap();
    let jpeg = jpeg.into_inner();

    let mut bytes = jpeg[..2].to_vec();
    bytes.extend_from_slice(&[0xFF, 0xE1]);
    bytes.extend_from_slice(&u16::try_from(8 + tiff.len()).unwrap().to_be_bytes());
    bytes.extend_from_slice(b"Exif\0\0");
    bytes.extend_from_slice(&tiff);
    bytes.extend_from_slice(&jpeg[2..]);
    std::fs::write(path, bytes).unwrap();
}

fn controller(config: &PreviewConfig) -> PreviewController {
    PreviewController::new(config, Arc::new(NativeBridge::from_config(config)))
}

#[test]
fn preview_renders_bordered_image_without_metadata() {
    let tmp = TempDir::new().unwrap();
    let photo = tmp.path().join("photo.png");
    write_photo(&photo, 120, 80);
    let config = config(tmp.path());

    let mut preview = controller(&config);
    preview.load_image(&photo).unwrap();
    assert!(preview.wait_idle(WAIT));

    assert_eq!(preview.state(), PreviewState::Ready);
    assert!(preview.metadata().is_none());
    let surface = preview.surface().unwrap();
    assert_eq!(surface.dimensions(), (136, 96));
    assert_eq!(surface.get_pixel(0, 0).0, [255, 255, 255, 255]);
    assert_eq!(surface.get_pixel(60, 40).0, [30, 60, 90, 255]);
}

#[test]
fn photo_with_exif_gets_band_cache_entry_and_banded_export() {
    let tmp = TempDir::new().unwrap();
    let photo = tmp.path().join("DSCF0001.jpg");
    write_photo_with_exif(&photo, 300, 200);
    let config = config(tmp.path());

    let mut preview = controller(&config);
    preview.load_image(&photo).unwrap();
    assert!(preview.wait_idle(WAIT));

    assert_eq!(preview.state(), PreviewState::Ready);
    let metadata = preview.metadata().unwrap();
    assert_eq!(metadata.camera_model.as_deref(), Some("\"X-T5\""));
    assert_eq!(metadata.f_number.as_deref(), Some("2.8"));

    let layout = preview.surface_layout().unwrap();
    assert!(layout.has_band());
    assert_eq!(layout.band.height, 64);
    assert_eq!(preview.surface().unwrap().dimensions(), (316, 280));

    let cached: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(tmp.path().join("cache/last.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(cached["source"], photo.display().to_string());
    assert_eq!(cached["metadata"]["camera_make"], "\"FUJIFILM\"");

    let out = tmp.path().join("final.png");
    assert_eq!(preview.export(Some(out.clone())), ExportStatus::Started);
    assert!(preview.wait_idle(WAIT));
    assert_eq!(preview.take_notices()[0].level, NoticeLevel::Success);
    assert_eq!(native::decode_image(&out).unwrap().dimensions(), (316, 280));
}

#[test]
fn preview_scales_into_container_and_edits_apply() {
    let tmp = TempDir::new().unwrap();
    let photo = tmp.path().join("wide.png");
    write_photo(&photo, 1600, 400);
    let config = config(tmp.path());

    let mut preview = controller(&config);
    preview.load_image(&photo).unwrap();
    preview.update(ParamChange::BorderColor(Color::rgb(0, 0, 0)));
    preview.update(ParamChange::BorderSize(20));
    assert!(preview.wait_idle(WAIT));

    let layout = preview.surface_layout().unwrap();
    assert!(layout.scale < 1.0);
    assert_eq!(layout.image.width, 360);
    assert!(layout.composite.width <= 400);
    assert_eq!(preview.surface().unwrap().get_pixel(0, 0).0, [0, 0, 0, 255]);

    preview.resize_container(Size::new(220, 400));
    assert!(preview.wait_idle(WAIT));
    assert_eq!(preview.surface_layout().unwrap().image.width, 180);
}

#[test]
fn export_writes_full_resolution_and_notifies() {
    let tmp = TempDir::new().unwrap();
    let photo = tmp.path().join("big.png");
    write_photo(&photo, 1600, 400);
    let config = config(tmp.path());
    let out = tmp.path().join("out/final.png");
    std::fs::create_dir_all(out.parent().unwrap()).unwrap();

    let mut preview = controller(&config);
    preview.load_image(&photo).unwrap();
    assert_eq!(preview.export(Some(out.clone())), ExportStatus::Started);
    assert!(preview.wait_idle(WAIT));

    let notices = preview.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Success);

    let written = native::decode_image(&out).unwrap();
    assert_eq!(written.dimensions(), (1616, 416));
}

#[test]
fn export_to_unsupported_format_reports_failure() {
    let tmp = TempDir::new().unwrap();
    let photo = tmp.path().join("photo.png");
    write_photo(&photo, 40, 30);
    let config = config(tmp.path());
    let out = tmp.path().join("final.bmp");

    let mut preview = controller(&config);
    preview.load_image(&photo).unwrap();
    assert!(preview.wait_idle(WAIT));
    let before = preview.surface().unwrap().clone();

    preview.export(Some(out.clone()));
    assert!(preview.wait_idle(WAIT));

    let notices = preview.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert!(!out.exists());
    assert_eq!(preview.surface().unwrap(), &before);
}

#[test]
fn cancelled_export_does_nothing() {
    let tmp = TempDir::new().unwrap();
    let photo = tmp.path().join("photo.png");
    write_photo(&photo, 40, 30);
    let config = config(tmp.path());

    let mut preview = controller(&config);
    preview.load_image(&photo).unwrap();
    assert_eq!(preview.export(None), ExportStatus::Cancelled);
    assert!(preview.wait_idle(WAIT));
    assert!(preview.take_notices().is_empty());
}

#[test]
fn unreadable_image_leaves_controller_idle() {
    let tmp = TempDir::new().unwrap();
    let bogus = tmp.path().join("not-an-image.png");
    std::fs::write(&bogus, b"nope").unwrap();
    let config = config(tmp.path());

    let mut preview = controller(&config);
    assert!(preview.load_image(&bogus).is_err());
    assert_eq!(preview.state(), PreviewState::Idle);
    assert!(preview.surface().is_none());
}
