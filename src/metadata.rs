//! Camera metadata: the raw record and its display-ready form.
//!
//! Metadata arrives from the export bridge as [`ExifMetadata`]: every field
//! optional, strings formatted however the extractor happened to render them.
//! Make and model often come wrapped in quotes, lens model may be a
//! comma-separated list, and the capture date can be any of several formats
//! depending on the camera and the software that last touched the file.
//!
//! [`normalize`] turns that into [`DisplayMetadata`], where every field is a
//! plain string ready to draw. It is total: nothing here fails, missing
//! values become empty strings, and a date that can't be understood becomes
//! an empty timestamp.
//!
//! ## Date resolution order
//!
//! 1. ISO-like `YYYY-MM-DDTHH:MM:SS…` (offset and fractional seconds allowed)
//! 2. EXIF `YYYY:MM:DD HH:MM:SS`, rewritten to ISO form and parsed
//! 3. A fallback list of common layouts (RFC 2822, slashed dates, date-only)
//!
//! The first pattern that *matches* decides which parser runs; if that parse
//! fails the fallback list still gets a chance. Output is always the 24-hour
//! `YYYY-MM-DD HH:MM:SS` wall-clock form, or `""`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Raw metadata as read from the image file.
///
/// An immutable snapshot: the preview replaces it wholesale when a fetch
/// completes and never edits individual fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExifMetadata {
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub exposure_time: Option<String>,
    pub f_number: Option<String>,
    pub iso: Option<String>,
    pub focal_length: Option<String>,
    pub date_time: Option<String>,
    pub lens_make: Option<String>,
    pub lens_model: Option<String>,
    pub focal_length_35mm: Option<String>,
    pub exposure_program: Option<String>,
    pub exposure_mode: Option<String>,
    pub metering_mode: Option<String>,
    pub flash: Option<String>,
    pub white_balance: Option<String>,
    pub exposure_bias: Option<String>,
    pub software: Option<String>,
    pub artist: Option<String>,
    pub copyright: Option<String>,
    pub gps_latitude: Option<f64>,
    pub gps_longitude: Option<f64>,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
    pub orientation: Option<String>,
    pub scene_type: Option<String>,
    pub color_space: Option<String>,
}

/// Display-ready metadata. Every field is a plain string; absent values are
/// empty, never a placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DisplayMetadata {
    pub camera_make: String,
    pub camera_model: String,
    pub lens_make: String,
    pub lens_model: String,
    pub f_number: String,
    pub iso: String,
    pub focal_length: String,
    pub exposure_time: String,
    pub timestamp: String,
    pub copyright: String,
    pub artist: String,
}

/// Separator placed between shooting parameters on the right-hand line.
pub const PARAM_SEPARATOR: &str = " | ";

impl DisplayMetadata {
    /// Shooting parameters in display order, skipping any that are empty.
    ///
    /// `F2.8`, `ISO100`, `35mm`, `1/250s`.
    pub fn shooting_params(&self) -> Vec<String> {
        [
            ("F", self.f_number.as_str(), ""),
            ("ISO", self.iso.as_str(), ""),
            ("", self.focal_length.as_str(), "mm"),
            ("", self.exposure_time.as_str(), "s"),
        ]
        .iter()
        .filter(|(_, value, _)| !value.is_empty())
        .map(|(prefix, value, suffix)| format!("{prefix}{value}{suffix}"))
        .collect()
    }

    /// The shooting parameters joined into one line.
    pub fn shooting_line(&self) -> String {
        self.shooting_params().join(PARAM_SEPARATOR)
    }
}

/// Normalize a raw metadata record for display.
pub fn normalize(raw: &ExifMetadata) -> DisplayMetadata {
    DisplayMetadata {
        camera_make: clean_text(raw.camera_make.as_deref()),
        camera_model: clean_text(raw.camera_model.as_deref()),
        lens_make: first_listed(raw.lens_make.as_deref()),
        lens_model: first_listed(raw.lens_model.as_deref()),
        f_number: clean_text(raw.f_number.as_deref()),
        iso: clean_text(raw.iso.as_deref()),
        focal_length: clean_text(raw.focal_length.as_deref()),
        exposure_time: clean_text(raw.exposure_time.as_deref()),
        timestamp: raw.date_time.as_deref().map(format_timestamp).unwrap_or_default(),
        copyright: clean_text(raw.copyright.as_deref()),
        artist: clean_text(raw.artist.as_deref()),
    }
}

const QUOTES: [char; 2] = ['"', '\''];

/// Trim whitespace and strip surrounding quote characters.
///
/// `None` and blank values become `""`.
pub fn clean_text(value: Option<&str>) -> String {
    value
        .map(|s| s.trim().trim_matches(QUOTES).trim())
        .unwrap_or_default()
        .to_string()
}

/// First element of a comma-separated multi-value field, cleaned.
///
/// EXIF readers render multi-string tags as `"A", "B"`; only `A` is shown.
pub fn first_listed(value: Option<&str>) -> String {
    clean_text(value.and_then(|s| s.split(',').next()))
}

// =============================================================================
// Dates
// =============================================================================

static ISO_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}").expect("valid regex"));

static EXIF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}):(\d{2}):(\d{2})\s(\d{2}):(\d{2}):(\d{2})").expect("valid regex")
});

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const FALLBACK_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
];

const FALLBACK_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y:%m:%d"];

/// Format a capture date for display, or `""` when it can't be understood.
pub fn format_timestamp(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(instant) => instant.format(DISPLAY_FORMAT).to_string(),
        None => {
            if !raw.trim().is_empty() {
                tracing::debug!(value = raw, "unrecognised date format");
            }
            String::new()
        }
    }
}

/// Parse a capture date into a wall-clock instant.
///
/// Offsets are honoured for parsing but not converted: the result is the
/// local time the camera recorded, which keeps output independent of the
/// host's time zone.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let value = clean_text(Some(raw));
    if value.is_empty() {
        return None;
    }

    let matched = if ISO_PATTERN.is_match(&value) {
        parse_iso(&value)
    } else if let Some(caps) = EXIF_PATTERN.captures(&value) {
        let iso = format!(
            "{}-{}-{}T{}:{}:{}",
            &caps[1], &caps[2], &caps[3], &caps[4], &caps[5], &caps[6]
        );
        parse_iso(&iso)
    } else {
        None
    };

    matched.or_else(|| parse_fallback(&value))
}

fn parse_iso(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    // Unknown trailing content: fall back to the fixed-width prefix
    value
        .get(..19)
        .and_then(|prefix| NaiveDateTime::parse_from_str(prefix, "%Y-%m-%dT%H:%M:%S").ok())
}

fn parse_fallback(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    FALLBACK_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            FALLBACK_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::sample_exif;

    // =========================================================================
    // Text cleanup
    // =========================================================================

    #[test]
    fn clean_text_strips_surrounding_quotes() {
        assert_eq!(clean_text(Some("\"NIKON CORPORATION\"")), "NIKON CORPORATION");
        assert_eq!(clean_text(Some("'Z 6_2'")), "Z 6_2");
        assert_eq!(clean_text(Some("  \"padded\"  ")), "padded");
    }

    #[test]
    fn clean_text_keeps_inner_quotes() {
        assert_eq!(clean_text(Some("12\" lens")), "12\" lens");
    }

    #[test]
    fn clean_text_empty_for_missing() {
        assert_eq!(clean_text(None), "");
        assert_eq!(clean_text(Some("   ")), "");
        assert_eq!(clean_text(Some("\"\"")), "");
    }

    #[test]
    fn first_listed_takes_first_element() {
        assert_eq!(
            first_listed(Some("\"NIKKOR Z 24-70mm f/4 S\", \"\"")),
            "NIKKOR Z 24-70mm f/4 S"
        );
        assert_eq!(first_listed(Some("A,B,C")), "A");
        assert_eq!(first_listed(Some("Single")), "Single");
        assert_eq!(first_listed(None), "");
    }

    // =========================================================================
    // Dates
    // =========================================================================

    #[test]
    fn exif_colon_date_normalizes() {
        assert_eq!(format_timestamp("2023:08:15 10:22:33"), "2023-08-15 10:22:33");
    }

    #[test]
    fn quoted_exif_date_normalizes() {
        assert_eq!(
            format_timestamp("\"2023:08:15 10:22:33\""),
            "2023-08-15 10:22:33"
        );
    }

    #[test]
    fn exif_date_with_subseconds() {
        assert_eq!(
            format_timestamp("2023:08:15 10:22:33.25"),
            "2023-08-15 10:22:33"
        );
    }

    #[test]
    fn iso_date_normalizes() {
        assert_eq!(format_timestamp("2024-01-02T03:04:05"), "2024-01-02 03:04:05");
        assert_eq!(
            format_timestamp("2024-01-02T03:04:05.123"),
            "2024-01-02 03:04:05"
        );
    }

    #[test]
    fn iso_date_with_offset_keeps_wall_clock() {
        assert_eq!(
            format_timestamp("2024-01-02T23:04:05+09:00"),
            "2024-01-02 23:04:05"
        );
        assert_eq!(
            format_timestamp("2024-01-02T23:04:05Z"),
            "2024-01-02 23:04:05"
        );
    }

    #[test]
    fn fallback_formats() {
        assert_eq!(format_timestamp("2022-12-31 23:59:58"), "2022-12-31 23:59:58");
        assert_eq!(format_timestamp("2022/12/31 23:59:58"), "2022-12-31 23:59:58");
        assert_eq!(format_timestamp("2022-12-31"), "2022-12-31 00:00:00");
        assert_eq!(
            format_timestamp("Tue, 1 Jul 2003 10:52:37 +0200"),
            "2003-07-01 10:52:37"
        );
    }

    #[test]
    fn unrecognised_dates_are_empty() {
        for raw in [
            "",
            "   ",
            "yesterday",
            "0000:00:00 00:00:00",
            "2023:02:30 10:00:00",
            "2023-13-01T00:00:00",
            "2023:08:15",
            "15/08/2023",
            "\u{1F4F7}",
        ] {
            let out = format_timestamp(raw);
            // Date-only EXIF form is accepted by the fallback; everything else must be empty
            if raw == "2023:08:15" {
                assert_eq!(out, "2023-08-15 00:00:00");
            } else {
                assert_eq!(out, "", "expected empty for {raw:?}");
            }
        }
    }

    // =========================================================================
    // normalize()
    // =========================================================================

    #[test]
    fn normalize_sample() {
        let display = normalize(&sample_exif());
        assert_eq!(display.camera_make, "NIKON CORPORATION");
        assert_eq!(display.camera_model, "NIKON Z 6_2");
        assert_eq!(display.lens_model, "NIKKOR Z 24-70mm f/4 S");
        assert_eq!(display.timestamp, "2023-08-15 10:22:33");
        assert_eq!(display.shooting_line(), "F4 | ISO100 | 35mm | 1/250s");
    }

    #[test]
    fn normalize_empty_record_has_no_placeholders() {
        let display = normalize(&ExifMetadata::default());
        assert_eq!(display, DisplayMetadata::default());
        assert!(display.shooting_params().is_empty());
        assert_eq!(display.shooting_line(), "");
    }

    #[test]
    fn shooting_params_skip_missing_fields() {
        let raw = ExifMetadata {
            f_number: Some("1.8".into()),
            exposure_time: Some("1/60".into()),
            ..Default::default()
        };
        assert_eq!(normalize(&raw).shooting_params(), vec!["F1.8", "1/60s"]);
    }

    #[test]
    fn normalize_is_deterministic() {
        let raw = sample_exif();
        assert_eq!(normalize(&raw), normalize(&raw));
    }
}
