//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output leads with what the user cares about (the camera, the composite
//! geometry, where the file went) and shows paths and raw values as
//! indented context lines underneath.
//!
//! # Output Format
//!
//! ## Exif
//!
//! ```text
//! Camera
//!     Make: NIKON CORPORATION
//!     Model: NIKON Z 6_2
//! Lens
//!     Model: NIKKOR Z 24-70mm f/4 S
//! Exposure
//!     F4 | ISO100 | 35mm | 1/250s
//! Taken
//!     2023-08-15 10:22:33
//! Brand icon
//!     icon-nikon
//! ```
//!
//! ## Render
//!
//! ```text
//! Preview → preview.png
//!     Composite: 1360x944
//!     Image: 1280x800 at 40,40 (scale 0.50)
//!     Band: 1280x64 at 40,840
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::imaging::calculations::LayoutResult;
use crate::metadata::DisplayMetadata;
use crate::preview::{Notice, NoticeLevel};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// A section header followed by its non-empty `Label: value` lines.
/// Sections with no values are left out entirely.
fn section(lines: &mut Vec<String>, title: &str, fields: &[(&str, &str)]) {
    let present: Vec<_> = fields.iter().filter(|(_, v)| !v.is_empty()).collect();
    if present.is_empty() {
        return;
    }
    lines.push(title.to_string());
    for (label, value) in present {
        if label.is_empty() {
            lines.push(format!("{}{}", indent(1), value));
        } else {
            lines.push(format!("{}{}: {}", indent(1), label, value));
        }
    }
}

// ============================================================================
// Exif
// ============================================================================

/// Format normalized metadata and the resolved brand icon.
pub fn format_metadata(display: &DisplayMetadata, icon_id: &str) -> Vec<String> {
    let mut lines = Vec::new();
    section(
        &mut lines,
        "Camera",
        &[("Make", display.camera_make.as_str()), ("Model", display.camera_model.as_str())],
    );
    section(
        &mut lines,
        "Lens",
        &[("Make", display.lens_make.as_str()), ("Model", display.lens_model.as_str())],
    );
    section(&mut lines, "Exposure", &[("", display.shooting_line().as_str())]);
    section(&mut lines, "Taken", &[("", display.timestamp.as_str())]);
    section(
        &mut lines,
        "Credits",
        &[("Artist", display.artist.as_str()), ("Copyright", display.copyright.as_str())],
    );

    if lines.is_empty() {
        lines.push("No metadata".to_string());
    }
    lines.push("Brand icon".to_string());
    if icon_id.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    } else {
        lines.push(format!("{}{}", indent(1), icon_id));
    }
    lines
}

pub fn print_metadata(display: &DisplayMetadata, icon_id: &str) {
    for line in format_metadata(display, icon_id) {
        println!("{}", line);
    }
}

// ============================================================================
// Render / export
// ============================================================================

/// Format the geometry of a rendered preview.
pub fn format_render_output(layout: &LayoutResult, output: &Path) -> Vec<String> {
    let mut lines = vec![
        format!("Preview → {}", output.display()),
        format!("{}Composite: {}", indent(1), layout.composite),
        format!(
            "{}Image: {}x{} at {},{} (scale {:.2})",
            indent(1),
            layout.image.width,
            layout.image.height,
            layout.image.x,
            layout.image.y,
            layout.scale
        ),
    ];
    if layout.has_band() {
        lines.push(format!(
            "{}Band: {}x{} at {},{}",
            indent(1),
            layout.band.width,
            layout.band.height,
            layout.band.x,
            layout.band.y
        ));
    } else {
        lines.push(format!("{}Band: none (no metadata)", indent(1)));
    }
    lines
}

pub fn print_render_output(layout: &LayoutResult, output: &Path) {
    for line in format_render_output(layout, output) {
        println!("{}", line);
    }
}

/// Format a user notice as one line.
pub fn format_notice(notice: &Notice) -> String {
    let mark = match notice.level {
        NoticeLevel::Success => "✓",
        NoticeLevel::Error => "✗",
    };
    format!("{} {}: {}", mark, notice.title, notice.message)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::calculations::LayoutEngine;
    use crate::imaging::params::RenderParams;
    use crate::test_helpers::sample_display;
    use crate::types::Size;

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn section_skips_empty_fields() {
        let mut lines = Vec::new();
        section(&mut lines, "Lens", &[("Make", ""), ("Model", "50mm")]);
        assert_eq!(lines, vec!["Lens", "    Model: 50mm"]);
    }

    #[test]
    fn section_omitted_when_all_empty() {
        let mut lines = Vec::new();
        section(&mut lines, "Lens", &[("Make", ""), ("Model", "")]);
        assert!(lines.is_empty());
    }

    // =========================================================================
    // Exif
    // =========================================================================

    #[test]
    fn format_metadata_full() {
        let lines = format_metadata(&sample_display(), "icon-nikon");
        assert_eq!(
            lines,
            vec![
                "Camera",
                "    Make: NIKON CORPORATION",
                "    Model: NIKON Z 6_2",
                "Lens",
                "    Model: NIKKOR Z 24-70mm f/4 S",
                "Exposure",
                "    F4 | ISO100 | 35mm | 1/250s",
                "Taken",
                "    2023-08-15 10:22:33",
                "Brand icon",
                "    icon-nikon",
            ]
        );
    }

    #[test]
    fn format_metadata_empty() {
        let lines = format_metadata(&DisplayMetadata::default(), "");
        assert_eq!(lines, vec!["No metadata", "Brand icon", "    (none)"]);
    }

    // =========================================================================
    // Render
    // =========================================================================

    #[test]
    fn format_render_with_band() {
        let params = RenderParams {
            border_size: 10,
            ..RenderParams::default()
        };
        let layout = LayoutEngine::new(64).layout(Size::new(100, 50), Size::UNBOUNDED, &params, true);
        let lines = format_render_output(&layout, Path::new("out.png"));
        assert_eq!(
            lines,
            vec![
                "Preview → out.png",
                "    Composite: 120x134",
                "    Image: 100x50 at 10,10 (scale 1.00)",
                "    Band: 100x64 at 10,60",
            ]
        );
    }

    #[test]
    fn format_render_without_band() {
        let layout =
            LayoutEngine::new(64).layout(Size::new(100, 50), Size::UNBOUNDED, &RenderParams::default(), false);
        let lines = format_render_output(&layout, Path::new("out.png"));
        assert_eq!(lines[3], "    Band: none (no metadata)");
    }

    #[test]
    fn format_notice_levels() {
        let ok = Notice {
            level: NoticeLevel::Success,
            title: "Export complete".into(),
            message: "Saved to a.jpg".into(),
        };
        assert_eq!(format_notice(&ok), "✓ Export complete: Saved to a.jpg");

        let err = Notice {
            level: NoticeLevel::Error,
            title: "Export failed".into(),
            message: "disk full".into(),
        };
        assert_eq!(format_notice(&err), "✗ Export failed: disk full");
    }
}
