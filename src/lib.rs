//! # Photo Border
//!
//! Bordered, watermarked photo previews. Open a photo, adjust the border,
//! colors and fonts, and see the composite update live: the image framed by
//! a border, with a watermark band underneath (or above) showing the camera,
//! lens, shooting parameters, capture time and the maker's brand icon.
//! Export writes the same composite at full resolution.
//!
//! # Architecture: One Pipeline, Two Containers
//!
//! ```text
//! ExifMetadata ─▶ normalize ─▶ DisplayMetadata ─┐
//!                 brand lookup ─▶ icon id ──────┤
//! image + RenderParams + container ─▶ layout ───┴─▶ composite
//! ```
//!
//! The preview and the export run the same pipeline
//! ([`imaging::operations::Pipeline`]). The preview passes its viewport as
//! the container so large images are scaled down; the export passes an
//! unbounded container so nothing is. That is the whole difference, which is
//! what makes the preview trustworthy.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`preview`] | Preview state machine: loads, versioned async renders, export, notices |
//! | [`metadata`] | Raw EXIF record and its normalized display form, date parsing |
//! | [`brand`] | Ordered camera-make → brand icon registry |
//! | [`imaging`] | Layout geometry, fonts, icons, compositing, the export bridge |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`cache`] | Single-slot advisory cache of the last fetched metadata |
//! | [`types`] | Shared value types (`Color`, `Position`, `Size`, `Rect`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Last Writer Wins
//!
//! Dragging a slider fires many renders. They run on the rayon pool and are
//! never cancelled; instead each carries the versions it was computed from
//! and only a result matching the current versions is applied. Whatever
//! order they finish in, the surface ends up showing the newest parameters.
//!
//! ## Degrade, Don't Fail
//!
//! Missing metadata means no band, not an error. A missing icon or font
//! means the band without it. An unparseable date is left out. The
//! bordered image always renders. Only export reports failure to the user.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resizing, EXIF and text rendering are all pure Rust (`image`,
//! `kamadak-exif`, `ab_glyph`). No system libraries, no external tools.

pub mod brand;
pub mod cache;
pub mod config;
pub mod imaging;
pub mod metadata;
pub mod output;
pub mod preview;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
