//! Raster work: layout, drawing, and the export bridge.
//!
//! | Concern | Crate / function |
//! |---|---|
//! | **Decode / encode** | `image` (jpeg, png, tiff, webp) |
//! | **Resize** | `imageops::resize`, Triangle filter |
//! | **EXIF** | `kamadak-exif` via [`native::read_exif`] |
//! | **Text** | `ab_glyph` outlines, source-over blended by hand |
//!
//! The module is split into:
//! - **Parameters**: what the user controls, versioned ([`params`])
//! - **Calculations**: pure layout geometry, unit testable ([`calculations`])
//! - **Drawing**: fonts, icons and the [`Compositor`]
//! - **Operations**: the one pipeline both preview and export run
//! - **Bridge**: [`ExportBridge`] trait + [`NativeBridge`]

pub mod bridge;
pub mod calculations;
pub mod compositor;
pub mod icons;
pub mod native;
pub mod operations;
pub mod params;
pub mod text;

pub use bridge::{BridgeError, ExportBridge, ExportRequest};
pub use calculations::{LayoutEngine, LayoutResult};
pub use compositor::Compositor;
pub use native::NativeBridge;
pub use operations::{Composite, Pipeline};
pub use params::{ParamBounds, ParamChange, ParamsStore, RenderParams};
