//! Preview controller: owns the live composite and keeps it current.
//!
//! ## States
//!
//! ```text
//! Idle ──load──▶ Loaded ──first render applied──▶ Ready ◀──▶ Rendering
//! ```
//!
//! `Idle` until an image is opened. Opening an image starts a metadata
//! fetch and immediately renders without metadata, so the bordered image
//! appears without waiting. When the fetch completes (or fails) the preview
//! re-renders with the band (or without it). Every parameter edit, container
//! resize or new image renders again.
//!
//! ## Versioning
//!
//! Renders run on the rayon pool and may finish in any order. Each job
//! carries a [`RenderTicket`]: the image version, the parameter version and
//! a context version bumped whenever metadata arrives or the container
//! resizes. A finished render is applied only if its ticket equals the
//! controller's current ticket; anything else is dropped. Superseded jobs
//! are never cancelled, their results just lose. Metadata results carry the
//! image version they were fetched for and are dropped the same way.
//!
//! ## Threads
//!
//! The controller itself lives on one thread (the interaction thread) and
//! is the only writer of the surface. Workers report back over a channel;
//! the owner drains it with [`pump`](PreviewController::pump) or blocks on
//! it with [`wait_idle`](PreviewController::wait_idle).

use crate::cache::MetadataCache;
use crate::config::PreviewConfig;
use crate::imaging::bridge::{BridgeError, ExportBridge, ExportRequest};
use crate::imaging::calculations::LayoutResult;
use crate::imaging::native::decode_image;
use crate::imaging::operations::{Composite, Pipeline};
use crate::imaging::params::{ParamChange, ParamsStore, RenderParams};
use crate::metadata::ExifMetadata;
use crate::types::Size;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    /// No image open.
    Idle,
    /// Image decoded; no render for it applied yet.
    Loaded,
    /// The surface shows the current versions.
    Ready,
    /// A render for newer versions is in flight.
    Rendering,
}

/// Versions a render was computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTicket {
    pub image: u64,
    pub params: u64,
    pub context: u64,
}

/// The decoded image for the current session.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub path: PathBuf,
    pub pixels: Arc<RgbaImage>,
}

impl ImageAsset {
    pub fn size(&self) -> Size {
        Size::new(self.pixels.width(), self.pixels.height())
    }
}

/// A self-contained render: everything it needs is captured, so it can run
/// on any thread while the controller moves on.
pub struct RenderJob {
    ticket: RenderTicket,
    image: Arc<RgbaImage>,
    metadata: Option<Arc<ExifMetadata>>,
    params: Arc<RenderParams>,
    container: Size,
    pipeline: Pipeline,
}

impl RenderJob {
    pub fn ticket(&self) -> RenderTicket {
        self.ticket
    }

    pub fn run(self) -> RenderOutcome {
        let composite = self.pipeline.compose(
            &self.image,
            self.metadata.as_deref(),
            &self.params,
            self.container,
        );
        RenderOutcome {
            ticket: self.ticket,
            composite,
        }
    }
}

/// A finished render waiting to be applied.
#[derive(Debug)]
pub struct RenderOutcome {
    pub ticket: RenderTicket,
    pub composite: Composite,
}

/// Messages from worker threads back to the controller.
#[derive(Debug)]
pub enum PreviewEvent {
    Rendered(RenderOutcome),
    Metadata {
        image_version: u64,
        result: Result<ExifMetadata, BridgeError>,
    },
    Exported {
        output: PathBuf,
        result: Result<(), BridgeError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A user-facing message. Presentation is up to the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStatus {
    /// Export is running; a notice follows when it finishes.
    Started,
    /// No destination was chosen.
    Cancelled,
    /// Nothing to export.
    NoImage,
}

pub struct PreviewController {
    state: PreviewState,
    pipeline: Pipeline,
    bridge: Arc<dyn ExportBridge>,
    cache: Option<MetadataCache>,
    params: ParamsStore,
    container: Size,

    image: Option<ImageAsset>,
    image_version: u64,
    metadata: Option<Arc<ExifMetadata>>,
    context_version: u64,
    surface: Option<Composite>,

    renders_in_flight: usize,
    fetches_in_flight: usize,
    exports_in_flight: usize,
    notices: Vec<Notice>,
    events_tx: Sender<PreviewEvent>,
    events_rx: Receiver<PreviewEvent>,
}

impl PreviewController {
    pub fn new(config: &PreviewConfig, bridge: Arc<dyn ExportBridge>) -> Self {
        Self::from_parts(
            Pipeline::from_config(config),
            ParamsStore::from_config(config),
            config.container(),
            bridge,
            MetadataCache::from_config(&config.cache),
        )
    }

    pub fn from_parts(
        pipeline: Pipeline,
        params: ParamsStore,
        container: Size,
        bridge: Arc<dyn ExportBridge>,
        cache: Option<MetadataCache>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            state: PreviewState::Idle,
            pipeline,
            bridge,
            cache,
            params,
            container,
            image: None,
            image_version: 0,
            metadata: None,
            context_version: 0,
            surface: None,
            renders_in_flight: 0,
            fetches_in_flight: 0,
            exports_in_flight: 0,
            notices: Vec::new(),
            events_tx,
            events_rx,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> PreviewState {
        self.state
    }

    pub fn current_ticket(&self) -> RenderTicket {
        RenderTicket {
            image: self.image_version,
            params: self.params.version(),
            context: self.context_version,
        }
    }

    pub fn params(&self) -> Arc<RenderParams> {
        self.params.snapshot()
    }

    pub fn image(&self) -> Option<&ImageAsset> {
        self.image.as_ref()
    }

    pub fn metadata(&self) -> Option<&ExifMetadata> {
        self.metadata.as_deref()
    }

    pub fn container(&self) -> Size {
        self.container
    }

    /// The visible composite, if any render has been applied for this image.
    pub fn surface(&self) -> Option<&RgbaImage> {
        self.surface.as_ref().map(|c| &c.raster)
    }

    pub fn surface_layout(&self) -> Option<&LayoutResult> {
        self.surface.as_ref().map(|c| &c.layout)
    }

    /// True while any render, metadata fetch or export is outstanding.
    pub fn is_busy(&self) -> bool {
        self.renders_in_flight > 0 || self.fetches_in_flight > 0 || self.exports_in_flight > 0
    }

    // =========================================================================
    // Inputs
    // =========================================================================

    /// Decode and open an image file.
    ///
    /// On a decode error the current session is left as it was.
    pub fn load_image(&mut self, path: &Path) -> Result<(), BridgeError> {
        let pixels = decode_image(path).inspect_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "could not open image");
        })?;
        self.set_image(path, pixels);
        Ok(())
    }

    /// Open an already-decoded image. Replaces any previous image and its
    /// metadata, starts a metadata fetch and renders without metadata.
    pub fn set_image(&mut self, path: &Path, pixels: RgbaImage) {
        self.image_version += 1;
        self.image = Some(ImageAsset {
            path: path.to_path_buf(),
            pixels: Arc::new(pixels),
        });
        self.metadata = None;
        self.surface = None;
        self.state = PreviewState::Loaded;
        tracing::info!(path = %path.display(), version = self.image_version, "image loaded");

        self.spawn_metadata_fetch(path.to_path_buf());
        self.request_render();
    }

    /// Apply one parameter edit. Returns `true` if the parameters changed.
    ///
    /// With no image open the new value is kept for the next image and
    /// nothing renders.
    pub fn update(&mut self, change: ParamChange) -> bool {
        if !self.params.apply(change) {
            return false;
        }
        tracing::debug!(version = self.params.version(), "params changed");
        if self.image.is_some() {
            self.request_render();
        }
        true
    }

    /// The preview viewport changed size.
    pub fn resize_container(&mut self, container: Size) {
        if container == self.container {
            return;
        }
        self.container = container;
        self.context_version += 1;
        if self.image.is_some() {
            self.request_render();
        }
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Capture a render job for the current versions, or `None` with no
    /// image. The caller runs it and hands the outcome to [`apply`](Self::apply).
    pub fn prepare_render(&mut self) -> Option<RenderJob> {
        let image = self.image.as_ref()?;
        let job = RenderJob {
            ticket: self.current_ticket(),
            image: Arc::clone(&image.pixels),
            metadata: self.metadata.clone(),
            params: self.params.snapshot(),
            container: self.container,
            pipeline: self.pipeline.clone(),
        };
        self.renders_in_flight += 1;
        if self.state != PreviewState::Loaded {
            self.state = PreviewState::Rendering;
        }
        Some(job)
    }

    /// Start a render on the rayon pool.
    pub fn request_render(&mut self) {
        let Some(job) = self.prepare_render() else {
            return;
        };
        let tx = self.events_tx.clone();
        rayon::spawn(move || {
            let outcome = job.run();
            // Receiver gone means the controller was dropped
            let _ = tx.send(PreviewEvent::Rendered(outcome));
        });
    }

    /// Apply a finished render if it is still current. Returns whether the
    /// surface changed.
    pub fn apply(&mut self, outcome: RenderOutcome) -> bool {
        self.renders_in_flight = self.renders_in_flight.saturating_sub(1);
        if outcome.ticket != self.current_ticket() {
            tracing::debug!(
                ticket = ?outcome.ticket,
                current = ?self.current_ticket(),
                "dropping stale render"
            );
            return false;
        }
        self.surface = Some(outcome.composite);
        self.state = PreviewState::Ready;
        true
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    fn spawn_metadata_fetch(&mut self, path: PathBuf) {
        let bridge = Arc::clone(&self.bridge);
        let cache = self.cache.clone();
        let tx = self.events_tx.clone();
        let image_version = self.image_version;
        self.fetches_in_flight += 1;

        std::thread::spawn(move || {
            let result = bridge.fetch_metadata(&path);
            if let (Ok(metadata), Some(cache)) = (&result, &cache) {
                if let Err(e) = cache.store(&path, metadata) {
                    tracing::warn!(path = %cache.path().display(), error = %e, "metadata cache write failed");
                }
            }
            let _ = tx.send(PreviewEvent::Metadata {
                image_version,
                result,
            });
        });
    }

    fn on_metadata(&mut self, image_version: u64, result: Result<ExifMetadata, BridgeError>) {
        self.fetches_in_flight = self.fetches_in_flight.saturating_sub(1);
        if image_version != self.image_version || self.image.is_none() {
            tracing::debug!(image_version, current = self.image_version, "dropping stale metadata");
            return;
        }

        self.metadata = match result {
            Ok(metadata) => Some(Arc::new(metadata)),
            Err(e) => {
                tracing::warn!(error = %e, "metadata unavailable; rendering without watermark band");
                None
            }
        };
        self.context_version += 1;
        self.request_render();
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Export the current image at full resolution to `destination`.
    /// `None` (no destination chosen) is a cancellation.
    pub fn export(&mut self, destination: Option<PathBuf>) -> ExportStatus {
        let Some(output) = destination else {
            tracing::info!("export cancelled");
            return ExportStatus::Cancelled;
        };
        let Some(image) = &self.image else {
            return ExportStatus::NoImage;
        };

        let request = ExportRequest::from_params(&image.path, &output, &self.params.snapshot());
        let bridge = Arc::clone(&self.bridge);
        let tx = self.events_tx.clone();
        self.exports_in_flight += 1;

        std::thread::spawn(move || {
            let result = bridge.export_composite(&request);
            let _ = tx.send(PreviewEvent::Exported { output, result });
        });
        ExportStatus::Started
    }

    fn on_exported(&mut self, output: PathBuf, result: Result<(), BridgeError>) {
        self.exports_in_flight = self.exports_in_flight.saturating_sub(1);
        let notice = match result {
            Ok(()) => {
                tracing::info!(output = %output.display(), "export finished");
                Notice {
                    level: NoticeLevel::Success,
                    title: "Export complete".to_string(),
                    message: format!("Saved to {}", output.display()),
                }
            }
            Err(e) => {
                tracing::error!(output = %output.display(), error = %e, "export failed");
                Notice {
                    level: NoticeLevel::Error,
                    title: "Export failed".to_string(),
                    message: e.to_string(),
                }
            }
        };
        self.notices.push(notice);
    }

    /// Drain queued notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // =========================================================================
    // Event loop
    // =========================================================================

    /// Handle one worker event.
    pub fn handle(&mut self, event: PreviewEvent) {
        match event {
            PreviewEvent::Rendered(outcome) => {
                self.apply(outcome);
            }
            PreviewEvent::Metadata {
                image_version,
                result,
            } => self.on_metadata(image_version, result),
            PreviewEvent::Exported { output, result } => self.on_exported(output, result),
        }
    }

    /// Handle every event that has already arrived, without blocking.
    /// Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Block until no work is outstanding or `timeout` passes. Returns
    /// `true` when idle.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.is_busy() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.events_rx.recv_timeout(remaining) {
                Ok(event) => self.handle(event),
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return false,
            }
        }
        true
    }
}
