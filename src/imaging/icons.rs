//! Brand icon graphics.
//!
//! Icons are PNG files named after their identifier (`icon-nikon.png`) in
//! the configured icon directory. They are decoded on first use, scaled to
//! fit a square of the requested size, and cached per `(id, size)`. A
//! missing or unreadable file is logged once and then treated as "no icon".

use image::imageops::{self, FilterType};
use image::RgbaImage;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

type IconCache = HashMap<(String, u32), Option<Arc<RgbaImage>>>;

#[derive(Debug, Default)]
pub struct IconSet {
    dir: Option<PathBuf>,
    sources: Mutex<HashMap<String, Option<Arc<RgbaImage>>>>,
    scaled: Mutex<IconCache>,
}

impl IconSet {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            ..Self::default()
        }
    }

    /// An icon set with no directory: every lookup misses unless an icon
    /// was registered with [`with_icon`](Self::with_icon).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register an in-memory icon, taking precedence over the directory.
    pub fn with_icon(self, id: &str, icon: RgbaImage) -> Self {
        self.sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), Some(Arc::new(icon)));
        self
    }

    /// The icon for `id`, scaled to fit a `size`×`size` square.
    ///
    /// Empty ids and zero sizes are misses.
    pub fn get(&self, id: &str, size: u32) -> Option<Arc<RgbaImage>> {
        if id.is_empty() || size == 0 {
            return None;
        }

        let key = (id.to_string(), size);
        if let Some(hit) = self
            .scaled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return hit.clone();
        }

        let icon = self.source(id).map(|src| Arc::new(fit_square(&src, size)));
        self.scaled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, icon.clone());
        icon
    }

    fn source(&self, id: &str) -> Option<Arc<RgbaImage>> {
        let mut sources = self.sources.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = sources.get(id) {
            return hit.clone();
        }

        let loaded = self.dir.as_ref().and_then(|dir| {
            let path = dir.join(format!("{id}.png"));
            match image::open(&path) {
                Ok(img) => Some(Arc::new(img.to_rgba8())),
                Err(e) => {
                    tracing::warn!(icon = id, path = %path.display(), error = %e, "icon unavailable");
                    None
                }
            }
        });
        sources.insert(id.to_string(), loaded.clone());
        loaded
    }
}

/// Scale `src` so its longer side equals `size`, keeping aspect ratio.
fn fit_square(src: &RgbaImage, size: u32) -> RgbaImage {
    let (w, h) = src.dimensions();
    if w == 0 || h == 0 || (w.max(h) == size) {
        return src.clone();
    }
    let scale = size as f64 / w.max(h) as f64;
    let tw = ((w as f64 * scale).round() as u32).max(1);
    let th = ((h as f64 * scale).round() as u32).max(1);
    imageops::resize(src, tw, th, FilterType::Triangle)
}
