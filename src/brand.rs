//! Camera make → brand icon resolution.
//!
//! A fixed, ordered registry maps lowercase brand keys to icon identifiers.
//! Resolution normalizes the make (trim + lowercase), tries an exact key
//! match, then scans the registry in order for the first key contained in
//! the make. `"NIKON CORPORATION"` resolves through the substring pass to
//! `nikon`; `"Apple"` hits `apple` exactly.
//!
//! Order matters for the substring pass: earlier keys win. Extra entries
//! from `[[icons.brands]]` in config are appended after the built-in table,
//! so they can add brands but never shadow an existing match.

use crate::config::BrandEntry;

/// Built-in registry. Each entry's first icon is the one drawn; the rest
/// are alternates kept for icon sets that name things differently.
const BUILTIN_BRANDS: &[(&str, &[&str])] = &[
    ("oppo", &["icon-oppo", "icon-OPPO1"]),
    ("apple", &["icon-apple-fill"]),
    ("meizu", &["icon-meizu"]),
    ("fujifilm", &["icon-fushi"]),
    ("panasonic", &["icon-panasonic"]),
    ("canon", &["icon-canon", "icon-jianeng"]),
    ("oneplus", &["icon-oneplus"]),
    ("vivo", &["icon-vivo", "icon-vivo1"]),
    ("dji", &["icon-DJI"]),
    ("samsung", &["icon-samsung"]),
    ("huawei", &["icon-huawei", "icon-huawei1"]),
    ("xiaomi", &["icon-icon-xiaomiguishu"]),
    ("sony", &["icon-sony"]),
    ("leica", &["icon-leica"]),
    ("pentax", &["icon-pentax"]),
    ("ricoh", &["icon-ricoh"]),
    ("sigma", &["icon-sigma"]),
    ("nikon", &["icon-nikon"]),
    ("olympus", &["icon-olympus"]),
    ("nikons", &["icon-nikons"]),
    ("hasselblad", &["icon-Hasselblad"]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
struct Brand {
    key: String,
    icons: Vec<String>,
}

/// Maps camera make strings to icon identifiers.
///
/// Immutable after construction, so one resolver can be shared across the
/// render workers and the export path.
#[derive(Debug, Clone)]
pub struct BrandIconResolver {
    brands: Vec<Brand>,
}

impl Default for BrandIconResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl BrandIconResolver {
    /// Resolver over the built-in registry only.
    pub fn new() -> Self {
        Self {
            brands: BUILTIN_BRANDS
                .iter()
                .map(|(key, icons)| Brand {
                    key: (*key).to_string(),
                    icons: icons.iter().map(|s| (*s).to_string()).collect(),
                })
                .collect(),
        }
    }

    /// Built-in registry followed by `extra` entries, in the given order.
    ///
    /// Entries with a blank key or no icons are ignored.
    pub fn with_entries(extra: &[BrandEntry]) -> Self {
        let mut resolver = Self::new();
        resolver.brands.extend(
            extra
                .iter()
                .filter(|e| !e.key.trim().is_empty() && !e.icons.is_empty())
                .map(|e| Brand {
                    key: e.key.trim().to_lowercase(),
                    icons: e.icons.clone(),
                }),
        );
        resolver
    }

    /// Icon identifier for a camera make, or `""` when no brand matches.
    pub fn resolve(&self, make: &str) -> String {
        self.resolve_all(make)
            .and_then(|icons| icons.first())
            .cloned()
            .unwrap_or_default()
    }

    /// All icon identifiers registered for the matching brand.
    pub fn resolve_all(&self, make: &str) -> Option<&[String]> {
        let needle = make.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        self.brands
            .iter()
            .find(|b| b.key == needle)
            .or_else(|| self.brands.iter().find(|b| needle.contains(b.key.as_str())))
            .map(|b| b.icons.as_slice())
    }

    /// Registered brand keys in resolution order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.brands.iter().map(|b| b.key.as_str())
    }
}
