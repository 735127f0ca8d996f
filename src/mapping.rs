//! The URL mapping: local asset filenames → durable remote URLs.
//!
//! Built by the upload stage and consumed by the reference rewriter and the
//! featured-image policy. Each uploaded asset is keyed twice — under its
//! original PNG name and under its converted WebP name — so a document may
//! reference either representation and resolve to the same remote URL.
//!
//! Backed by a `BTreeMap` so iteration order (and therefore everything the
//! rewriter derives from it) is deterministic across runs. Persisted as a
//! flat JSON string-to-string object (`drive_urls.json`) beside the
//! converted assets, which is what makes `--skip-upload` re-runs possible.

use crate::error::Md2PressError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// File name of the persisted mapping, written into the WebP directory.
pub const MAPPING_FILE: &str = "drive_urls.json";

/// Run-scoped association from local asset filenames to remote URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlMapping {
    entries: BTreeMap<String, String>,
}

impl UrlMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a name → URL association. Append-only by convention: the
    /// upload stage never overwrites an existing key within a run.
    pub fn insert(&mut self, name: impl Into<String>, url: impl Into<String>) {
        self.entries.insert(name.into(), url.into());
    }

    /// Look up a URL by exact filename.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether `url` is one of this mapping's remote URLs. The rewriter
    /// uses this to leave already-rewritten references alone.
    pub fn contains_url(&self, url: &str) -> bool {
        self.entries.values().any(|v| v == url)
    }

    /// Distinct filename stems paired with their URLs, longest stem first
    /// (ties broken lexicographically).
    ///
    /// The ordering is the whole point: `fig10` must be tried before `fig1`
    /// so a substring match can never route a longer name's reference to a
    /// shorter name's URL.
    pub fn stems_longest_first(&self) -> Vec<(String, String)> {
        let mut by_stem: BTreeMap<String, String> = BTreeMap::new();
        for (name, url) in &self.entries {
            by_stem
                .entry(stem(name).to_string())
                .or_insert_with(|| url.clone());
        }
        let mut stems: Vec<(String, String)> = by_stem.into_iter().collect();
        stems.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        stems
    }

    /// Resolve a declared asset reference through the mapping by stem:
    /// first the converted `<stem>.webp` key, then the reference's own
    /// file name.
    pub fn resolve_reference(&self, reference: &str) -> Option<&str> {
        let file_name = Path::new(reference)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(reference);
        let webp_name = format!("{}.webp", stem(reference));
        self.get(&webp_name).or_else(|| self.get(file_name))
    }

    /// Load a persisted mapping.
    pub fn load(path: &Path) -> Result<Self, Md2PressError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| Md2PressError::ArtifactRead {
                path: path.to_path_buf(),
                source,
            })?;
        let mapping: Self =
            serde_json::from_str(&content).map_err(|e| Md2PressError::ArtifactParse {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;
        debug!("Loaded URL mapping: {} entries from {}", mapping.len(), path.display());
        Ok(mapping)
    }

    /// Persist the mapping as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), Md2PressError> {
        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| Md2PressError::Internal(format!("Mapping serialisation failed: {e}")))?;
        std::fs::write(path, json).map_err(|source| Md2PressError::ArtifactWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// The filename stem: base name without its final extension.
///
/// The stem is the identity key that ties a PNG, its WebP derivative, and
/// any document reference to one logical asset.
pub fn stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}
