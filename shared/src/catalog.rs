//! Read-only track catalog used for enrichment
//!
//! Loaded once before processing starts and shared between ingestion paths
//! behind an `Arc`. Lookups take `&self` only.

use std::collections::HashMap;
use std::path::Path;

use tracing::{info, warn};

use crate::errors::{Error, Result};
use crate::models::CatalogEntry;

/// Mapping from track id to its metadata
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<String, CatalogEntry>,
}

impl Catalog {
    /// Build a catalog from entries.
    ///
    /// A repeated track id replaces the earlier entry.
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Result<Self> {
        let mut map = HashMap::new();
        for entry in entries {
            check_entry(&entry)?;
            if let Some(previous) = map.insert(entry.track_id.clone(), entry) {
                warn!(track_id = %previous.track_id, "Duplicate catalog entry replaced");
            }
        }
        Ok(Self { entries: map })
    }

    /// Parse a JSON array of entries
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    /// Load a JSON catalog file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&raw)?;
        info!(path = %path.display(), tracks = catalog.len(), "Loaded catalog");
        Ok(catalog)
    }

    /// Resolve a track id
    pub fn lookup(&self, track_id: &str) -> Result<&CatalogEntry> {
        self.entries
            .get(track_id)
            .ok_or_else(|| Error::UnknownTrack(track_id.to_string()))
    }

    pub fn contains(&self, track_id: &str) -> bool {
        self.entries.contains_key(track_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by track id
    pub fn entries(&self) -> Vec<&CatalogEntry> {
        let mut entries: Vec<&CatalogEntry> = self.entries.values().collect();
        entries.sort_by(|a, b| a.track_id.cmp(&b.track_id));
        entries
    }
}

fn check_entry(entry: &CatalogEntry) -> Result<()> {
    if entry.track_id.trim().is_empty() {
        return Err(Error::Config("catalog entry without track_id".into()));
    }
    if entry.duration_secs == 0 {
        return Err(Error::Config(format!(
            "track {} has zero duration",
            entry.track_id
        )));
    }
    if !(entry.popularity_weight > 0.0 && entry.popularity_weight.is_finite()) {
        return Err(Error::Config(format!(
            "track {} has non-positive popularity weight",
            entry.track_id
        )));
    }
    Ok(())
}
