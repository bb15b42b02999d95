//! Test fixtures and utilities

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use playstream_core::{Catalog, CatalogEntry, PlayEvent, ProcessorConfig, StreamProcessor};
use uuid::Uuid;

/// Generate a unique listener ID for testing
pub fn unique_user_id() -> String {
    format!("user-{}", &Uuid::new_v4().to_string()[..8])
}

/// Generate a track ID that is never in a fixture catalog
pub fn unknown_track_id() -> String {
    format!("missing-{}", &Uuid::new_v4().to_string()[..8])
}

/// Timestamp `secs` seconds after the epoch
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

/// Two-track catalog: A (weight 5) and B (weight 1)
pub fn ab_catalog() -> Arc<Catalog> {
    Arc::new(
        Catalog::from_entries(vec![
            CatalogEntry::new("A", "Track A", 180, 5.0),
            CatalogEntry::new("B", "Track B", 240, 1.0),
        ])
        .expect("Failed to build catalog"),
    )
}

/// Catalog with `n` tracks named t00, t01, ...
pub fn numbered_catalog(n: usize) -> Arc<Catalog> {
    Arc::new(
        Catalog::from_entries(
            (0..n).map(|i| CatalogEntry::new(format!("t{:02}", i), format!("Track {}", i), 200, 1.0)),
        )
        .expect("Failed to build catalog"),
    )
}

/// Processor over `catalog` with default settings
pub fn processor(catalog: Arc<Catalog>) -> StreamProcessor {
    StreamProcessor::new(catalog, ProcessorConfig::default()).expect("Failed to create processor")
}

/// Shorthand event constructor
pub fn play(track: &str, user: &str, ratio: f64, source: &str, secs: i64) -> PlayEvent {
    PlayEvent::new(track, user, at(secs), ratio, source)
}
