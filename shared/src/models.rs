//! Domain models for PlayStream
//!
//! These types represent the core entities in the system:
//! - Play events: one listener playing (part of) one track
//! - Catalog entries: static per-track metadata used for enrichment
//! - Snapshots: point-in-time copies of the aggregate state
//! - Ingestion results and processor statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{Error, Result};

/// Originating platform of a play (e.g. "spotify", "web")
///
/// Ordering is lexical on the tag, which is what tie-breaks use.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Source(String);

impl Source {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Source {
    fn from(tag: &str) -> Self {
        Self(tag.to_string())
    }
}

impl From<String> for Source {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}

/// A single play occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayEvent {
    /// Track that was played; must exist in the catalog
    pub track_id: String,
    /// Listener identifier
    pub user_id: String,
    /// When the play happened
    pub timestamp: DateTime<Utc>,
    /// Fraction of the track that was played, in [0.0, 1.0]
    pub play_duration_ratio: f64,
    /// Platform the play came from
    pub source: Source,
}

impl PlayEvent {
    pub fn new(
        track_id: impl Into<String>,
        user_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        play_duration_ratio: f64,
        source: impl Into<Source>,
    ) -> Self {
        Self {
            track_id: track_id.into(),
            user_id: user_id.into(),
            timestamp,
            play_duration_ratio,
            source: source.into(),
        }
    }

    /// Check the structural rules every accepted event must satisfy
    pub fn validate(&self) -> Result<()> {
        if self.track_id.trim().is_empty() {
            return Err(Error::InvalidEvent("track_id is required".into()));
        }
        if self.user_id.trim().is_empty() {
            return Err(Error::InvalidEvent("user_id is required".into()));
        }
        if self.source.as_str().trim().is_empty() {
            return Err(Error::InvalidEvent("source is required".into()));
        }
        // NaN fails the range check as well
        if !(0.0..=1.0).contains(&self.play_duration_ratio) {
            return Err(Error::InvalidEvent(format!(
                "play_duration_ratio {} outside [0, 1]",
                self.play_duration_ratio
            )));
        }
        Ok(())
    }
}

/// Static per-track metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub track_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    /// Full length of the track in seconds
    pub duration_secs: u32,
    /// Relative weight used by producers for sampling; opaque to the processor
    pub popularity_weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<u16>,
}

impl CatalogEntry {
    pub fn new(
        track_id: impl Into<String>,
        title: impl Into<String>,
        duration_secs: u32,
        popularity_weight: f64,
    ) -> Self {
        Self {
            track_id: track_id.into(),
            title: title.into(),
            album: None,
            duration_secs,
            popularity_weight,
            release_year: None,
        }
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_release_year(mut self, year: u16) -> Self {
        self.release_year = Some(year);
        self
    }
}

/// One row of the ranked leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTrack {
    pub track_id: String,
    pub play_count: u64,
    /// Average fraction played, as a percentage in [0, 100]
    pub completion_pct: f64,
    pub top_source: Source,
}

/// Point-in-time copy of all aggregate state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub total_events: u64,
    pub distinct_tracks: usize,
    pub distinct_listeners: u64,
    /// Events per second in the current tumbling window
    pub window_throughput: f64,
    /// Descending play count, ties by ascending track id
    pub ranking: Vec<RankedTrack>,
}

impl Snapshot {
    /// The first `n` entries of the ranking
    pub fn top(&self, n: usize) -> &[RankedTrack] {
        &self.ranking[..n.min(self.ranking.len())]
    }

    pub fn track(&self, track_id: &str) -> Option<&RankedTrack> {
        self.ranking.iter().find(|r| r.track_id == track_id)
    }
}

/// Outcome of a batch ingestion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub accepted: u64,
    pub rejected: u64,
}

impl BatchResult {
    pub fn merge(&mut self, other: BatchResult) {
        self.accepted += other.accepted;
        self.rejected += other.rejected;
    }

    pub fn total(&self) -> u64 {
        self.accepted + self.rejected
    }
}

/// State observed right after an accepted event was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReceipt {
    /// Play count of the event's track including this event
    pub play_count: u64,
    /// Events in the current window including this event
    pub window_count: u64,
    pub total_events: u64,
}

/// Enriched per-track breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDetail {
    pub track_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    pub duration_secs: u32,
    pub play_count: u64,
    /// Distinct listeners of this track
    pub unique_listeners: u64,
    pub avg_listen_secs: f64,
    pub completion_pct: f64,
    /// Share of plays that reached the completed-play threshold
    pub completed_pct: f64,
    pub top_source: Source,
    pub source_counts: BTreeMap<Source, u64>,
}

/// Externally visible lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorStatus {
    /// Accepting events
    #[default]
    Active,
    /// Ingestion permanently closed
    Finalized,
}

/// Ingestion counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorStats {
    pub accepted: u64,
    pub rejected_unknown_track: u64,
    pub rejected_invalid: u64,
    pub windows_closed: u64,
    pub status: ProcessorStatus,
}

impl ProcessorStats {
    pub fn rejected(&self) -> u64 {
        self.rejected_unknown_track + self.rejected_invalid
    }
}
