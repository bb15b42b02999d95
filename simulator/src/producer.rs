//! Synthetic play-event producer
//!
//! Tracks are drawn in proportion to their catalog popularity weight using
//! cumulative-weight inverse-transform sampling. Listen ratios follow a
//! Beta(5, 2) distribution, clamped so at least 10 seconds are played.

use chrono::{DateTime, Duration, Utc};
use playstream_core::{Catalog, CatalogEntry, Error, PlayEvent, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Beta, Distribution};

pub const SOURCES: &[&str] = &[
    "amazon-music",
    "apple-music",
    "spotify",
    "tidal",
    "youtube-music",
];

const MIN_LISTEN_SECS: f64 = 10.0;
const EVENT_SPACING_MS: i64 = 100;

/// Cumulative-weight sampler over catalog entries
#[derive(Debug, Clone)]
pub struct WeightedTracks {
    tracks: Vec<CatalogEntry>,
    cumulative: Vec<f64>,
}

impl WeightedTracks {
    pub fn new(catalog: &Catalog) -> Result<Self> {
        let tracks: Vec<CatalogEntry> = catalog.entries().into_iter().cloned().collect();
        if tracks.is_empty() {
            return Err(Error::Config("catalog is empty".into()));
        }

        let mut running = 0.0;
        let cumulative = tracks
            .iter()
            .map(|t| {
                running += t.popularity_weight;
                running
            })
            .collect();

        Ok(Self { tracks, cumulative })
    }

    fn total_weight(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Entry whose cumulative interval contains `u * total_weight`, `u` in [0, 1)
    pub fn pick(&self, u: f64) -> &CatalogEntry {
        let target = u * self.total_weight();
        let idx = self.cumulative.partition_point(|&c| c <= target);
        &self.tracks[idx.min(self.tracks.len() - 1)]
    }
}

pub struct EventProducer {
    rng: StdRng,
    tracks: WeightedTracks,
    users: Vec<String>,
    listen: Beta<f64>,
}

impl EventProducer {
    pub fn new(tracks: WeightedTracks, user_count: usize, seed: u64) -> Result<Self> {
        if user_count == 0 {
            return Err(Error::Config("user pool must not be empty".into()));
        }
        let listen = Beta::new(5.0, 2.0).map_err(|e| Error::Config(e.to_string()))?;
        let users = (1..=user_count).map(|i| format!("user_{:05}", i)).collect();

        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            tracks,
            users,
            listen,
        })
    }

    pub fn emit(&mut self, timestamp: DateTime<Utc>) -> PlayEvent {
        let track = self.tracks.pick(self.rng.random::<f64>());
        let duration = track.duration_secs as f64;
        let listened = (self.listen.sample(&mut self.rng) * duration)
            .floor()
            .clamp(MIN_LISTEN_SECS.min(duration), duration);
        let track_id = track.track_id.clone();

        let user = &self.users[self.rng.random_range(0..self.users.len())];
        let source = SOURCES[self.rng.random_range(0..SOURCES.len())];

        PlayEvent::new(track_id, user.clone(), timestamp, listened / duration, source)
    }

    /// `n` events spaced 100 ms apart starting at `start`
    pub fn batch(&mut self, n: usize, start: DateTime<Utc>) -> Vec<PlayEvent> {
        self.interleaved(n, start, 0, 1)
    }

    /// This producer's share of a timeline shared by `producers` producers.
    ///
    /// Slots are 100 ms apart; producer `index` takes every `producers`-th
    /// slot starting at slot `index`, so concurrent producers cover the same
    /// time range.
    pub fn interleaved(
        &mut self,
        n: usize,
        start: DateTime<Utc>,
        index: usize,
        producers: usize,
    ) -> Vec<PlayEvent> {
        let stride = producers.max(1);
        (0..n)
            .map(|i| {
                let slot = (i * stride + index) as i64;
                self.emit(start + Duration::milliseconds(slot * EVENT_SPACING_MS))
            })
            .collect()
    }
}
