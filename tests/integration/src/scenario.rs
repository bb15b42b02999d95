//! Scripted event sequences
//!
//! A `Scenario` records the events it hands out together with the counts an
//! accepting processor must end up with, so tests can compare the snapshot
//! against an independently computed expectation.

use std::collections::{BTreeMap, HashSet};

use playstream_core::{Catalog, PlayEvent};

use crate::fixtures::play;

#[derive(Debug, Default)]
pub struct Scenario {
    events: Vec<PlayEvent>,
    expected_plays: BTreeMap<String, u64>,
    expected_listeners: HashSet<String>,
    expected_rejections: u64,
}

impl Scenario {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, tracking whether `catalog` will accept it
    pub fn push(&mut self, catalog: &Catalog, event: PlayEvent) -> &mut Self {
        if event.validate().is_ok() && catalog.contains(&event.track_id) {
            *self.expected_plays.entry(event.track_id.clone()).or_insert(0) += 1;
            self.expected_listeners.insert(event.user_id.clone());
        } else {
            self.expected_rejections += 1;
        }
        self.events.push(event);
        self
    }

    /// Deterministic mix of tracks, users and sources one second apart
    pub fn round_robin(catalog: &Catalog, count: usize, users: usize) -> Self {
        let tracks: Vec<String> = catalog.entries().iter().map(|e| e.track_id.clone()).collect();
        let sources = ["app", "tv", "web"];
        let mut scenario = Self::new();
        for i in 0..count {
            // Skew towards earlier tracks so the ranking is not flat
            let track = &tracks[(i * i) % tracks.len()];
            let user = format!("user_{:04}", i % users);
            let ratio = (i % 11) as f64 / 10.0;
            let event = play(track, &user, ratio.min(1.0), sources[i % sources.len()], i as i64);
            scenario.push(catalog, event);
        }
        scenario
    }

    pub fn events(&self) -> &[PlayEvent] {
        &self.events
    }

    pub fn expected_plays(&self) -> &BTreeMap<String, u64> {
        &self.expected_plays
    }

    pub fn expected_listeners(&self) -> u64 {
        self.expected_listeners.len() as u64
    }

    pub fn expected_accepted(&self) -> u64 {
        self.expected_plays.values().sum()
    }

    pub fn expected_rejections(&self) -> u64 {
        self.expected_rejections
    }
}
