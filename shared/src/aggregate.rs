//! Per-track rolling statistics and ranking

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::cardinality::{new_estimator, CardinalityEstimator, ExactEstimator};
use crate::config::{EstimatorKind, ProcessorConfig};
use crate::models::{RankedTrack, Source};

/// Plays reaching this fraction of the track count as completed plays
pub const COMPLETED_PLAY_RATIO: f64 = 0.70;

/// Rolling statistics for one track
///
/// Invariant: `play_count` equals the sum of `source_counts`.
#[derive(Debug)]
pub struct TrackAggregate {
    play_count: u64,
    completion_sum: f64,
    completed_plays: u64,
    source_counts: BTreeMap<Source, u64>,
    listeners: Box<dyn CardinalityEstimator>,
}

impl Default for TrackAggregate {
    fn default() -> Self {
        Self::new(Box::new(ExactEstimator::new()))
    }
}

impl TrackAggregate {
    fn new(listeners: Box<dyn CardinalityEstimator>) -> Self {
        Self {
            play_count: 0,
            completion_sum: 0.0,
            completed_plays: 0,
            source_counts: BTreeMap::new(),
            listeners,
        }
    }

    fn record(&mut self, user_id: &str, duration_ratio: f64, source: &Source) {
        self.listeners.record(user_id);
        self.play_count += 1;
        self.completion_sum += duration_ratio;
        if duration_ratio >= COMPLETED_PLAY_RATIO {
            self.completed_plays += 1;
        }
        match self.source_counts.get_mut(source) {
            Some(count) => *count += 1,
            None => {
                self.source_counts.insert(source.clone(), 1);
            }
        }
    }

    pub fn play_count(&self) -> u64 {
        self.play_count
    }

    pub fn completion_sum(&self) -> f64 {
        self.completion_sum
    }

    pub fn completed_plays(&self) -> u64 {
        self.completed_plays
    }

    pub fn source_counts(&self) -> &BTreeMap<Source, u64> {
        &self.source_counts
    }

    /// Distinct listeners of this track
    pub fn unique_listeners(&self) -> u64 {
        self.listeners.estimate()
    }

    /// Average fraction played as a percentage, clamped to [0, 100]
    pub fn completion_pct(&self) -> f64 {
        if self.play_count == 0 {
            return 0.0;
        }
        (self.completion_sum / self.play_count as f64 * 100.0).clamp(0.0, 100.0)
    }

    /// Share of plays at or above [`COMPLETED_PLAY_RATIO`], as a percentage
    pub fn completed_pct(&self) -> f64 {
        if self.play_count == 0 {
            return 0.0;
        }
        self.completed_plays as f64 / self.play_count as f64 * 100.0
    }

    /// Source with the highest count; ties go to the lexically smallest tag
    pub fn top_source(&self) -> Option<&Source> {
        let mut best: Option<(&Source, u64)> = None;
        // BTreeMap iterates in ascending tag order, so only a strictly
        // greater count replaces the current best
        for (source, &count) in &self.source_counts {
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((source, count)),
            }
        }
        best.map(|(source, _)| source)
    }
}

/// All track aggregates seen so far, created lazily
///
/// Per-track listener estimators use the backing chosen at construction.
#[derive(Debug)]
pub struct AggregateRegistry {
    tracks: HashMap<String, TrackAggregate>,
    estimator: EstimatorKind,
    hll_precision: u8,
}

impl Default for AggregateRegistry {
    fn default() -> Self {
        Self::for_config(&ProcessorConfig::default())
    }
}

impl AggregateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_config(config: &ProcessorConfig) -> Self {
        Self {
            tracks: HashMap::new(),
            estimator: config.estimator,
            hll_precision: config.hll_precision,
        }
    }

    /// Apply one play to the track's aggregate and return it
    pub fn update(
        &mut self,
        track_id: &str,
        user_id: &str,
        duration_ratio: f64,
        source: &Source,
    ) -> &TrackAggregate {
        let (kind, precision) = (self.estimator, self.hll_precision);
        let aggregate = self
            .tracks
            .entry(track_id.to_string())
            .or_insert_with(|| TrackAggregate::new(new_estimator(kind, precision)));
        aggregate.record(user_id, duration_ratio, source);
        aggregate
    }

    pub fn get(&self, track_id: &str) -> Option<&TrackAggregate> {
        self.tracks.get(track_id)
    }

    /// Number of distinct tracks with at least one play
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Sum of play counts across all tracks
    pub fn total_plays(&self) -> u64 {
        self.tracks.values().map(|t| t.play_count).sum()
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Every aggregate, by descending play count then ascending track id
    pub fn rank(&self) -> Vec<RankedTrack> {
        let mut ordered: Vec<(&String, &TrackAggregate)> = self.tracks.iter().collect();
        ordered.sort_by(|(a_id, a), (b_id, b)| compare_rank(a_id, a, b_id, b));

        ordered
            .into_iter()
            .filter_map(|(track_id, aggregate)| {
                aggregate.top_source().map(|top_source| RankedTrack {
                    track_id: track_id.clone(),
                    play_count: aggregate.play_count,
                    completion_pct: aggregate.completion_pct(),
                    top_source: top_source.clone(),
                })
            })
            .collect()
    }
}

fn compare_rank(a_id: &str, a: &TrackAggregate, b_id: &str, b: &TrackAggregate) -> Ordering {
    b.play_count
        .cmp(&a.play_count)
        .then_with(|| a_id.cmp(b_id))
}
