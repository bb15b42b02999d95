//! Stream processor
//!
//! Owns all mutable aggregate state behind a single mutex. Every accepted
//! event updates the track registry, the listener estimator, the window and
//! the event counter under one lock acquisition, and snapshots copy state
//! under the same lock, so a reader never sees half of an event.
//!
//! Ingest order of checks:
//! 1. finalized processor: `Error::Finalized`, nothing counted
//! 2. malformed event, or a timestamp with no representable window:
//!    `Error::InvalidEvent`, rejection counted
//! 3. track missing from the catalog: `Error::UnknownTrack`, rejection counted
//! 4. otherwise registry, estimator, window and total are all updated

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, info};

use crate::aggregate::{AggregateRegistry, TrackAggregate};
use crate::cardinality::{estimator_for, CardinalityEstimator};
use crate::catalog::Catalog;
use crate::config::ProcessorConfig;
use crate::errors::{Error, Result};
use crate::models::*;
use crate::window::WindowAccumulator;

#[derive(Debug)]
struct ProcessorState {
    registry: AggregateRegistry,
    listeners: Box<dyn CardinalityEstimator>,
    window: WindowAccumulator,
    total_events: u64,
    rejected_unknown_track: u64,
    rejected_invalid: u64,
    status: ProcessorStatus,
}

impl ProcessorState {
    fn apply(&mut self, event: &PlayEvent) -> IngestReceipt {
        let play_count = self
            .registry
            .update(
                &event.track_id,
                &event.user_id,
                event.play_duration_ratio,
                &event.source,
            )
            .play_count();
        self.listeners.record(&event.user_id);
        let window_count = self.window.observe(event.timestamp);
        self.total_events += 1;

        IngestReceipt {
            play_count,
            window_count,
            total_events: self.total_events,
        }
    }

    // Every accepted event lands in exactly one track aggregate
    fn check_consistency(&self) -> Result<()> {
        let plays = self.registry.total_plays();
        if plays != self.total_events {
            return Err(Error::ConcurrencyViolation(format!(
                "total_events {} but aggregates hold {} plays",
                self.total_events, plays
            )));
        }
        Ok(())
    }

    fn stats(&self) -> ProcessorStats {
        ProcessorStats {
            accepted: self.total_events,
            rejected_unknown_track: self.rejected_unknown_track,
            rejected_invalid: self.rejected_invalid,
            windows_closed: self.window.windows_closed(),
            status: self.status,
        }
    }
}

/// Single-writer aggregation core
#[derive(Debug)]
pub struct StreamProcessor {
    catalog: Arc<Catalog>,
    config: ProcessorConfig,
    state: Mutex<ProcessorState>,
}

impl StreamProcessor {
    /// Create a processor using the estimator selected by `config`
    pub fn new(catalog: Arc<Catalog>, config: ProcessorConfig) -> Result<Self> {
        let estimator = estimator_for(&config);
        Self::with_estimator(catalog, config, estimator)
    }

    /// Create a processor with an explicit listener estimator
    pub fn with_estimator(
        catalog: Arc<Catalog>,
        config: ProcessorConfig,
        estimator: Box<dyn CardinalityEstimator>,
    ) -> Result<Self> {
        config.validate()?;

        info!(
            tracks = catalog.len(),
            window_secs = config.window_secs,
            estimator = estimator.name(),
            "Stream processor created"
        );

        let state = ProcessorState {
            registry: AggregateRegistry::for_config(&config),
            listeners: estimator,
            window: WindowAccumulator::new(config.window_secs),
            total_events: 0,
            rejected_unknown_track: 0,
            rejected_invalid: 0,
            status: ProcessorStatus::Active,
        };

        Ok(Self {
            catalog,
            config,
            state: Mutex::new(state),
        })
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Apply one event.
    ///
    /// A rejected event leaves every aggregate untouched; only the matching
    /// rejection counter moves.
    pub fn ingest(&self, event: &PlayEvent) -> Result<IngestReceipt> {
        let mut state = self.lock()?;

        if state.status == ProcessorStatus::Finalized {
            return Err(Error::Finalized);
        }

        let checked = event
            .validate()
            .and_then(|()| state.window.check(event.timestamp));
        if let Err(e) = checked {
            state.rejected_invalid += 1;
            debug!(track_id = %event.track_id, error = %e, "Rejected event");
            return Err(e);
        }

        if let Err(e) = self.catalog.lookup(&event.track_id) {
            state.rejected_unknown_track += 1;
            debug!(track_id = %event.track_id, "Rejected event for unknown track");
            return Err(e);
        }

        Ok(state.apply(event))
    }

    /// Apply events in order, skipping the ones that are rejected.
    ///
    /// Only recoverable rejections are counted; any other error stops the
    /// batch and is returned.
    pub fn ingest_batch<'a, I>(&self, events: I) -> Result<BatchResult>
    where
        I: IntoIterator<Item = &'a PlayEvent>,
    {
        let mut result = BatchResult::default();

        for event in events {
            match self.ingest(event) {
                Ok(_) => result.accepted += 1,
                Err(e) if e.is_recoverable() => result.rejected += 1,
                Err(e) => {
                    error!(
                        error = %e,
                        accepted = result.accepted,
                        rejected = result.rejected,
                        "Batch ingestion aborted"
                    );
                    return Err(e);
                }
            }
        }

        debug!(accepted = result.accepted, rejected = result.rejected, "Batch ingested");
        Ok(result)
    }

    /// Consistent copy of the aggregate state
    pub fn snapshot(&self) -> Result<Snapshot> {
        let state = self.lock()?;
        state.check_consistency()?;

        Ok(Snapshot {
            total_events: state.total_events,
            distinct_tracks: state.registry.len(),
            distinct_listeners: state.listeners.estimate(),
            window_throughput: state.window.throughput(),
            ranking: state.registry.rank(),
        })
    }

    /// Enriched breakdown for one track; `None` if it has no plays yet
    pub fn track_detail(&self, track_id: &str) -> Result<Option<TrackDetail>> {
        let entry = self.catalog.lookup(track_id)?;
        let state = self.lock()?;
        Ok(state.registry.get(track_id).and_then(|aggregate| build_detail(entry, aggregate)))
    }

    /// Details for every played track, in ranking order
    pub fn track_details(&self) -> Result<Vec<TrackDetail>> {
        let state = self.lock()?;
        let mut details = Vec::with_capacity(state.registry.len());
        for ranked in state.registry.rank() {
            let entry = self.catalog.lookup(&ranked.track_id)?;
            let aggregate = state.registry.get(&ranked.track_id);
            if let Some(detail) = aggregate.and_then(|a| build_detail(entry, a)) {
                details.push(detail);
            }
        }
        Ok(details)
    }

    pub fn stats(&self) -> Result<ProcessorStats> {
        Ok(self.lock()?.stats())
    }

    pub fn status(&self) -> Result<ProcessorStatus> {
        Ok(self.lock()?.status)
    }

    /// Stop accepting events; later ingest calls fail with `Error::Finalized`
    pub fn finalize(&self) -> Result<ProcessorStats> {
        let mut state = self.lock()?;
        state.status = ProcessorStatus::Finalized;
        let stats = state.stats();
        info!(
            accepted = stats.accepted,
            rejected = stats.rejected(),
            "Stream processor finalized"
        );
        Ok(stats)
    }

    /// Drop all aggregate, listener and window state
    pub fn reset(&self) -> Result<()> {
        let mut state = self.lock()?;
        state.registry.clear();
        state.listeners.reset();
        state.window.reset();
        state.total_events = 0;
        state.rejected_unknown_track = 0;
        state.rejected_invalid = 0;
        info!("Stream processor reset");
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, ProcessorState>> {
        self.state
            .lock()
            .map_err(|_| Error::ConcurrencyViolation("processor state lock poisoned".into()))
    }
}

fn build_detail(entry: &CatalogEntry, aggregate: &TrackAggregate) -> Option<TrackDetail> {
    let top_source = aggregate.top_source()?;
    let avg_listen_secs =
        aggregate.completion_sum() * entry.duration_secs as f64 / aggregate.play_count() as f64;

    Some(TrackDetail {
        track_id: entry.track_id.clone(),
        title: entry.title.clone(),
        album: entry.album.clone(),
        duration_secs: entry.duration_secs,
        play_count: aggregate.play_count(),
        unique_listeners: aggregate.unique_listeners(),
        avg_listen_secs,
        completion_pct: aggregate.completion_pct(),
        completed_pct: aggregate.completed_pct(),
        top_source: top_source.clone(),
        source_counts: aggregate.source_counts().clone(),
    })
}
