//! PlayStream simulator
//!
//! Drives the stream processor with synthetic traffic in three waves, prints
//! a leaderboard and exports the final snapshot as JSON.

mod catalog_data;
mod config;
mod producer;
mod report;

use std::sync::Arc;

use chrono::{Duration, Utc};
use playstream_core::{Catalog, IngestService, StreamProcessor};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::{SimulatorConfig, WAVES};
use crate::producer::{EventProducer, WeightedTracks};
use crate::report::ExportDocument;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

// Events per queued batch
const CHUNK_SIZE: usize = 100;

async fn run(config: SimulatorConfig) -> Result<(), BoxError> {
    let catalog = match &config.catalog_path {
        Some(path) => Catalog::from_path(path)?,
        None => catalog_data::builtin_catalog()?,
    };
    let tracks = WeightedTracks::new(&catalog)?;
    let processor = Arc::new(StreamProcessor::new(Arc::new(catalog), config.processor.clone())?);
    let (handle, ingest_task) = IngestService::spawn(Arc::clone(&processor));

    let run_id = Uuid::new_v4();
    info!(run_id = %run_id, producers = config.producers, "Starting simulation");

    let mut clock = Utc::now();
    for (wave_index, wave) in WAVES.iter().enumerate() {
        let mut producers = Vec::with_capacity(config.producers);

        for p in 0..config.producers {
            // Producer p owns slots p, p + k, p + 2k, ... of the wave
            let count = wave.events.saturating_sub(p).div_ceil(config.producers);
            let seed = config.seed
                .wrapping_mul(1_000)
                .wrapping_add((wave_index * config.producers + p) as u64);
            let mut producer = EventProducer::new(tracks.clone(), config.users, seed)?;
            let handle = handle.clone();
            let (start, total) = (clock, config.producers);

            producers.push(tokio::spawn(async move {
                let events = producer.interleaved(count, start, p, total);
                for chunk in events.chunks(CHUNK_SIZE) {
                    handle.send_batch(chunk.to_vec()).await?;
                }
                Ok::<usize, playstream_core::Error>(count)
            }));
        }

        for producer in producers {
            producer.await??;
        }

        let totals = handle.flush().await?;
        let snapshot = processor.snapshot()?;
        info!(
            wave = wave.label,
            events = wave.events,
            accepted = totals.accepted,
            rejected = totals.rejected,
            listeners = snapshot.distinct_listeners,
            throughput = snapshot.window_throughput,
            "Wave ingested"
        );

        clock = clock + Duration::milliseconds(wave.events as i64 * 100);
    }

    drop(handle);
    let totals = ingest_task.await??;
    let stats = processor.finalize()?;
    if totals.rejected > 0 {
        warn!(rejected = totals.rejected, "Some events were rejected");
    }

    let snapshot = processor.snapshot()?;
    let details = processor.track_details()?;
    report::print_report(&snapshot, &details, &stats);

    let document = ExportDocument {
        run_id,
        generated_at: Utc::now(),
        stats,
        snapshot: &snapshot,
        tracks: &details,
    };
    report::export(&config.export_path, &document)?;
    info!(path = %config.export_path.display(), "Snapshot exported");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = SimulatorConfig::from_env()?;
    run(config).await
}
