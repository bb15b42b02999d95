//! Integration tests for queued ingestion
//!
//! Run with: cargo test --package playstream-integration-tests

use std::sync::Arc;

use playstream_core::{BatchResult, Error, IngestService};
use playstream_integration_tests::{
    fixtures::{ab_catalog, numbered_catalog, play, processor, unknown_track_id},
    Scenario,
};
use pretty_assertions::assert_eq;

// ============================================================================
// Producer Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_producers_match_scenario() {
    let catalog = numbered_catalog(6);
    let processor = Arc::new(processor(Arc::clone(&catalog)));
    let (handle, task) = IngestService::spawn(Arc::clone(&processor));

    let scenarios: Vec<Scenario> = (0..4)
        .map(|_| Scenario::round_robin(&catalog, 500, 75))
        .collect();

    let mut producers = Vec::new();
    for scenario in &scenarios {
        let handle = handle.clone();
        let events = scenario.events().to_vec();
        producers.push(tokio::spawn(async move {
            for chunk in events.chunks(50) {
                handle.send_batch(chunk.to_vec()).await?;
            }
            Ok::<(), Error>(())
        }));
    }
    for producer in producers {
        producer
            .await
            .expect("Producer panicked")
            .expect("Failed to send");
    }
    drop(handle);

    let totals = task
        .await
        .expect("Service panicked")
        .expect("Service failed");
    assert_eq!(totals, BatchResult { accepted: 2_000, rejected: 0 });

    let snapshot = processor.snapshot().expect("Failed to snapshot");
    assert_eq!(snapshot.total_events, 2_000);
    // Every producer replays the same users
    assert_eq!(snapshot.distinct_listeners, scenarios[0].expected_listeners());

    for ranked in &snapshot.ranking {
        let per_producer = scenarios[0].expected_plays()[&ranked.track_id];
        assert_eq!(ranked.play_count, per_producer * 4);
    }
}

#[tokio::test]
async fn test_flush_reports_rejections() {
    let processor = Arc::new(processor(ab_catalog()));
    let (handle, task) = IngestService::spawn(Arc::clone(&processor));

    handle
        .send(play("A", "u1", 0.5, "web", 0))
        .await
        .expect("Failed to send");
    handle
        .send(play(&unknown_track_id(), "u1", 0.5, "web", 1))
        .await
        .expect("Failed to send");
    handle
        .send(play("B", "u1", 2.0, "web", 2))
        .await
        .expect("Failed to send");

    let totals = handle.flush().await.expect("Failed to flush");
    assert_eq!(totals, BatchResult { accepted: 1, rejected: 2 });

    let stats = processor.stats().expect("Failed to get stats");
    assert_eq!(stats.rejected_unknown_track, 1);
    assert_eq!(stats.rejected_invalid, 1);

    drop(handle);
    assert_eq!(task.await.unwrap().unwrap(), totals);
}

// ============================================================================
// Shutdown Tests
// ============================================================================

#[tokio::test]
async fn test_service_stops_when_processor_finalized() {
    let processor = Arc::new(processor(ab_catalog()));
    let (handle, task) = IngestService::spawn(Arc::clone(&processor));

    handle
        .send(play("A", "u1", 0.5, "web", 0))
        .await
        .expect("Failed to send");
    handle.flush().await.expect("Failed to flush");

    processor.finalize().expect("Failed to finalize");
    // Accepted by the queue, refused by the processor
    let _ = handle.send(play("A", "u2", 0.5, "web", 1)).await;

    let result = task.await.expect("Service panicked");
    assert!(matches!(result, Err(Error::Finalized)));
    assert!(handle.is_closed());
    assert!(matches!(handle.flush().await, Err(Error::ChannelClosed)));
    assert_eq!(processor.snapshot().unwrap().total_events, 1);
}
