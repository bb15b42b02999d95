//! Leaderboard rendering and JSON export

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::{DateTime, Utc};
use playstream_core::{ProcessorStats, Result, Snapshot, TrackDetail};
use serde::Serialize;
use uuid::Uuid;

const BAR_WIDTH: usize = 30;

/// Document written by `export`
#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub stats: ProcessorStats,
    pub snapshot: &'a Snapshot,
    pub tracks: &'a [TrackDetail],
}

fn bar(value: u64, max: u64) -> String {
    let filled = if max == 0 {
        0
    } else {
        ((value as f64 / max as f64) * BAR_WIDTH as f64).round() as usize
    };
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled.min(BAR_WIDTH)))
}

pub fn print_report(snapshot: &Snapshot, details: &[TrackDetail], stats: &ProcessorStats) {
    println!("\n{}", "-".repeat(72));
    println!("  PlayStream analytics report");
    println!("{}", "-".repeat(72));

    println!("\nPipeline");
    println!("  Events processed  : {}", snapshot.total_events);
    println!("  Events rejected   : {}", stats.rejected());
    println!("  Tracks streamed   : {}", snapshot.distinct_tracks);
    println!("  Distinct listeners: {}", snapshot.distinct_listeners);
    println!("  Windows closed    : {}", stats.windows_closed);
    println!("  Throughput        : {:.2} events/sec", snapshot.window_throughput);

    println!("\nLeaderboard");
    let max = snapshot.ranking.first().map(|r| r.play_count).unwrap_or(0);
    for (i, (ranked, detail)) in snapshot.ranking.iter().zip(details).enumerate() {
        println!(
            "  {:>2}. {:<26} {} {:>5} plays  complete {:5.1}%  top {}",
            i + 1,
            detail.title,
            bar(ranked.play_count, max),
            ranked.play_count,
            ranked.completion_pct,
            ranked.top_source
        );
    }

    if let Some(top) = details.first() {
        println!("\nTop track: {}", top.title);
        println!(
            "  Avg listen time   : {:.1}s / {}s",
            top.avg_listen_secs, top.duration_secs
        );
        println!("  Unique listeners  : {}", top.unique_listeners);
        println!("  Completion rate   : {:.1}%", top.completion_pct);
        println!("  Completed plays   : {:.1}%", top.completed_pct);
        for (source, count) in &top.source_counts {
            println!("  {:<18}: {}", source, count);
        }
    }

    println!("\n{}\n", "-".repeat(72));
}

pub fn export(path: &Path, document: &ExportDocument<'_>) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, document)?;
    Ok(())
}
