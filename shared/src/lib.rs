//! PlayStream Core Library
//!
//! Stream aggregation for track play events:
//! - Domain models and the enrichment catalog
//! - Per-track aggregates and ranking
//! - Tumbling-window throughput
//! - Distinct-listener estimation (exact or HyperLogLog)
//! - The stream processor and its async ingestion service
//! - Error types and configuration

pub mod models;
pub mod catalog;
pub mod aggregate;
pub mod cardinality;
pub mod window;
pub mod hashing;
pub mod processor;
pub mod service;
pub mod config;
pub mod errors;

pub use models::*;
pub use catalog::Catalog;
pub use aggregate::{AggregateRegistry, TrackAggregate};
pub use cardinality::{CardinalityEstimator, ExactEstimator, HyperLogLog};
pub use window::{ClosedWindow, WindowAccumulator, MAX_WINDOW_SECS};
pub use processor::StreamProcessor;
pub use service::{IngestHandle, IngestService};
pub use config::{EstimatorKind, ProcessorConfig};
pub use errors::{Error, Result};
