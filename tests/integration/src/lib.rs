//! PlayStream Integration Tests
//!
//! End-to-end scenarios against the public API of `playstream-core`:
//! - Synchronous ingestion through `StreamProcessor`
//! - Queued ingestion through `IngestService`
//!
//! Run with: cargo test --package playstream-integration-tests

pub mod fixtures;
pub mod scenario;

pub use fixtures::*;
pub use scenario::Scenario;
