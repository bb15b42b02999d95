//! Async ingestion service
//!
//! A single tokio task drains a bounded queue into a [`StreamProcessor`].
//! Producers hold cloneable [`IngestHandle`]s; each handle's submissions are
//! applied in the order they were sent, while submissions from different
//! handles interleave in queue order.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::errors::{Error, Result};
use crate::models::{BatchResult, PlayEvent};
use crate::processor::StreamProcessor;

#[derive(Debug)]
enum Command {
    Event(PlayEvent),
    Batch(Vec<PlayEvent>),
    Flush(oneshot::Sender<BatchResult>),
}

/// Producer side of the ingestion queue
#[derive(Debug, Clone)]
pub struct IngestHandle {
    tx: mpsc::Sender<Command>,
}

impl IngestHandle {
    /// Queue one event, waiting while the queue is full
    pub async fn send(&self, event: PlayEvent) -> Result<()> {
        self.tx
            .send(Command::Event(event))
            .await
            .map_err(|_| Error::ChannelClosed)
    }

    /// Queue a batch; its events are applied back to back
    pub async fn send_batch(&self, events: Vec<PlayEvent>) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        self.tx
            .send(Command::Batch(events))
            .await
            .map_err(|_| Error::ChannelClosed)
    }

    /// Wait until everything queued before this call has been applied.
    ///
    /// Returns the running totals at that point.
    pub async fn flush(&self) -> Result<BatchResult> {
        let (reply, done) = oneshot::channel();
        self.tx
            .send(Command::Flush(reply))
            .await
            .map_err(|_| Error::ChannelClosed)?;
        done.await.map_err(|_| Error::ChannelClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Single-writer ingestion loop
pub struct IngestService;

impl IngestService {
    /// Start the ingestion task.
    ///
    /// The task ends once every handle is dropped and returns the totals. A
    /// non-recoverable processor error stops it early and is returned instead.
    pub fn spawn(processor: Arc<StreamProcessor>) -> (IngestHandle, JoinHandle<Result<BatchResult>>) {
        let capacity = processor.config().queue_capacity;
        let (tx, rx) = mpsc::channel(capacity);
        let task = tokio::spawn(run(processor, rx));
        (IngestHandle { tx }, task)
    }
}

async fn run(processor: Arc<StreamProcessor>, mut rx: mpsc::Receiver<Command>) -> Result<BatchResult> {
    info!(capacity = processor.config().queue_capacity, "Ingestion service started");
    let mut totals = BatchResult::default();

    while let Some(command) = rx.recv().await {
        let result = match command {
            Command::Event(event) => processor.ingest_batch(std::iter::once(&event)),
            Command::Batch(events) => processor.ingest_batch(&events),
            Command::Flush(reply) => {
                // The requester may have gone away; nothing to do then
                let _ = reply.send(totals);
                continue;
            }
        };

        match result {
            Ok(batch) => totals.merge(batch),
            Err(e) => {
                error!(error = %e, "Ingestion service stopped on error");
                rx.close();
                return Err(e);
            }
        }
    }

    info!(
        accepted = totals.accepted,
        rejected = totals.rejected,
        "Ingestion service stopped"
    );
    Ok(totals)
}
