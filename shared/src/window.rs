//! Tumbling-window throughput accumulator
//!
//! Windows are aligned to multiples of the window length since the Unix
//! epoch. An event at or past the end of the active window closes it and
//! opens the window containing the event, which starts counting at 1.
//!
//! Throughput is `events_in_window / window_secs`: a fixed denominator, so a
//! partially filled window reports proportionally less.
//!
//! All date arithmetic is checked. [`WindowAccumulator::check`] tells the
//! caller up front whether a timestamp has a representable window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{Error, Result};

/// Longest supported window (one year)
pub const MAX_WINDOW_SECS: u64 = 365 * 24 * 60 * 60;

/// A window that has been rolled past
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedWindow {
    pub start: DateTime<Utc>,
    pub count: u64,
}

#[derive(Debug, Clone)]
pub struct WindowAccumulator {
    duration: Duration,
    window_start: Option<DateTime<Utc>>,
    events_in_window: u64,
    last_closed: Option<ClosedWindow>,
    windows_closed: u64,
}

impl WindowAccumulator {
    pub fn new(window_secs: u64) -> Self {
        assert!(
            (1..=MAX_WINDOW_SECS).contains(&window_secs),
            "window_secs must be in 1..={}",
            MAX_WINDOW_SECS
        );
        Self {
            duration: Duration::seconds(window_secs as i64),
            window_start: None,
            events_in_window: 0,
            last_closed: None,
            windows_closed: 0,
        }
    }

    /// Reject a timestamp whose window would end past the last representable
    /// instant.
    pub fn check(&self, timestamp: DateTime<Utc>) -> Result<()> {
        match self.align(timestamp).and_then(|start| self.window_end(start)) {
            Some(_) => Ok(()),
            None => Err(Error::InvalidEvent(format!(
                "timestamp {} has no representable {}s window",
                timestamp,
                self.window_secs()
            ))),
        }
    }

    /// Account for one event and return the in-window count after the update.
    ///
    /// Events earlier than the active window are counted in it rather than
    /// reopening a past window.
    pub fn observe(&mut self, timestamp: DateTime<Utc>) -> u64 {
        match self.window_start {
            None => {
                self.window_start = Some(self.align(timestamp).unwrap_or(timestamp));
                self.events_in_window = 1;
            }
            Some(start) if self.window_end(start).is_some_and(|end| timestamp >= end) => {
                let next = self.align(timestamp).unwrap_or(timestamp);
                debug!(
                    window_start = %start,
                    next_start = %next,
                    events = self.events_in_window,
                    "Window rolled"
                );
                self.last_closed = Some(ClosedWindow {
                    start,
                    count: self.events_in_window,
                });
                self.windows_closed += 1;
                self.window_start = Some(next);
                self.events_in_window = 1;
            }
            Some(_) => {
                self.events_in_window += 1;
            }
        }
        self.events_in_window
    }

    /// Events per second in the active window
    pub fn throughput(&self) -> f64 {
        self.events_in_window as f64 / self.duration.num_seconds() as f64
    }

    pub fn window_start(&self) -> Option<DateTime<Utc>> {
        self.window_start
    }

    pub fn events_in_window(&self) -> u64 {
        self.events_in_window
    }

    pub fn window_secs(&self) -> u64 {
        self.duration.num_seconds() as u64
    }

    pub fn last_closed(&self) -> Option<ClosedWindow> {
        self.last_closed
    }

    pub fn windows_closed(&self) -> u64 {
        self.windows_closed
    }

    pub fn reset(&mut self) {
        self.window_start = None;
        self.events_in_window = 0;
        self.last_closed = None;
        self.windows_closed = 0;
    }

    // Start of the window containing `timestamp`
    fn align(&self, timestamp: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let width = self.duration.num_milliseconds();
        let aligned = timestamp.timestamp_millis().div_euclid(width).checked_mul(width)?;
        DateTime::from_timestamp_millis(aligned)
    }

    // Exclusive end of the window starting at `start`
    fn window_end(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        start.checked_add_signed(self.duration)
    }
}
