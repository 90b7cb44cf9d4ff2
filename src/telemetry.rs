//! Pipeline telemetry events and sinks.
//!
//! Collection runs are long and resumable, so progress checkpoints are worth
//! recording even for a local tool. Events go to stderr as JSON lines and
//! are never transmitted anywhere.

use std::io;

use serde::{Deserialize, Serialize};

/// A structured telemetry event emitted during a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// A batch of scraped rows reached the dataset file.
    ScrapeCheckpoint {
        /// Rows written in this batch.
        rows_written: usize,
        /// Highest pull request number processed so far.
        last_number: u64,
    },
    /// A block of transcripts was rendered and saved.
    CommentsCheckpoint {
        /// Rows whose transcripts are now on disk.
        rows_completed: usize,
    },
    /// A block of rows was classified and saved.
    ClassificationCheckpoint {
        /// Rows whose categories are now on disk.
        rows_completed: usize,
    },
    /// The scraper rotated to a different access token.
    TokenRotated {
        /// Slot index of the token now in use.
        slot: usize,
    },
}

/// A sink that can record telemetry events.
pub trait TelemetrySink: Send + Sync {
    /// Records a telemetry event.
    fn record(&self, event: TelemetryEvent);
}

/// Telemetry sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn record(&self, _event: TelemetryEvent) {}
}

/// Records telemetry events to stderr as JSON lines (JSONL).
#[derive(Debug, Default)]
pub struct StderrJsonlTelemetrySink;

impl TelemetrySink for StderrJsonlTelemetrySink {
    fn record(&self, event: TelemetryEvent) {
        let Ok(serialised) = serde_json::to_string(&event) else {
            return;
        };

        let _ignored = writeln_stderr(&serialised);
    }
}

fn writeln_stderr(message: &str) -> io::Result<()> {
    use io::Write;

    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{message}")
}
