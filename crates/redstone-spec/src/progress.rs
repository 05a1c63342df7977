//! Progress events and the streaming line protocol.
//!
//! Events travel as `data: <json>\n\n` lines. Producers report through a
//! [`ProgressReporter`]; consumers reassemble lines from arbitrary chunks with
//! [`ProgressLineParser`].

use crate::layout::Dimensions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix of every event line.
pub const DATA_PREFIX: &str = "data:";

/// Statistics of a finished generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub notes: usize,
    pub redstone_length: u32,
    /// Playback length in seconds.
    pub duration: f64,
    /// Size of the primary (litematic) container in bytes.
    pub file_size: usize,
    /// Note budget the long-audio policy imposed, if it applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_max_notes: Option<usize>,
}

/// Description of the generated machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub name: String,
    pub dimensions: Dimensions,
    pub note_blocks: usize,
    pub redstone_dust: usize,
    pub repeaters: usize,
}

/// One event on the progress stream.
///
/// Untagged; variants are tried in declaration order, so the terminal
/// shapes come first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgressEvent {
    /// Terminal success.
    Complete {
        complete: bool,
        success: bool,
        stats: GenerationStats,
        projection: Projection,
        file_id: String,
        #[serde(default)]
        files: Vec<String>,
    },
    /// Terminal failure.
    Failed {
        complete: bool,
        success: bool,
        error: String,
    },
    /// Intermediate step.
    Step { progress: u8, message: String },
}

impl ProgressEvent {
    pub fn step(progress: u8, message: impl Into<String>) -> Self {
        ProgressEvent::Step {
            progress: progress.min(100),
            message: message.into(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        ProgressEvent::Failed {
            complete: true,
            success: false,
            error: error.into(),
        }
    }

    pub fn complete(
        stats: GenerationStats,
        projection: Projection,
        file_id: impl Into<String>,
        files: Vec<String>,
    ) -> Self {
        ProgressEvent::Complete {
            complete: true,
            success: true,
            stats,
            projection,
            file_id: file_id.into(),
            files,
        }
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProgressEvent::Step { .. })
    }

    /// Encodes the event as one wire frame, `data: <json>\n\n`.
    pub fn to_line(&self) -> String {
        // Serializing these plain structs cannot fail.
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        format!("{} {}\n\n", DATA_PREFIX, json)
    }
}

/// The consumer of progress events has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("progress consumer disconnected")]
pub struct Cancelled;

/// Receives progress events from the pipeline.
///
/// Delivery is best effort. `Err(Cancelled)` tells the pipeline to stop at
/// its next checkpoint.
pub trait ProgressReporter {
    fn report(&self, event: ProgressEvent) -> Result<(), Cancelled>;

    /// Reports an intermediate step.
    fn step(&self, progress: u8, message: &str) -> Result<(), Cancelled> {
        self.report(ProgressEvent::step(progress, message))
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) -> Result<(), Cancelled> {
        Ok(())
    }
}

impl<R: ProgressReporter + ?Sized> ProgressReporter for &R {
    fn report(&self, event: ProgressEvent) -> Result<(), Cancelled> {
        (**self).report(event)
    }
}

/// A line that could not be decoded.
#[derive(Debug, Error)]
#[error("malformed progress line '{line}': {source}")]
pub struct ProgressParseError {
    pub line: String,
    #[source]
    pub source: serde_json::Error,
}

/// Incremental parser for the progress stream.
///
/// Buffers bytes across chunks, splits on `\n`, decodes each complete
/// `data:` line and keeps the trailing partial line. Each byte is scanned
/// once regardless of how the stream is chunked.
#[derive(Debug, Default)]
pub struct ProgressLineParser {
    buffer: Vec<u8>,
    scanned: usize,
}

impl ProgressLineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns the events completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<ProgressEvent, ProgressParseError>> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut line_start = 0;
        while let Some(offset) = self.buffer[self.scanned..].iter().position(|&b| b == b'\n') {
            let end = self.scanned + offset;
            if let Some(event) = parse_line(&self.buffer[line_start..end]) {
                events.push(event);
            }
            line_start = end + 1;
            self.scanned = line_start;
        }

        self.buffer.drain(..line_start);
        self.scanned = self.buffer.len();
        events
    }

    /// Bytes held for an incomplete line.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Flushes a final line that lacked a trailing newline.
    pub fn finish(mut self) -> Option<Result<ProgressEvent, ProgressParseError>> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&rest)
    }
}

fn parse_line(raw: &[u8]) -> Option<Result<ProgressEvent, ProgressParseError>> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim();
    let payload = line.strip_prefix(DATA_PREFIX)?.trim();
    if payload.is_empty() {
        return None;
    }
    Some(
        serde_json::from_str(payload).map_err(|source| ProgressParseError {
            line: line.to_string(),
            source,
        }),
    )
}
