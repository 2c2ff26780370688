//! Tap messages: the NDJSON protocol surface consumed by downstream sinks.
//!
//! Three message kinds flow out of an extraction run: a SCHEMA message
//! per stream (before its records), one RECORD message per row, and
//! STATE messages at checkpoint boundaries carrying the bookmark
//! document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::CatalogEntry;
use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TapMessage {
    #[serde(rename = "SCHEMA")]
    Schema {
        stream: String,
        schema: Value,
        key_properties: Vec<String>,
    },
    #[serde(rename = "RECORD")]
    Record { stream: String, record: Record },
    #[serde(rename = "STATE")]
    State { value: Value },
}

impl TapMessage {
    /// The SCHEMA message for a catalog entry.
    pub fn schema_for(entry: &CatalogEntry) -> Self {
        TapMessage::Schema {
            stream: entry.stream_id(),
            schema: entry.json_schema(),
            key_properties: entry.key_properties.clone(),
        }
    }

    pub fn record(stream: impl Into<String>, record: Record) -> Self {
        TapMessage::Record {
            stream: stream.into(),
            record,
        }
    }

    pub fn state(value: Value) -> Self {
        TapMessage::State { value }
    }

    /// One NDJSON line, without the trailing newline.
    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Destination for tap messages. The concrete sink (stdout, a pipe, a
/// test buffer) is chosen by the caller; the engine only emits.
pub trait MessageSink {
    fn emit(&mut self, message: &TapMessage) -> std::io::Result<()>;
}

/// Sink that writes one JSON line per message to any writer.
pub struct WriterSink<W: std::io::Write> {
    writer: W,
}

impl<W: std::io::Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: std::io::Write> MessageSink for WriterSink<W> {
    fn emit(&mut self, message: &TapMessage) -> std::io::Result<()> {
        let line = message
            .to_line()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{}", line)
    }
}
