//! State document shapes: per-stream extraction state and run summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

/// Lifecycle of one stream within a run.
///
/// `Pending → Extracting → Checkpointed (loop) → Completed | Failed`.
/// `Failed` is terminal and isolated to the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    Pending,
    Extracting,
    Checkpointed,
    Completed,
    Failed,
}

impl StreamStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, StreamStatus::Completed | StreamStatus::Failed)
    }

    pub fn can_transition_to(self, next: StreamStatus) -> bool {
        use StreamStatus::*;
        matches!(
            (self, next),
            (Pending, Extracting)
                | (Extracting, Checkpointed)
                | (Extracting, Completed)
                | (Extracting, Failed)
                | (Checkpointed, Checkpointed)
                | (Checkpointed, Completed)
                | (Checkpointed, Failed)
        )
    }
}

/// Extraction state for one stream. Created per stream per run, updated
/// per batch, flushed at checkpoint boundaries and at completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamState {
    pub stream_id: String,
    pub status: StreamStatus,
    /// Last-seen key value, if the stream has a bookmark column.
    pub bookmark: Option<Value>,
    /// The partition predicate this extraction ran under, if any.
    #[serde(default)]
    pub partition: Option<Value>,
    pub records_extracted: u64,
    /// Underlying cause when the stream failed.
    pub error: Option<String>,
}

impl StreamState {
    pub fn new(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
            status: StreamStatus::Pending,
            bookmark: None,
            partition: None,
            records_extracted: 0,
            error: None,
        }
    }

    pub fn begin(&mut self) {
        self.status = StreamStatus::Extracting;
    }

    pub fn checkpoint(&mut self, bookmark: Option<Value>) {
        if bookmark.is_some() {
            self.bookmark = bookmark;
        }
        self.status = StreamStatus::Checkpointed;
    }

    pub fn complete(&mut self) {
        self.status = StreamStatus::Completed;
    }

    pub fn fail(&mut self, detail: impl Into<String>) {
        self.status = StreamStatus::Failed;
        self.error = Some(detail.into());
    }
}

/// Status of a whole extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// Aggregate outcome of a run: all stream states plus timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub streams: Vec<StreamState>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            completed_at: None,
            status: RunStatus::Running,
            streams: Vec::new(),
        }
    }

    /// Record a stream's state, replacing any previous entry for the
    /// same stream.
    pub fn upsert_stream(&mut self, state: StreamState) {
        if let Some(existing) = self
            .streams
            .iter_mut()
            .find(|s| s.stream_id == state.stream_id)
        {
            *existing = state;
        } else {
            self.streams.push(state);
        }
    }

    pub fn has_failures(&self) -> bool {
        self.streams
            .iter()
            .any(|s| s.status == StreamStatus::Failed)
    }

    /// Close the run. A run fails iff any stream ended `Failed`; other
    /// streams' progress is preserved either way.
    pub fn finish(&mut self) {
        self.completed_at = Some(Utc::now());
        self.status = if self.has_failures() {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        };
    }

    /// The externally persisted bookmark document for this run.
    pub fn state_document(&self) -> StateDocument {
        let mut document = StateDocument::default();
        for stream in &self.streams {
            document.set(&stream.stream_id, stream.bookmark.clone());
        }
        document
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// The `{ streamId, bookmarkValue }` document exchanged with the
/// external state store at checkpoint boundaries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDocument {
    #[serde(default)]
    pub bookmarks: Map<String, Value>,
}

impl StateDocument {
    pub fn bookmark_for(&self, stream_id: &str) -> Option<&Value> {
        self.bookmarks.get(stream_id)
    }

    pub fn set(&mut self, stream_id: &str, bookmark: Option<Value>) {
        if let Some(bookmark) = bookmark {
            self.bookmarks.insert(stream_id.to_string(), bookmark);
        }
    }

    pub fn to_value(&self) -> Value {
        json!({"bookmarks": self.bookmarks})
    }
}
