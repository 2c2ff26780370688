//! The state/catalog coordinator.
//!
//! Drives a run: for each selected stream, open a connection, extract
//! records, checkpoint state periodically, and close the connection.
//! One stream's failure never aborts the others or discards their
//! persisted progress; the run as a whole fails iff any stream failed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use uuid::Uuid;

use spigot_connectors::{KeyRange, SourceConnector};
use spigot_core::{Catalog, CatalogEntry, MessageSink, SourceError, TapMessage};
use spigot_state::{RunStore, RunSummary, StateDocument, StreamState};

use crate::checkpoint::{CheckpointPolicy, CheckpointTracker};

/// Cooperative cancellation flag, checked at least once per record and
/// at every checkpoint boundary. Cancelling closes open connections
/// before the run returns.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

enum StreamOutcome {
    Completed,
    Cancelled,
}

pub struct Coordinator {
    connector: Arc<dyn SourceConnector>,
    store: RunStore,
    policy: CheckpointPolicy,
    cancel: CancelFlag,
}

impl Coordinator {
    pub fn new(connector: Arc<dyn SourceConnector>, store: RunStore) -> Self {
        Self {
            connector,
            store,
            policy: CheckpointPolicy::default(),
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_policy(mut self, policy: CheckpointPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Handle for cancelling this coordinator's runs from another task.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Extract every selected stream of `catalog` sequentially, resuming
    /// from the bookmarks in `prior`.
    pub async fn run(
        &self,
        catalog: &Catalog,
        prior: &StateDocument,
        sink: &mut dyn MessageSink,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::new();
        self.store.init_run(&summary).context("initialize run")?;
        info!("Run {} started", summary.run_id);

        let mut live_state = prior.clone();
        let mut cancelled = false;

        for entry in catalog.selected() {
            if self.cancel.is_cancelled() {
                warn!(
                    "Run {} cancelled before stream '{}'",
                    summary.run_id,
                    entry.stream_id()
                );
                cancelled = true;
                break;
            }

            let mut state = StreamState::new(entry.stream_id());
            state.bookmark = prior.bookmark_for(&state.stream_id).cloned();

            let outcome = self
                .extract_stream(&summary.run_id, entry, &mut state, &mut live_state, sink)
                .await;

            let abort = match outcome {
                Ok(StreamOutcome::Completed) => {
                    state.complete();
                    info!(
                        "Stream '{}' completed ({} records)",
                        state.stream_id, state.records_extracted
                    );
                    None
                }
                Ok(StreamOutcome::Cancelled) => {
                    warn!("Stream '{}' cancelled mid-extraction", state.stream_id);
                    cancelled = true;
                    None
                }
                Err(e) => {
                    error!("Stream '{}' failed: {:#}", state.stream_id, e);
                    let lost_connection = matches!(
                        e.downcast_ref::<SourceError>(),
                        Some(SourceError::Connection { .. })
                    );
                    state.fail(format!("{:#}", e));
                    lost_connection.then_some(e)
                }
            };

            summary.upsert_stream(state);
            // Persist progress now so a later stream's failure cannot
            // discard it.
            self.store
                .update_summary(&summary)
                .context("persist run summary")?;
            self.store
                .write_state(&summary.run_id, &live_state)
                .context("persist state document")?;

            if let Some(e) = abort {
                summary.finish();
                self.store.update_summary(&summary)?;
                return Err(e).context("run aborted: source connection lost");
            }
            if cancelled {
                break;
            }
        }

        summary.finish();
        self.store
            .update_summary(&summary)
            .context("persist run summary")?;
        // State is already persisted; a broken sink at this point loses
        // nothing.
        if let Err(e) = sink.emit(&TapMessage::state(live_state.to_value())) {
            warn!("Could not emit final state message: {}", e);
        }
        info!("Run {} finished: {:?}", summary.run_id, summary.status);
        Ok(summary)
    }

    async fn extract_stream(
        &self,
        run_id: &Uuid,
        entry: &CatalogEntry,
        state: &mut StreamState,
        live_state: &mut StateDocument,
        sink: &mut dyn MessageSink,
    ) -> Result<StreamOutcome> {
        state.begin();
        sink.emit(&TapMessage::schema_for(entry))?;

        let bookmark_column = entry.key_properties.first().cloned();
        let range = bookmark_column
            .as_ref()
            .map(|column| KeyRange::bookmark(column.clone(), state.bookmark.clone()));
        state.partition = range.as_ref().and_then(|r| serde_json::to_value(r).ok());

        let mut stream = self.connector.open_stream(entry, range).await?;
        let mut tracker = CheckpointTracker::new(self.policy);

        while let Some(item) = stream.next().await {
            let record = item?;

            if let Some(column) = &bookmark_column {
                if let Some(value) = record.get(column) {
                    if !value.is_null() {
                        state.bookmark = Some(value.clone());
                    }
                }
            }

            sink.emit(&TapMessage::record(state.stream_id.clone(), record))?;
            state.records_extracted += 1;

            if self.cancel.is_cancelled() {
                // Close the connection before returning.
                drop(stream);
                self.flush_checkpoint(run_id, state, live_state, sink)?;
                return Ok(StreamOutcome::Cancelled);
            }

            if tracker.observe() {
                self.flush_checkpoint(run_id, state, live_state, sink)?;
                tracker.reset();
            }
        }

        self.flush_checkpoint(run_id, state, live_state, sink)?;
        Ok(StreamOutcome::Completed)
    }

    fn flush_checkpoint(
        &self,
        run_id: &Uuid,
        state: &mut StreamState,
        live_state: &mut StateDocument,
        sink: &mut dyn MessageSink,
    ) -> Result<()> {
        state.checkpoint(None);
        live_state.set(&state.stream_id, state.bookmark.clone());
        self.store
            .write_state(run_id, live_state)
            .context("persist state document")?;
        sink.emit(&TapMessage::state(live_state.to_value()))?;
        Ok(())
    }
}
