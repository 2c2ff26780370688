//! File-backed persistence for catalogs, run summaries, and stream state.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use spigot_core::Catalog;

use crate::schema::{RunSummary, StateDocument};

/// Store for run summaries and checkpointed state under a base directory.
pub struct RunStore {
    base_path: PathBuf,
}

impl RunStore {
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    /// Directory for one run.
    pub fn run_path(&self, run_id: &Uuid) -> PathBuf {
        self.base_path.join("runs").join(run_id.to_string())
    }

    /// Create the run directory and write the initial summary.
    pub fn init_run(&self, summary: &RunSummary) -> Result<PathBuf> {
        let run_path = self.run_path(&summary.run_id);
        fs::create_dir_all(&run_path)?;
        self.update_summary(summary)?;
        info!("Initialized run at {:?}", run_path);
        Ok(run_path)
    }

    pub fn update_summary(&self, summary: &RunSummary) -> Result<()> {
        let path = self.run_path(&summary.run_id).join("summary.json");
        fs::write(&path, serde_json::to_string_pretty(summary)?)?;
        Ok(())
    }

    pub fn load_summary(run_path: &Path) -> Result<RunSummary> {
        let content = fs::read_to_string(run_path.join("summary.json"))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Flush the bookmark document for a run. Called at checkpoint
    /// boundaries and at stream completion.
    pub fn write_state(&self, run_id: &Uuid, state: &StateDocument) -> Result<PathBuf> {
        let path = self.run_path(run_id).join("state.json");
        fs::write(&path, serde_json::to_string_pretty(state)?)?;
        Ok(path)
    }

    /// Load a bookmark document persisted by an earlier run.
    pub fn load_state(path: &Path) -> Result<StateDocument> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// The most recently modified run directory, if any.
    pub fn latest_run(&self) -> Result<Option<PathBuf>> {
        let runs_path = self.base_path.join("runs");
        if !runs_path.exists() {
            return Ok(None);
        }

        let mut entries: Vec<_> = fs::read_dir(&runs_path)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .collect();

        entries.sort_by(|a, b| {
            b.metadata()
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
                .cmp(
                    &a.metadata()
                        .and_then(|m| m.modified())
                        .unwrap_or(std::time::SystemTime::UNIX_EPOCH),
                )
        });

        Ok(entries.first().map(|e| e.path()))
    }
}

/// Write a catalog document to `path` as pretty JSON.
pub fn save_catalog(path: &Path, catalog: &Catalog) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(catalog)?)?;
    info!("Wrote catalog with {} stream(s) to {:?}", catalog.len(), path);
    Ok(())
}

/// Load a previously persisted catalog document verbatim.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{StreamState, StreamStatus};
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_run_store_creates_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("deep").join("state");
        let store = RunStore::new(&nested).unwrap();
        assert!(store.base_path.exists());
    }

    #[test]
    fn test_init_run_writes_summary() {
        let dir = tempdir().unwrap();
        let store = RunStore::new(dir.path()).unwrap();
        let summary = RunSummary::new();

        let run_path = store.init_run(&summary).unwrap();
        assert!(run_path.join("summary.json").exists());

        let loaded = RunStore::load_summary(&run_path).unwrap();
        assert_eq!(loaded.run_id, summary.run_id);
    }

    #[test]
    fn test_update_summary_round_trip() {
        let dir = tempdir().unwrap();
        let store = RunStore::new(dir.path()).unwrap();
        let mut summary = RunSummary::new();
        let run_path = store.init_run(&summary).unwrap();

        let mut stream = StreamState::new("main.main.t");
        stream.begin();
        stream.checkpoint(Some(json!(7)));
        summary.upsert_stream(stream);
        summary.finish();
        store.update_summary(&summary).unwrap();

        let loaded = RunStore::load_summary(&run_path).unwrap();
        assert_eq!(loaded.streams.len(), 1);
        assert_eq!(loaded.streams[0].status, StreamStatus::Checkpointed);
        assert_eq!(loaded.streams[0].bookmark, Some(json!(7)));
    }

    #[test]
    fn test_write_and_load_state() {
        let dir = tempdir().unwrap();
        let store = RunStore::new(dir.path()).unwrap();
        let summary = RunSummary::new();
        store.init_run(&summary).unwrap();

        let mut document = StateDocument::default();
        document.set("main.main.t", Some(json!(42)));
        let path = store.write_state(&summary.run_id, &document).unwrap();

        let loaded = RunStore::load_state(&path).unwrap();
        assert_eq!(loaded, document);
    }

    #[test]
    fn test_latest_run_empty() {
        let dir = tempdir().unwrap();
        let store = RunStore::new(dir.path()).unwrap();
        assert!(store.latest_run().unwrap().is_none());
    }

    #[test]
    fn test_latest_run_picks_newest() {
        let dir = tempdir().unwrap();
        let store = RunStore::new(dir.path()).unwrap();

        store.init_run(&RunSummary::new()).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(50));
        let second = RunSummary::new();
        let second_path = store.init_run(&second).unwrap();

        assert_eq!(store.latest_run().unwrap().unwrap(), second_path);
    }

    #[test]
    fn test_catalog_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let catalog = Catalog::default();
        save_catalog(&path, &catalog).unwrap();
        let loaded = load_catalog(&path).unwrap();
        assert_eq!(loaded, catalog);
    }

    #[test]
    fn test_load_state_missing_file_errors() {
        let result = RunStore::load_state(Path::new("/nonexistent/state.json"));
        assert!(result.is_err());
    }
}
