//! Spigot State - Extraction state and catalog persistence
//!
//! Shapes for per-stream extraction state and run summaries, plus the
//! file-backed store that persists them between runs.

pub mod schema;
pub mod store;

pub use schema::{RunStatus, RunSummary, StateDocument, StreamState, StreamStatus};
pub use store::{load_catalog, save_catalog, RunStore};
