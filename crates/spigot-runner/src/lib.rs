//! Spigot Runner - Drives extraction runs
//!
//! Ties discovery, extraction, and state persistence together: the
//! coordinator walks the selected streams, checkpoints progress, and
//! isolates per-stream failures.

pub mod checkpoint;
pub mod coordinator;

pub use checkpoint::{CheckpointPolicy, CheckpointTracker};
pub use coordinator::{CancelFlag, Coordinator};
