//! Checkpoint cadence: flush state after N records or M seconds.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct CheckpointPolicy {
    /// Flush after this many records since the last checkpoint.
    pub max_records: u64,
    /// Flush once this much time has passed since the last checkpoint.
    pub max_interval: Duration,
}

impl Default for CheckpointPolicy {
    fn default() -> Self {
        Self {
            max_records: 1000,
            max_interval: Duration::from_secs(30),
        }
    }
}

/// Tracks one stream's progress against a checkpoint policy.
pub struct CheckpointTracker {
    policy: CheckpointPolicy,
    records_since_flush: u64,
    last_flush: Instant,
}

impl CheckpointTracker {
    pub fn new(policy: CheckpointPolicy) -> Self {
        Self {
            policy,
            records_since_flush: 0,
            last_flush: Instant::now(),
        }
    }

    /// Count one record; returns true when a checkpoint is due.
    pub fn observe(&mut self) -> bool {
        self.records_since_flush += 1;
        self.records_since_flush >= self.policy.max_records
            || self.last_flush.elapsed() >= self.policy.max_interval
    }

    /// Start a new checkpoint window.
    pub fn reset(&mut self) {
        self.records_since_flush = 0;
        self.last_flush = Instant::now();
    }
}
