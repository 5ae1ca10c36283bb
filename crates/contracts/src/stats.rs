//! Sink statistics contracts

use serde::Serialize;

/// Point-in-time view of a sink's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Records waiting in the queue
    pub queue_len: usize,
    /// Records accepted by `write`
    pub accepted_count: u64,
    /// Records handed to the adapter successfully
    pub write_count: u64,
    /// Logical rows reported by the adapter
    pub rows_written: u64,
    /// Records the adapter failed to persist
    pub failure_count: u64,
    /// Records rejected or discarded by the engine
    pub dropped_count: u64,
    /// Destinations closed by rotation or shutdown
    pub rotation_count: u64,
    /// Destinations removed by retention
    pub removed_count: u64,
}
