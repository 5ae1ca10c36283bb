//! Sink metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use contracts::MetricsSnapshot;

/// Metrics for a single sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Current queue length
    queue_len: AtomicUsize,
    /// Records accepted by `write`
    accepted_count: AtomicU64,
    /// Total successful adapter writes
    write_count: AtomicU64,
    /// Logical rows written
    rows_written: AtomicU64,
    /// Total adapter write failures
    failure_count: AtomicU64,
    /// Records rejected or discarded
    dropped_count: AtomicU64,
    /// Destinations closed
    rotation_count: AtomicU64,
    /// Destinations removed by retention
    removed_count: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn accepted_count(&self) -> u64 {
        self.accepted_count.load(Ordering::Relaxed)
    }

    pub fn inc_accepted_count(&self) {
        self.accepted_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    /// Count one successful write of `rows` logical rows
    pub fn record_write(&self, rows: u64) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
        self.rows_written.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    pub fn add_dropped_count(&self, count: u64) {
        self.dropped_count.fetch_add(count, Ordering::Relaxed);
    }

    pub fn rotation_count(&self) -> u64 {
        self.rotation_count.load(Ordering::Relaxed)
    }

    pub fn inc_rotation_count(&self) {
        self.rotation_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn removed_count(&self) -> u64 {
        self.removed_count.load(Ordering::Relaxed)
    }

    pub fn add_removed_count(&self, count: u64) {
        self.removed_count.fetch_add(count, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            accepted_count: self.accepted_count(),
            write_count: self.write_count(),
            rows_written: self.rows_written(),
            failure_count: self.failure_count(),
            dropped_count: self.dropped_count(),
            rotation_count: self.rotation_count(),
            removed_count: self.removed_count(),
        }
    }
}
