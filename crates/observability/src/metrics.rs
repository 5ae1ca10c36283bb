//! Sink metrics publishing
//!
//! Mirrors `MetricsSnapshot` counters into the global `metrics` recorder and
//! aggregates per-destination statistics from rotation events.

use std::collections::HashMap;

use contracts::MetricsSnapshot;
use metrics::{counter, gauge, histogram};

/// Publish a sink snapshot
///
/// Counters are cumulative in the snapshot, so they are set absolutely and
/// the call can be repeated at any interval.
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_sink_snapshot;
///
/// record_sink_snapshot(sink.name(), &sink.snapshot());
/// ```
pub fn record_sink_snapshot(sink_name: &str, snapshot: &MetricsSnapshot) {
    let sink = sink_name.to_string();

    gauge!("rotsink_queue_len", "sink" => sink.clone()).set(snapshot.queue_len as f64);

    counter!("rotsink_records_accepted_total", "sink" => sink.clone())
        .absolute(snapshot.accepted_count);
    counter!("rotsink_writes_total", "sink" => sink.clone()).absolute(snapshot.write_count);
    counter!("rotsink_rows_written_total", "sink" => sink.clone())
        .absolute(snapshot.rows_written);
    counter!("rotsink_write_failures_total", "sink" => sink.clone())
        .absolute(snapshot.failure_count);
    counter!("rotsink_records_dropped_total", "sink" => sink.clone())
        .absolute(snapshot.dropped_count);
    counter!("rotsink_rotations_total", "sink" => sink.clone())
        .absolute(snapshot.rotation_count);
    counter!("rotsink_destinations_removed_total", "sink" => sink)
        .absolute(snapshot.removed_count);
}

/// Record one closed destination
pub fn record_rotation(sink_name: &str, rows: u64) {
    counter!("rotsink_destinations_closed_total", "sink" => sink_name.to_string()).increment(1);
    histogram!("rotsink_destination_rows", "sink" => sink_name.to_string()).record(rows as f64);
    gauge!("rotsink_last_destination_rows", "sink" => sink_name.to_string()).set(rows as f64);
}

/// Record the time spent closing a sink
pub fn record_close_latency_ms(sink_name: &str, latency_ms: f64) {
    histogram!("rotsink_close_latency_ms", "sink" => sink_name.to_string()).record(latency_ms);
}

/// Rotation statistics aggregator
///
/// Aggregates in memory for the end-of-run summary.
#[derive(Debug, Clone, Default)]
pub struct RotationStats {
    /// Destinations closed
    pub destinations: u64,

    /// Rows in closed destinations
    pub total_rows: u64,

    /// Rows per destination
    pub row_stats: RunningStats,

    /// Destinations per date path (time rotation only)
    pub per_date_path: HashMap<String, u64>,
}

impl RotationStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one closed destination
    pub fn update(&mut self, rows: u64, date_path: Option<&str>) {
        self.destinations += 1;
        self.total_rows += rows;
        self.row_stats.push(rows as f64);
        if let Some(date_path) = date_path {
            *self.per_date_path.entry(date_path.to_string()).or_insert(0) += 1;
        }
    }

    pub fn summary(&self, snapshot: &MetricsSnapshot) -> MetricsSummary {
        MetricsSummary {
            snapshot: *snapshot,
            destinations: self.destinations,
            rows_per_destination: StatsSummary::from(&self.row_stats),
            drop_rate: if snapshot.accepted_count + snapshot.dropped_count > 0 {
                snapshot.dropped_count as f64
                    / (snapshot.accepted_count + snapshot.dropped_count) as f64
                    * 100.0
            } else {
                0.0
            },
            per_date_path: self.per_date_path.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// End-of-run summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub snapshot: MetricsSnapshot,
    pub destinations: u64,
    pub rows_per_destination: StatsSummary,
    pub drop_rate: f64,
    pub per_date_path: HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = &self.snapshot;
        writeln!(f, "=== Sink Metrics Summary ===")?;
        writeln!(f, "Records accepted: {}", s.accepted_count)?;
        writeln!(f, "Rows written: {} ({} writes)", s.rows_written, s.write_count)?;
        writeln!(f, "Write failures: {}", s.failure_count)?;
        writeln!(f, "Dropped records: {} ({:.2}%)", s.dropped_count, self.drop_rate)?;
        writeln!(f, "Destinations closed: {}", self.destinations)?;
        writeln!(f, "Destinations removed: {}", s.removed_count)?;
        writeln!(f, "Rows per destination: {}", self.rows_per_destination)?;

        if !self.per_date_path.is_empty() {
            let mut paths: Vec<_> = self.per_date_path.iter().collect();
            paths.sort();
            writeln!(f, "Destinations per date path:")?;
            for (path, count) in paths {
                writeln!(f, "  {}: {}", path, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.0}, max={:.0}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(value);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_rotation_stats_update() {
        let mut stats = RotationStats::new();
        stats.update(100, Some("202505301420"));
        stats.update(40, Some("202505301420"));
        stats.update(7, None);

        assert_eq!(stats.destinations, 3);
        assert_eq!(stats.total_rows, 147);
        assert_eq!(stats.per_date_path.get("202505301420"), Some(&2));
        assert_eq!(stats.row_stats.count(), 3);
    }

    #[test]
    fn test_summary_display() {
        let mut stats = RotationStats::new();
        stats.update(10, None);
        let snapshot = MetricsSnapshot {
            accepted_count: 95,
            rows_written: 95,
            write_count: 95,
            dropped_count: 5,
            rotation_count: 1,
            ..Default::default()
        };

        let output = stats.summary(&snapshot).to_string();
        assert!(output.contains("Rows written: 95"));
        assert!(output.contains("5.00%"));
        assert!(output.contains("Destinations closed: 1"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_sink_snapshot("runtime", &MetricsSnapshot::default());
        record_rotation("runtime", 3);
        record_close_latency_ms("runtime", 1.5);
    }
}
