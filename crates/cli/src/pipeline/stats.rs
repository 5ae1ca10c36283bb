//! Pipeline statistics.

use std::time::Duration;

use contracts::MetricsSnapshot;
use observability::RotationStats;
use serde::Serialize;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub sink_name: String,

    /// Lines read from the input
    pub lines_read: u64,

    /// Lines the sink refused (queue full or closed)
    pub lines_rejected: u64,

    /// Total duration of the run, close included
    pub duration: Duration,

    /// Final sink counters
    pub snapshot: MetricsSnapshot,

    /// Per-destination statistics collected by the rotation callback
    pub rotations: RotationStats,
}

/// JSON view of the run
#[derive(Debug, Serialize)]
pub struct PipelineReport<'a> {
    pub sink: &'a str,
    pub lines_read: u64,
    pub lines_rejected: u64,
    pub duration_secs: f64,
    pub records_per_sec: f64,
    pub metrics: &'a MetricsSnapshot,
}

impl PipelineStats {
    /// Rows written per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.snapshot.rows_written as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn report(&self) -> PipelineReport<'_> {
        PipelineReport {
            sink: &self.sink_name,
            lines_read: self.lines_read,
            lines_rejected: self.lines_rejected,
            duration_secs: self.duration.as_secs_f64(),
            records_per_sec: self.throughput(),
            metrics: &self.snapshot,
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Sink Statistics                         ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Sink: {}", self.sink_name);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Lines read: {}", self.lines_read);
        println!("   ├─ Lines rejected: {}", self.lines_rejected);
        println!("   └─ Throughput: {:.2} rows/s", self.throughput());

        println!("\n{}", self.rotations.summary(&self.snapshot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throughput() {
        let stats = PipelineStats {
            duration: Duration::from_secs(2),
            snapshot: MetricsSnapshot {
                rows_written: 500,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!((stats.throughput() - 250.0).abs() < 1e-9);
        assert_eq!(PipelineStats::default().throughput(), 0.0);
    }

    #[test]
    fn test_report_serializes() {
        let stats = PipelineStats {
            sink_name: "runtime".into(),
            lines_read: 3,
            ..Default::default()
        };
        let json = serde_json::to_value(stats.report()).unwrap();
        assert_eq!(json["sink"], "runtime");
        assert_eq!(json["lines_read"], 3);
        assert_eq!(json["metrics"]["rows_written"], 0);
    }
}
