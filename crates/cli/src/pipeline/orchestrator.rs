//! Pipeline orchestrator - feeds input lines into a rotating sink.
//!
//! ```text
//! [stdin | file] → reader thread → LineSink::write_line → writer threads
//!                                        ↑
//!                     tokio: metrics ticker, timeout, shutdown signal
//! ```
//!
//! The reader runs on a plain thread so a blocked stdin read never holds up
//! runtime shutdown. Closing the sink from the async side makes the reader's
//! next write fail, which ends it.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{SinkBlueprint, SinkError};
use sink_engine::{OnRollCallback, RollSnapshot};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use observability::{record_close_latency_ms, record_rotation, record_sink_snapshot, RotationStats};

use super::{build_line_sink, LineSink, PipelineStats};
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The sink blueprint
    pub blueprint: SinkBlueprint,

    /// Input file (None = stdin)
    pub input: Option<PathBuf>,

    /// Maximum number of records to feed (None = unlimited)
    pub max_records: Option<u64>,

    /// Feeding timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Publish sink metrics at this interval when a recorder is installed
    pub metrics_interval: Option<Duration>,
}

/// Counters shared with the reader thread
#[derive(Debug, Default)]
struct FeedCounters {
    lines_read: AtomicU64,
    lines_rejected: AtomicU64,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
    sink: Arc<dyn LineSink>,
    stop: Arc<AtomicBool>,
    counters: Arc<FeedCounters>,
    rotations: Arc<Mutex<RotationStats>>,
    started: Instant,
}

impl Pipeline {
    /// Build the sink; nothing is read until [`Pipeline::run`]
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let rotations = Arc::new(Mutex::new(RotationStats::new()));
        let on_roll = rotation_recorder(&config.blueprint.sink.name, Arc::clone(&rotations));

        let sink = build_line_sink(&config.blueprint, Some(on_roll))
            .map_err(CliError::from)
            .context("Failed to build sink")?;

        info!(
            sink = %sink.name(),
            adapter = config.blueprint.adapter.kind(),
            "Sink ready"
        );

        Ok(Self {
            config,
            sink,
            stop: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(FeedCounters::default()),
            rotations,
            started: Instant::now(),
        })
    }

    /// Feed the input until it ends, the record limit or the timeout
    pub async fn run(&self) -> Result<()> {
        let reader = self.open_input()?;
        let (done_tx, mut done_rx) = oneshot::channel();

        let sink = Arc::clone(&self.sink);
        let stop = Arc::clone(&self.stop);
        let counters = Arc::clone(&self.counters);
        let max_records = self.config.max_records;
        std::thread::Builder::new()
            .name("rotsink-reader".to_string())
            .spawn(move || {
                let result = feed(reader, sink.as_ref(), &stop, &counters, max_records);
                let _ = done_tx.send(result);
            })
            .context("Failed to spawn reader thread")?;

        let deadline = self.config.timeout.map(|t| tokio::time::Instant::now() + t);
        let mut ticker = tokio::time::interval(
            self.config
                .metrics_interval
                .unwrap_or(Duration::from_secs(3600)),
        );

        info!(max_records = ?max_records, "Pipeline running");

        let result = loop {
            tokio::select! {
                result = &mut done_rx => {
                    break result.context("Reader thread exited without reporting")?;
                }
                _ = ticker.tick(), if self.config.metrics_interval.is_some() => {
                    record_sink_snapshot(self.sink.name(), &self.sink.snapshot());
                }
                _ = sleep_until(deadline) => {
                    warn!(timeout_secs = ?self.config.timeout.map(|t| t.as_secs()), "Pipeline timed out");
                    self.stop.store(true, Ordering::Release);
                    break Ok(());
                }
            }
        };

        result.map_err(anyhow::Error::from)
    }

    /// Ask the reader to stop at the next line
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Close the sink (drains the queue) and collect statistics
    pub async fn finish(&self) -> Result<PipelineStats> {
        self.stop();
        let sink = Arc::clone(&self.sink);
        let close_started = Instant::now();
        let closed = tokio::task::spawn_blocking(move || sink.close())
            .await
            .map_err(|e| CliError::shutdown(e.to_string()))?;
        record_close_latency_ms(self.sink.name(), close_started.elapsed().as_secs_f64() * 1000.0);

        let snapshot = self.sink.snapshot();
        record_sink_snapshot(self.sink.name(), &snapshot);

        closed.map_err(CliError::from).context("Sink closed with error")?;

        let rotations = self
            .rotations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        Ok(PipelineStats {
            sink_name: self.sink.name().to_string(),
            lines_read: self.counters.lines_read.load(Ordering::Acquire),
            lines_rejected: self.counters.lines_rejected.load(Ordering::Acquire),
            duration: self.started.elapsed(),
            snapshot,
            rotations,
        })
    }

    fn open_input(&self) -> Result<Box<dyn BufRead + Send>> {
        match &self.config.input {
            Some(path) => {
                let file = File::open(path)
                    .map_err(|e| CliError::input(path.display().to_string(), e))?;
                info!(input = %path.display(), "Reading records from file");
                Ok(Box::new(BufReader::new(file)))
            }
            None => {
                info!("Reading records from stdin");
                Ok(Box::new(BufReader::new(io::stdin())))
            }
        }
    }
}

/// Rotation callback: publish metrics and aggregate per-destination stats
fn rotation_recorder(sink_name: &str, rotations: Arc<Mutex<RotationStats>>) -> OnRollCallback {
    let sink_name = sink_name.to_string();
    Arc::new(move |path: &std::path::Path, snapshot: &RollSnapshot| {
        record_rotation(&sink_name, snapshot.rows);
        let date_path = snapshot.date_path();
        debug!(
            sink = %sink_name,
            path = %path.display(),
            rows = snapshot.rows,
            date_path = ?date_path,
            "Destination rolled"
        );
        rotations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .update(snapshot.rows, date_path.as_deref());
    })
}

async fn sleep_until(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Reader loop; runs on its own thread
fn feed(
    reader: Box<dyn BufRead + Send>,
    sink: &dyn LineSink,
    stop: &AtomicBool,
    counters: &FeedCounters,
    max_records: Option<u64>,
) -> Result<(), CliError> {
    for line in reader.lines() {
        if stop.load(Ordering::Acquire) {
            debug!("Stop requested, reader exiting");
            break;
        }
        let line = line.map_err(|e| CliError::input("input stream", e))?;
        let read = counters.lines_read.fetch_add(1, Ordering::AcqRel) + 1;

        match sink.write_line(line) {
            Ok(()) => {}
            Err(SinkError::QueueFull { .. }) => {
                counters.lines_rejected.fetch_add(1, Ordering::AcqRel);
            }
            Err(SinkError::Closed { .. }) => {
                counters.lines_rejected.fetch_add(1, Ordering::AcqRel);
                debug!("Sink closed, reader exiting");
                break;
            }
            Err(e) => {
                counters.lines_rejected.fetch_add(1, Ordering::AcqRel);
                return Err(e.into());
            }
        }

        if max_records.is_some_and(|max| read >= max) {
            info!(records = read, "Record limit reached");
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ObservabilitySettings, SinkConfig};
    use std::fs;
    use tempfile::tempdir;

    fn config(dir: &std::path::Path, input: PathBuf, max_records: Option<u64>) -> PipelineConfig {
        let mut sink = SinkConfig::new("feed");
        sink.path = dir.join("out");
        sink.rotation.max_rows_per_file = 4;
        PipelineConfig {
            blueprint: SinkBlueprint {
                version: Default::default(),
                sink,
                adapter: Default::default(),
                observability: ObservabilitySettings::default(),
            },
            input: Some(input),
            max_records,
            timeout: None,
            metrics_interval: None,
        }
    }

    fn input_file(dir: &std::path::Path, lines: usize) -> PathBuf {
        let path = dir.join("input.txt");
        let content: String = (0..lines).map(|i| format!("line-{i}\n")).collect();
        fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_pipeline_feeds_file() {
        let dir = tempdir().unwrap();
        let input = input_file(dir.path(), 10);
        let pipeline = Pipeline::new(config(dir.path(), input, None)).unwrap();

        pipeline.run().await.unwrap();
        let stats = pipeline.finish().await.unwrap();

        assert_eq!(stats.lines_read, 10);
        assert_eq!(stats.snapshot.rows_written, 10);
        assert_eq!(stats.rotations.destinations, 3);
        assert_eq!(
            fs::read_to_string(dir.path().join("out/feed_2.log")).unwrap(),
            "line-8\nline-9\n"
        );
    }

    #[tokio::test]
    async fn test_pipeline_record_limit() {
        let dir = tempdir().unwrap();
        let input = input_file(dir.path(), 10);
        let pipeline = Pipeline::new(config(dir.path(), input, Some(5))).unwrap();

        pipeline.run().await.unwrap();
        let stats = pipeline.finish().await.unwrap();

        assert_eq!(stats.lines_read, 5);
        assert_eq!(stats.snapshot.rows_written, 5);
    }

    #[tokio::test]
    async fn test_missing_input_file() {
        let dir = tempdir().unwrap();
        let pipeline =
            Pipeline::new(config(dir.path(), dir.path().join("missing.txt"), None)).unwrap();
        let err = pipeline.run().await.unwrap_err();
        assert!(err.to_string().contains("missing.txt"));
    }
}
