//! RollPolicy - decides when the active destination must be rotated
//!
//! Two sub-policies are combined:
//! - row count: due once the open destination holds `max_rows_per_file` rows
//! - time window: due once wall-clock has left the bucket the watermark
//!   points at
//!
//! Evaluation never moves the watermark (except to initialize it);
//! only [`RollPolicy::advance`] does, once per actual rotation.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local};
use contracts::{RotationConfig, TimeRollConfig, TimeRollPathFormat};

/// Time-window sub-policy
#[derive(Debug, Clone)]
pub struct TimeRollPolicy {
    bucket: Option<Duration>,
    path_format: TimeRollPathFormat,
    watermark: Option<SystemTime>,
}

impl TimeRollPolicy {
    /// Create from configuration; an unspecified period never fires
    pub fn new(config: &TimeRollConfig) -> Self {
        Self {
            bucket: config.period.bucket().filter(|bucket| !bucket.is_zero()),
            path_format: config.path_format,
            watermark: None,
        }
    }

    /// Bucket length, `None` when disabled
    pub fn bucket(&self) -> Option<Duration> {
        self.bucket
    }

    /// Start of the bucket of the last rotation
    pub fn watermark(&self) -> Option<SystemTime> {
        self.watermark
    }

    /// Whether the bucket boundary has been crossed at `now`
    ///
    /// The first evaluation only initializes the watermark.
    pub fn is_due_at(&mut self, now: SystemTime) -> bool {
        let Some(bucket) = self.bucket else {
            return false;
        };

        match self.watermark {
            None => {
                self.watermark = Some(bucket_start(now, bucket));
                false
            }
            Some(mark) => now
                .duration_since(mark)
                .map(|elapsed| elapsed >= bucket)
                .unwrap_or(false),
        }
    }

    /// Move the watermark to the bucket containing `now`
    pub fn advance_at(&mut self, now: SystemTime) {
        if let Some(bucket) = self.bucket {
            self.watermark = Some(bucket_start(now, bucket));
        }
    }
}

/// Start of the bucket containing `now`, aligned to the Unix epoch
fn bucket_start(now: SystemTime, bucket: Duration) -> SystemTime {
    let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default();
    let offset = since_epoch.as_nanos() % bucket.as_nanos();
    // offset < bucket, which is itself a Duration
    now - Duration::from_nanos(offset as u64)
}

/// Combined row-count and time-window policy
#[derive(Debug, Clone)]
pub struct RollPolicy {
    enabled: bool,
    max_rows: u64,
    time: TimeRollPolicy,
}

impl RollPolicy {
    /// Create from rotation configuration
    pub fn new(config: &RotationConfig) -> Self {
        Self {
            enabled: config.enabled,
            max_rows: config.max_rows_per_file,
            time: TimeRollPolicy::new(&config.time),
        }
    }

    /// Whether the destination holding `current_rows` rows must roll now
    pub fn should_roll(&mut self, current_rows: u64) -> bool {
        self.should_roll_at(current_rows, SystemTime::now())
    }

    /// [`RollPolicy::should_roll`] against an explicit clock
    pub fn should_roll_at(&mut self, current_rows: u64, now: SystemTime) -> bool {
        if !self.enabled {
            return false;
        }
        // evaluate time first so the watermark is initialized on first use
        let time_due = self.time.is_due_at(now);
        time_due || current_rows >= self.max_rows
    }

    /// Record that a rotation happened
    pub fn advance(&mut self) {
        self.advance_at(SystemTime::now());
    }

    /// [`RollPolicy::advance`] against an explicit clock
    pub fn advance_at(&mut self, now: SystemTime) {
        self.time.advance_at(now);
    }

    /// Time sub-policy
    pub fn time(&self) -> &TimeRollPolicy {
        &self.time
    }

    /// Capture the state describing a destination being retired
    pub fn snapshot(&self, rows: u64, sequence: u64) -> RollSnapshot {
        RollSnapshot {
            bucket: self.time.bucket,
            path_format: self.time.path_format,
            watermark: self.time.watermark,
            rows,
            sequence,
        }
    }
}

/// Policy state handed to the rotation callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollSnapshot {
    /// Bucket length, `None` when time rotation is disabled
    pub bucket: Option<Duration>,
    /// Date path layout
    pub path_format: TimeRollPathFormat,
    /// Start of the bucket the destination was written in
    pub watermark: Option<SystemTime>,
    /// Rows written to the destination
    pub rows: u64,
    /// Sequence index the destination was named with
    pub sequence: u64,
}

impl RollSnapshot {
    /// Local date path of the watermark (`None` without time rotation)
    pub fn date_path(&self) -> Option<String> {
        let watermark: DateTime<Local> = self.watermark?.into();
        let format = match self.path_format {
            TimeRollPathFormat::Flat => "%Y%m%d%H%M",
            TimeRollPathFormat::Parted => "%Y/%m/%d/%H/%M",
        };
        Some(watermark.format(format).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::RollPeriod;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn rotation(period: RollPeriod, max_rows: u64) -> RotationConfig {
        RotationConfig {
            enabled: true,
            max_rows_per_file: max_rows,
            max_backup_files: None,
            time: TimeRollConfig {
                period,
                path_format: TimeRollPathFormat::Flat,
            },
        }
    }

    #[test]
    fn test_row_threshold() {
        let mut policy = RollPolicy::new(&rotation(RollPeriod::Unspecified, 2));
        assert!(!policy.should_roll(0));
        assert!(!policy.should_roll(1));
        assert!(policy.should_roll(2));
        assert!(policy.should_roll(3));
    }

    #[test]
    fn test_disabled_never_rolls() {
        let mut config = rotation(RollPeriod::Secondly, 1);
        config.enabled = false;
        let mut policy = RollPolicy::new(&config);
        assert!(!policy.should_roll_at(100, at(0)));
        assert!(!policy.should_roll_at(100, at(3600)));
    }

    #[test]
    fn test_first_evaluation_initializes_watermark() {
        let mut policy = TimeRollPolicy::new(&TimeRollConfig {
            period: RollPeriod::Minutely,
            path_format: TimeRollPathFormat::Flat,
        });
        assert!(!policy.is_due_at(at(125)));
        assert_eq!(policy.watermark(), Some(at(120)));
    }

    #[test]
    fn test_same_bucket_not_due() {
        let mut policy = RollPolicy::new(&rotation(RollPeriod::Minutely, u64::MAX));
        assert!(!policy.should_roll_at(0, at(120)));
        assert!(!policy.should_roll_at(0, at(150)));
        assert!(!policy.should_roll_at(0, at(179)));
    }

    #[test]
    fn test_next_bucket_due_until_advanced() {
        let mut policy = RollPolicy::new(&rotation(RollPeriod::Minutely, u64::MAX));
        assert!(!policy.should_roll_at(0, at(130)));
        assert!(policy.should_roll_at(0, at(180)));

        // evaluating again without rotating does not drift the watermark
        assert!(policy.should_roll_at(0, at(181)));
        assert_eq!(policy.time().watermark(), Some(at(120)));

        policy.advance_at(at(181));
        assert_eq!(policy.time().watermark(), Some(at(180)));
        assert!(!policy.should_roll_at(0, at(200)));
        assert!(policy.should_roll_at(0, at(240)));
    }

    #[test]
    fn test_combined_either_fires() {
        let mut policy = RollPolicy::new(&rotation(RollPeriod::Hourly, 10));
        assert!(!policy.should_roll_at(3, at(0)));
        assert!(policy.should_roll_at(10, at(1)));
        assert!(policy.should_roll_at(0, at(3600)));
    }

    #[test]
    fn test_custom_period_millis() {
        let mut policy = TimeRollPolicy::new(&TimeRollConfig {
            period: RollPeriod::Custom { millis: 250 },
            path_format: TimeRollPathFormat::Flat,
        });
        let base = UNIX_EPOCH + Duration::from_millis(1_100);
        assert!(!policy.is_due_at(base));
        assert_eq!(
            policy.watermark(),
            Some(UNIX_EPOCH + Duration::from_millis(1_000))
        );
        assert!(!policy.is_due_at(UNIX_EPOCH + Duration::from_millis(1_249)));
        assert!(policy.is_due_at(UNIX_EPOCH + Duration::from_millis(1_250)));
    }

    #[test]
    fn test_snapshot_date_path() {
        let mut policy = RollPolicy::new(&rotation(RollPeriod::Minutely, 10));
        let now = at(1_700_000_000);
        policy.should_roll_at(0, now);

        let snapshot = policy.snapshot(7, 3);
        assert_eq!(snapshot.rows, 7);
        assert_eq!(snapshot.sequence, 3);

        let expected: DateTime<Local> = at(1_700_000_000 - 1_700_000_000 % 60).into();
        assert_eq!(
            snapshot.date_path(),
            Some(expected.format("%Y%m%d%H%M").to_string())
        );

        let parted = RollSnapshot {
            path_format: TimeRollPathFormat::Parted,
            ..snapshot
        };
        assert_eq!(
            parted.date_path(),
            Some(expected.format("%Y/%m/%d/%H/%M").to_string())
        );
    }

    #[test]
    fn test_snapshot_without_time_policy() {
        let policy = RollPolicy::new(&rotation(RollPeriod::Unspecified, 10));
        assert_eq!(policy.snapshot(1, 0).date_path(), None);
    }
}
