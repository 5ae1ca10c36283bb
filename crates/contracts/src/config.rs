//! Sink configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::SinkError;

/// Rotating sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Destination base name
    pub name: String,

    /// Parent directory of every destination (empty = current directory)
    #[serde(default)]
    pub path: PathBuf,

    /// Naming options
    #[serde(default)]
    pub naming: NamingConfig,

    /// Rotation options
    #[serde(default)]
    pub rotation: RotationConfig,

    /// Close retired destinations on a background thread
    #[serde(default)]
    pub close_in_threads: bool,

    /// Writer thread count (only honored by thread-safe adapters)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Maximum in-flight records (None = unbounded)
    #[serde(default)]
    pub queue_capacity: Option<usize>,
}

fn default_concurrency() -> usize {
    1
}

impl SinkConfig {
    /// Config with defaults for everything but the base name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: PathBuf::new(),
            naming: NamingConfig::default(),
            rotation: RotationConfig::default(),
            close_in_threads: false,
            concurrency: default_concurrency(),
            queue_capacity: None,
        }
    }

    /// Check the engine-level invariants
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), SinkError> {
        if self.name.is_empty() {
            return Err(SinkError::config_validation(
                "sink.name",
                "sink name cannot be empty",
            ));
        }
        if self.naming.suffix.is_empty() {
            return Err(SinkError::config_validation(
                "sink.naming.suffix",
                "suffix cannot be empty",
            ));
        }
        if self.concurrency == 0 {
            return Err(SinkError::config_validation(
                "sink.concurrency",
                "concurrency must be >= 1",
            ));
        }
        if self.queue_capacity == Some(0) {
            return Err(SinkError::config_validation(
                "sink.queue_capacity",
                "queue_capacity must be >= 1 when set",
            ));
        }
        if self.rotation.max_rows_per_file == 0 {
            return Err(SinkError::config_validation(
                "sink.rotation.max_rows_per_file",
                "max_rows_per_file must be >= 1",
            ));
        }
        if self.rotation.max_backup_files == Some(0) {
            return Err(SinkError::config_validation(
                "sink.rotation.max_backup_files",
                "max_backup_files must be >= 1 when set",
            ));
        }
        if self.rotation.time.period.bucket() == Some(Duration::ZERO) {
            return Err(SinkError::config_validation(
                "sink.rotation.time.period",
                "custom period must be longer than 0ms",
            ));
        }
        Ok(())
    }
}

/// Destination naming options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Append the host name
    #[serde(default)]
    pub with_hostname: bool,

    /// Append the local date (`YYYYMMDD`)
    #[serde(default)]
    pub with_date: bool,

    /// Append the local time of day (`HHMMSS`)
    #[serde(default)]
    pub with_timestamp: bool,

    /// File extension without the dot
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

fn default_suffix() -> String {
    "log".to_string()
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            with_hostname: false,
            with_date: false,
            with_timestamp: false,
            suffix: default_suffix(),
        }
    }
}

/// Rotation options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationConfig {
    /// Rotate at all; when false exactly one destination is produced
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Rows per destination before rolling
    #[serde(default = "default_max_rows")]
    pub max_rows_per_file: u64,

    /// Destinations kept on the backing medium (None = unlimited)
    #[serde(default)]
    pub max_backup_files: Option<usize>,

    /// Time window policy
    #[serde(default)]
    pub time: TimeRollConfig,
}

fn default_true() -> bool {
    true
}

fn default_max_rows() -> u64 {
    1_000_000
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_rows_per_file: default_max_rows(),
            max_backup_files: None,
            time: TimeRollConfig::default(),
        }
    }
}

/// Time-window rotation options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeRollConfig {
    /// Bucket length
    #[serde(default)]
    pub period: RollPeriod,

    /// Layout of the date path reported to the rotation callback
    #[serde(default)]
    pub path_format: TimeRollPathFormat,
}

/// Time bucket length
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollPeriod {
    /// Time-based rotation disabled
    #[default]
    Unspecified,
    Secondly,
    Minutely,
    Hourly,
    Daily,
    /// Arbitrary bucket length in milliseconds
    Custom { millis: u64 },
}

impl RollPeriod {
    /// Bucket length, `None` when time rotation is disabled
    pub fn bucket(&self) -> Option<Duration> {
        match self {
            Self::Unspecified => None,
            Self::Secondly => Some(Duration::from_secs(1)),
            Self::Minutely => Some(Duration::from_secs(60)),
            Self::Hourly => Some(Duration::from_secs(60 * 60)),
            Self::Daily => Some(Duration::from_secs(24 * 60 * 60)),
            Self::Custom { millis } => Some(Duration::from_millis(*millis)),
        }
    }
}

/// Date path layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRollPathFormat {
    /// `YYYYMMDDHHMM`
    #[default]
    Flat,
    /// `YYYY/MM/DD/HH/MM`
    Parted,
}
