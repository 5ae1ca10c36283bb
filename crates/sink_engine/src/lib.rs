//! # Sink Engine
//!
//! Asynchronous rotating record sink.
//!
//! Responsibilities:
//! - accept records from any number of producer threads without blocking
//! - write them through a [`SinkFileSystem`] adapter on dedicated writer threads
//! - rotate destinations by row count and/or time bucket
//! - retire old destinations beyond the backup limit

pub mod engine;
pub mod fs;
pub mod metrics;
pub mod namer;
pub mod policy;
pub mod retention;

pub use contracts::{MetricsSnapshot, SinkConfig, SinkError, SinkFileSystem};
pub use engine::{OnRollCallback, RotatingSink, SinkOptions, SinkStatus};
pub use fs::{
    DelimitedFileSystem, DelimitedOptions, JsonLinesFileSystem, MemoryFileSystem, MemoryStore,
    TextFileSystem,
};
pub use metrics::SinkMetrics;
pub use namer::DestinationNamer;
pub use policy::{RollPolicy, RollSnapshot, TimeRollPolicy};
pub use retention::Retention;
