//! Layered error definitions
//!
//! Categorized by source: config / destination / engine

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum SinkError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Destination Errors =====
    /// Destination could not be created or opened (fatal for the sink)
    #[error("failed to open destination '{}': {message}", path.display())]
    Open { path: PathBuf, message: String },

    /// A single record failed to persist
    #[error("write to '{}' failed: {message}", path.display())]
    Write { path: PathBuf, message: String },

    /// Flush error
    #[error("flush of '{}' failed: {message}", path.display())]
    Flush { path: PathBuf, message: String },

    /// Close error
    #[error("close of '{}' failed: {message}", path.display())]
    Close { path: PathBuf, message: String },

    /// Retention could not remove an old destination
    #[error("failed to remove '{}': {message}", path.display())]
    Remove { path: PathBuf, message: String },

    // ===== Engine Errors =====
    /// Sink already closed, record dropped
    #[error("sink '{sink_name}' is closed, record dropped")]
    Closed { sink_name: String },

    /// Bounded queue full, record dropped
    #[error("queue full for sink '{sink_name}' (capacity {capacity}), record dropped")]
    QueueFull { sink_name: String, capacity: usize },

    /// Sink stopped after a fatal error
    #[error("sink '{sink_name}' failed: {message}")]
    Failed { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SinkError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create destination open error
    pub fn open(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Open {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create record write error
    pub fn write(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Write {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create flush error
    pub fn flush(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Flush {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create close error
    pub fn close(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Close {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create retention removal error
    pub fn remove(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Remove {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create closed-sink error
    pub fn closed(sink_name: impl Into<String>) -> Self {
        Self::Closed {
            sink_name: sink_name.into(),
        }
    }

    /// Create fatal sink error
    pub fn failed(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Whether this error stops the sink from making progress
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Open { .. } | Self::Failed { .. })
    }
}
