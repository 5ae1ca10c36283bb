//! DestinationNamer - produces the next destination path
//!
//! Layout: `<path>/<name>[_<host>][_<YYYYMMDD>][_<HHMMSS>][_<index>].<suffix>`

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use contracts::{NamingConfig, SinkConfig};
use tracing::warn;

/// Builds destination paths for a sink
#[derive(Debug, Clone)]
pub struct DestinationNamer {
    dir: PathBuf,
    name: String,
    naming: NamingConfig,
    rotate: bool,
    hostname: Option<String>,
}

impl DestinationNamer {
    /// Create a namer, resolving the host name once if requested
    pub fn new(config: &SinkConfig) -> Self {
        let hostname = if config.naming.with_hostname {
            resolve_hostname()
        } else {
            None
        };

        Self {
            dir: config.path.clone(),
            name: config.name.clone(),
            naming: config.naming.clone(),
            rotate: config.rotation.enabled,
            hostname,
        }
    }

    /// Override the resolved host name
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Candidate path for `index` at `now`
    pub fn candidate(&self, index: u64, now: DateTime<Local>) -> PathBuf {
        self.build(index, &self.stamps(now))
    }

    /// Next free destination path
    ///
    /// With rotation enabled, `exists` is probed and `index` is bumped past
    /// every taken candidate. Without rotation the first candidate is
    /// returned as is.
    pub fn next_path(
        &self,
        index: &mut u64,
        now: DateTime<Local>,
        exists: impl Fn(&Path) -> bool,
    ) -> PathBuf {
        let stamps = self.stamps(now);
        loop {
            let candidate = self.build(*index, &stamps);
            if !self.rotate || !exists(&candidate) {
                return candidate;
            }
            *index += 1;
        }
    }

    fn stamps(&self, now: DateTime<Local>) -> Vec<String> {
        let mut stamps = Vec::with_capacity(3);
        if let Some(ref host) = self.hostname {
            stamps.push(host.clone());
        }
        if self.naming.with_date {
            stamps.push(now.format("%Y%m%d").to_string());
        }
        if self.naming.with_timestamp {
            stamps.push(now.format("%H%M%S").to_string());
        }
        stamps
    }

    fn build(&self, index: u64, stamps: &[String]) -> PathBuf {
        let mut file_name = self.name.clone();
        for stamp in stamps {
            file_name.push('_');
            file_name.push_str(stamp);
        }
        if self.rotate {
            file_name.push_str(&format!("_{index}"));
        }
        file_name.push('.');
        file_name.push_str(&self.naming.suffix);

        self.dir.join(file_name)
    }
}

fn resolve_hostname() -> Option<String> {
    match hostname::get() {
        Ok(host) => Some(host.to_string_lossy().into_owned()),
        Err(e) => {
            warn!(error = %e, "Failed to resolve hostname, omitting it from destination names");
            None
        }
    }
}
