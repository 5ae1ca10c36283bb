//! Retention - retires the oldest destinations beyond the backup limit

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{error, info};

/// Oldest-first list of destinations produced in this process lifetime
#[derive(Debug, Clone, Default)]
pub struct Retention {
    limit: Option<usize>,
    retained: VecDeque<PathBuf>,
}

impl Retention {
    /// `None` keeps every destination
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            retained: VecDeque::new(),
        }
    }

    /// Record a newly opened destination
    pub fn push(&mut self, path: PathBuf) {
        self.retained.push_back(path);
    }

    /// Retained destinations, oldest first
    pub fn retained(&self) -> impl Iterator<Item = &Path> {
        self.retained.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.retained.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }

    /// Drop the oldest destinations until the limit holds
    ///
    /// Every evicted path is passed to `remove`; failures are logged and the
    /// path is forgotten either way. Returns the paths actually removed.
    pub fn prune(&mut self, mut remove: impl FnMut(&Path) -> io::Result<()>) -> Vec<PathBuf> {
        let Some(limit) = self.limit else {
            return Vec::new();
        };

        let mut removed = Vec::new();
        while self.retained.len() > limit {
            let Some(oldest) = self.retained.pop_front() else {
                break;
            };
            info!(
                limit = limit,
                path = %oldest.display(),
                "Backup destinations exceed the limit, removing oldest"
            );
            match remove(&oldest) {
                Ok(()) => removed.push(oldest),
                Err(e) => {
                    error!(path = %oldest.display(), error = %e, "Failed to remove rotated destination");
                }
            }
        }
        removed
    }
}
