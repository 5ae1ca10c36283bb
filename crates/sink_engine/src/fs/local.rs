//! LocalFile - buffered append-only file shared by the disk adapters

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::SinkError;

const WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// Append-only file behind a lock; `None` once closed
#[derive(Debug)]
pub(crate) struct LocalFile {
    path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl LocalFile {
    /// Open `path` for appending, creating parent directories
    pub(crate) fn open(path: &Path) -> Result<Self, SinkError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SinkError::open(path, e.to_string()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SinkError::open(path, e.to_string()))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(Some(BufWriter::with_capacity(WRITE_BUFFER_SIZE, file))),
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Append raw bytes in one locked step
    pub(crate) fn append(&self, bytes: &[u8]) -> Result<(), SinkError> {
        let mut guard = self.lock();
        let writer = guard
            .as_mut()
            .ok_or_else(|| SinkError::write(&self.path, "destination already closed"))?;
        writer
            .write_all(bytes)
            .map_err(|e| SinkError::write(&self.path, e.to_string()))
    }

    pub(crate) fn flush(&self) -> Result<(), SinkError> {
        match self.lock().as_mut() {
            Some(writer) => writer
                .flush()
                .map_err(|e| SinkError::flush(&self.path, e.to_string())),
            None => Ok(()),
        }
    }

    pub(crate) fn close(&self) -> Result<(), SinkError> {
        let Some(writer) = self.lock().take() else {
            return Ok(());
        };
        let file = writer
            .into_inner()
            .map_err(|e| SinkError::close(&self.path, e.error().to_string()))?;
        file.sync_data()
            .map_err(|e| SinkError::close(&self.path, e.to_string()))
    }

    pub(crate) fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<BufWriter<File>>> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a/b/out_0.log");

        let file = LocalFile::open(&path).unwrap();
        file.append(b"hello\n").unwrap();
        file.close().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = tempdir().unwrap();
        let file = LocalFile::open(&dir.path().join("out.log")).unwrap();
        assert!(file.is_open());

        file.close().unwrap();
        file.close().unwrap();
        file.flush().unwrap();
        assert!(!file.is_open());
        assert!(file.append(b"late\n").is_err());
    }
}
