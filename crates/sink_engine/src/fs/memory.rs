//! MemoryFileSystem - in-memory destinations for tests and embedding callers

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{SinkError, SinkFileSystem};

/// Shared backing store: destination path → written lines
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<BTreeMap<PathBuf, Vec<String>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines written to `path`
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<String>> {
        self.lock().get(path.as_ref()).cloned()
    }

    /// Every stored destination, sorted by path
    pub fn paths(&self) -> Vec<PathBuf> {
        self.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, Vec<String>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Destination living in a [`MemoryStore`]
#[derive(Debug)]
pub struct MemoryFileSystem {
    path: PathBuf,
    store: MemoryStore,
    open: AtomicBool,
}

impl SinkFileSystem<String> for MemoryFileSystem {
    type Options = MemoryStore;

    fn open(path: &Path, store: &MemoryStore) -> Result<Self, SinkError> {
        store.lock().entry(path.to_path_buf()).or_default();
        Ok(Self {
            path: path.to_path_buf(),
            store: store.clone(),
            open: AtomicBool::new(true),
        })
    }

    fn write(&self, record: String) -> Result<u64, SinkError> {
        if !self.is_open() {
            return Err(SinkError::write(&self.path, "destination already closed"));
        }
        let mut store = self.store.lock();
        let lines = store
            .get_mut(&self.path)
            .ok_or_else(|| SinkError::write(&self.path, "destination removed"))?;
        lines.push(record);
        Ok(1)
    }

    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }

    fn close(&self) -> Result<(), SinkError> {
        self.open.store(false, Ordering::Release);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn exists(path: &Path, store: &MemoryStore) -> bool {
        store.lock().contains_key(path)
    }

    fn remove(path: &Path, store: &MemoryStore) -> io::Result<()> {
        store
            .lock()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn is_thread_safe() -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_lifecycle() {
        let store = MemoryStore::new();
        let path = Path::new("mem/out_0.log");
        assert!(!MemoryFileSystem::exists(path, &store));

        let fs = MemoryFileSystem::open(path, &store).unwrap();
        assert!(MemoryFileSystem::exists(path, &store));
        fs.write("a".into()).unwrap();
        fs.close().unwrap();
        fs.close().unwrap();
        assert!(!fs.is_open());
        assert!(fs.write("late".into()).is_err());

        assert_eq!(store.contents(path), Some(vec!["a".to_string()]));

        MemoryFileSystem::remove(path, &store).unwrap();
        assert!(store.is_empty());
        assert!(MemoryFileSystem::remove(path, &store).is_err());
    }
}
