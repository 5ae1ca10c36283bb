//! SinkFileSystem trait - destination adapter interface
//!
//! Defines the abstract interface the rotating sink writes through. One
//! adapter value represents one open destination.

use std::io;
use std::path::Path;

use crate::SinkError;

/// Destination adapter trait
///
/// All backing media (text files, delimited rows, batches, in-memory
/// buffers) implement this trait. The engine creates a fresh adapter with
/// [`SinkFileSystem::open`] for every destination it rotates to.
pub trait SinkFileSystem<R>: Send + Sync + Sized + 'static {
    /// Adapter-specific options shared by every destination of a sink
    type Options: Clone + Send + Sync + 'static;

    /// Create or open the destination at `path`
    ///
    /// # Errors
    /// Returns [`SinkError::Open`] when the backing resource cannot be created.
    fn open(path: &Path, options: &Self::Options) -> Result<Self, SinkError>;

    /// Write one record
    ///
    /// Returns the number of logical rows the record represents, which may be
    /// more than one for batch records.
    ///
    /// # Errors
    /// Returns [`SinkError::Write`]; the engine logs it and counts zero rows.
    fn write(&self, record: R) -> Result<u64, SinkError>;

    /// Flush buffered data (idempotent)
    fn flush(&self) -> Result<(), SinkError>;

    /// Close the destination, implies a final flush (idempotent)
    fn close(&self) -> Result<(), SinkError>;

    /// Whether the destination is still open for writing
    fn is_open(&self) -> bool;

    /// Whether a destination already exists at `path`
    fn exists(path: &Path, _options: &Self::Options) -> bool {
        path.exists()
    }

    /// Remove a retired destination
    fn remove(path: &Path, _options: &Self::Options) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    /// Whether `write` may be called from several writer threads at once
    fn is_thread_safe() -> bool {
        false
    }
}
