//! Destination adapter implementations
//!
//! Contains TextFileSystem, DelimitedFileSystem, JsonLinesFileSystem, and
//! MemoryFileSystem.

mod delimited;
mod jsonl;
mod local;
mod memory;
mod text;

pub use self::delimited::{DelimitedFileSystem, DelimitedOptions};
pub use self::jsonl::JsonLinesFileSystem;
pub use self::memory::{MemoryFileSystem, MemoryStore};
pub use self::text::TextFileSystem;
