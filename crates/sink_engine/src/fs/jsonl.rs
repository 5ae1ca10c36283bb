//! JsonLinesFileSystem - batches of JSON values, one line per value

use std::path::Path;

use contracts::{SinkError, SinkFileSystem};
use serde_json::Value;

use super::local::LocalFile;

/// Batch destination; a record is a whole batch of rows
#[derive(Debug)]
pub struct JsonLinesFileSystem {
    file: LocalFile,
}

impl SinkFileSystem<Vec<Value>> for JsonLinesFileSystem {
    type Options = ();

    fn open(path: &Path, _options: &()) -> Result<Self, SinkError> {
        Ok(Self {
            file: LocalFile::open(path)?,
        })
    }

    fn write(&self, record: Vec<Value>) -> Result<u64, SinkError> {
        if record.is_empty() {
            return Ok(0);
        }

        let mut buf = Vec::new();
        for value in &record {
            serde_json::to_writer(&mut buf, value)
                .map_err(|e| SinkError::write(self.file.path(), e.to_string()))?;
            buf.push(b'\n');
        }
        self.file.append(&buf)?;
        Ok(record.len() as u64)
    }

    fn flush(&self) -> Result<(), SinkError> {
        self.file.flush()
    }

    fn close(&self) -> Result<(), SinkError> {
        self.file.close()
    }

    fn is_open(&self) -> bool {
        self.file.is_open()
    }

    fn is_thread_safe() -> bool {
        true
    }
}
