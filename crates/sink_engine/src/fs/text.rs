//! TextFileSystem - one line of text per record

use std::path::Path;

use contracts::{SinkError, SinkFileSystem};
use tracing::debug;

use super::local::LocalFile;

/// Line-oriented text destination
#[derive(Debug)]
pub struct TextFileSystem {
    file: LocalFile,
}

impl SinkFileSystem<String> for TextFileSystem {
    type Options = ();

    fn open(path: &Path, _options: &()) -> Result<Self, SinkError> {
        let file = LocalFile::open(path)?;
        debug!(path = %path.display(), "Text destination opened");
        Ok(Self { file })
    }

    fn write(&self, mut record: String) -> Result<u64, SinkError> {
        record.push('\n');
        self.file.append(record.as_bytes())?;
        Ok(1)
    }

    fn flush(&self) -> Result<(), SinkError> {
        self.file.flush()
    }

    fn close(&self) -> Result<(), SinkError> {
        self.file.close()?;
        debug!(path = %self.file.path().display(), "Text destination closed");
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.file.is_open()
    }
}
