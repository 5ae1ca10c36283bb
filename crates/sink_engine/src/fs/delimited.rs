//! DelimitedFileSystem - delimited rows with an optional header line
//!
//! Rows are formatted outside the file lock, so several writer threads can
//! feed one destination.

use std::path::Path;

use contracts::{SinkError, SinkFileSystem};
use tracing::{debug, warn};

use super::local::LocalFile;

/// Delimited adapter options
#[derive(Debug, Clone)]
pub struct DelimitedOptions {
    /// Field delimiter
    pub delimiter: char,
    /// Header written at the top of every destination (empty = none)
    pub headers: Vec<String>,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            headers: Vec::new(),
        }
    }
}

/// Delimited row destination
#[derive(Debug)]
pub struct DelimitedFileSystem {
    file: LocalFile,
    options: DelimitedOptions,
}

impl DelimitedFileSystem {
    fn format_row(&self, fields: &[String]) -> String {
        let mut line = String::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                line.push(self.options.delimiter);
            }
            push_field(&mut line, field, self.options.delimiter);
        }
        line.push('\n');
        line
    }
}

/// Quote the field when it contains the delimiter, a quote or a line break
fn push_field(line: &mut String, field: &str, delimiter: char) {
    let needs_quotes = field
        .chars()
        .any(|c| c == delimiter || c == '"' || c == '\n' || c == '\r');
    if !needs_quotes {
        line.push_str(field);
        return;
    }
    line.push('"');
    line.push_str(&field.replace('"', "\"\""));
    line.push('"');
}

impl SinkFileSystem<Vec<String>> for DelimitedFileSystem {
    type Options = DelimitedOptions;

    fn open(path: &Path, options: &DelimitedOptions) -> Result<Self, SinkError> {
        let file = LocalFile::open(path)?;
        let fs = Self {
            file,
            options: options.clone(),
        };
        if !fs.options.headers.is_empty() {
            let header = fs.format_row(&fs.options.headers);
            fs.file
                .append(header.as_bytes())
                .map_err(|e| SinkError::open(path, e.to_string()))?;
        }
        debug!(path = %path.display(), columns = fs.options.headers.len(), "Delimited destination opened");
        Ok(fs)
    }

    fn write(&self, record: Vec<String>) -> Result<u64, SinkError> {
        let columns = self.options.headers.len();
        if columns > 0 && columns != record.len() {
            warn!(
                path = %self.file.path().display(),
                header = columns,
                record = record.len(),
                "Unexpected column count"
            );
            return Err(SinkError::write(
                self.file.path(),
                format!("expected {columns} columns, got {}", record.len()),
            ));
        }
        let line = self.format_row(&record);
        self.file.append(line.as_bytes())?;
        Ok(1)
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
