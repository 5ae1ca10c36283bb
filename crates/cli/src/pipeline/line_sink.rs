//! Line-oriented facade over the typed rotating sinks
//!
//! The CLI reads text lines; each adapter kind needs a different record
//! type, so the concrete `RotatingSink<R, FS>` is hidden behind `LineSink`
//! together with the line → record conversion.

use std::path::PathBuf;
use std::sync::Arc;

use contracts::{AdapterConfig, MetricsSnapshot, SinkBlueprint, SinkError, SinkFileSystem};
use serde_json::Value;
use sink_engine::{
    DelimitedFileSystem, DelimitedOptions, JsonLinesFileSystem, OnRollCallback, RotatingSink,
    SinkOptions, SinkStatus, TextFileSystem,
};

/// A rotating sink fed with text lines
pub trait LineSink: Send + Sync {
    fn name(&self) -> &str;

    /// Convert and queue one line
    fn write_line(&self, line: String) -> Result<(), SinkError>;

    fn close(&self) -> Result<(), SinkError>;

    fn status(&self) -> SinkStatus;

    fn snapshot(&self) -> MetricsSnapshot;

    fn current_path(&self) -> Option<PathBuf>;
}

type Convert<R> = Box<dyn Fn(String) -> R + Send + Sync>;

struct Adapted<R: Send + 'static, FS: SinkFileSystem<R>> {
    sink: RotatingSink<R, FS>,
    convert: Convert<R>,
}

impl<R: Send + 'static, FS: SinkFileSystem<R>> LineSink for Adapted<R, FS> {
    fn name(&self) -> &str {
        self.sink.name()
    }

    fn write_line(&self, line: String) -> Result<(), SinkError> {
        self.sink.write((self.convert)(line))
    }

    fn close(&self) -> Result<(), SinkError> {
        self.sink.close()
    }

    fn status(&self) -> SinkStatus {
        self.sink.status()
    }

    fn snapshot(&self) -> MetricsSnapshot {
        self.sink.snapshot()
    }

    fn current_path(&self) -> Option<PathBuf> {
        self.sink.current_path()
    }
}

fn adapted<R: Send + 'static, FS: SinkFileSystem<R>>(
    options: SinkOptions<FS::Options>,
    convert: Convert<R>,
) -> Result<Arc<dyn LineSink>, SinkError> {
    let sink = RotatingSink::<R, FS>::new(options)?;
    Ok(Arc::new(Adapted { sink, convert }))
}

/// Build the sink described by `blueprint`
///
/// - text: the line as is
/// - delimited: the line split on the delimiter
/// - jsonl: a one-element batch; lines that are not JSON become strings
pub fn build_line_sink(
    blueprint: &SinkBlueprint,
    on_roll: Option<OnRollCallback>,
) -> Result<Arc<dyn LineSink>, SinkError> {
    let config = blueprint.sink.clone();

    match &blueprint.adapter {
        AdapterConfig::Text => {
            let mut options = SinkOptions::new(config, ());
            options.on_roll = on_roll;
            adapted::<String, TextFileSystem>(options, Box::new(|line| line))
        }
        AdapterConfig::Delimited { delimiter, headers } => {
            let delimiter = *delimiter;
            let adapter = DelimitedOptions {
                delimiter,
                headers: headers.clone(),
            };
            let mut options = SinkOptions::new(config, adapter);
            options.on_roll = on_roll;
            adapted::<Vec<String>, DelimitedFileSystem>(
                options,
                Box::new(move |line| line.split(delimiter).map(str::to_string).collect()),
            )
        }
        AdapterConfig::Jsonl => {
            let mut options = SinkOptions::new(config, ());
            options.on_roll = on_roll;
            adapted::<Vec<Value>, JsonLinesFileSystem>(
                options,
                Box::new(|line| match serde_json::from_str::<Value>(&line) {
                    Ok(value) => vec![value],
                    Err(_) => vec![Value::String(line)],
                }),
            )
        }
    }
}
