//! Pipeline orchestration module.

mod line_sink;
mod orchestrator;
mod stats;

pub use line_sink::{build_line_sink, LineSink};
pub use orchestrator::{Pipeline, PipelineConfig};
pub use stats::PipelineStats;
