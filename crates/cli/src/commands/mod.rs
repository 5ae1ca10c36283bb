//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_pipeline;
pub use validate::run_validate;

use anyhow::{Context, Result};
use contracts::SinkBlueprint;
use std::path::Path;

use crate::error::CliError;

/// Load and validate the blueprint at `path`
fn load_blueprint(path: &Path) -> Result<SinkBlueprint> {
    if !path.exists() {
        return Err(CliError::config_not_found(path).into());
    }
    config_loader::ConfigLoader::load_from_path(path)
        .map_err(CliError::from)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}
