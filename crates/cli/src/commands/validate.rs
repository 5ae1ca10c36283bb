//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{AdapterConfig, SinkBlueprint};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    sink: String,
    adapter: String,
    rotate: bool,
    max_rows_per_file: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_backup_files: Option<usize>,
    period: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            let rotation = &blueprint.sink.rotation;

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    sink: blueprint.sink.name.clone(),
                    adapter: blueprint.adapter.kind().to_string(),
                    rotate: rotation.enabled,
                    max_rows_per_file: rotation.max_rows_per_file,
                    max_backup_files: rotation.max_backup_files,
                    period: format!("{:?}", rotation.time.period),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &SinkBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();
    let sink = &blueprint.sink;

    if !sink.rotation.enabled && sink.rotation.max_backup_files.is_some() {
        warnings.push(
            "sink.rotation.max_backup_files has no effect while rotation is disabled".to_string(),
        );
    }

    if sink.concurrency > 1 && matches!(blueprint.adapter, AdapterConfig::Text) {
        warnings.push(format!(
            "text adapter is not thread-safe - sink.concurrency = {} will run as 1",
            sink.concurrency
        ));
    }

    if sink.rotation.enabled
        && sink.rotation.time.period.bucket().is_some()
        && !sink.naming.with_date
        && !sink.naming.with_timestamp
    {
        warnings.push(
            "time rotation without date or timestamp in names - destinations differ only by index"
                .to_string(),
        );
    }

    if !sink.path.as_os_str().is_empty() && !sink.path.exists() {
        warnings.push(format!(
            "sink.path {} does not exist yet - it will be created on first write",
            sink.path.display()
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Sink: {}", summary.sink);
            println!("  Adapter: {}", summary.adapter);
            println!("  Rotate: {}", summary.rotate);
            println!("  Max rows per file: {}", summary.max_rows_per_file);
            match summary.max_backup_files {
                Some(limit) => println!("  Max backup files: {}", limit),
                None => println!("  Max backup files: unlimited"),
            }
            println!("  Period: {}", summary.period);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
