//! `info` command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use contracts::{AdapterConfig, SinkBlueprint};
use serde::Serialize;
use sink_engine::DestinationNamer;
use tracing::info;

use super::load_blueprint;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    sink: SinkInfo,
    adapter: AdapterInfo,
    rotation: RotationInfo,
    first_destination: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics_port: Option<u16>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    path: PathBuf,
    suffix: String,
    with_hostname: bool,
    with_date: bool,
    with_timestamp: bool,
    close_in_threads: bool,
    concurrency: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    queue_capacity: Option<usize>,
}

#[derive(Serialize)]
struct AdapterInfo {
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    delimiter: Option<char>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    headers: Vec<String>,
}

#[derive(Serialize)]
struct RotationInfo {
    enabled: bool,
    max_rows_per_file: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_backup_files: Option<usize>,
    period: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    bucket_ms: Option<u128>,
    path_format: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");
    let blueprint = load_blueprint(&args.config)?;
    let info = build_config_info(&blueprint);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

/// The path the first record would be written to, skipping existing files
fn first_destination(blueprint: &SinkBlueprint) -> PathBuf {
    let namer = DestinationNamer::new(&blueprint.sink);
    let mut index = 0;
    namer.next_path(&mut index, Local::now(), |p| p.exists())
}

fn build_config_info(blueprint: &SinkBlueprint) -> ConfigInfo {
    let sink = &blueprint.sink;
    let rotation = &sink.rotation;

    let adapter = match &blueprint.adapter {
        AdapterConfig::Delimited { delimiter, headers } => AdapterInfo {
            kind: blueprint.adapter.kind(),
            delimiter: Some(*delimiter),
            headers: headers.clone(),
        },
        other => AdapterInfo {
            kind: other.kind(),
            delimiter: None,
            headers: Vec::new(),
        },
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        sink: SinkInfo {
            name: sink.name.clone(),
            path: sink.path.clone(),
            suffix: sink.naming.suffix.clone(),
            with_hostname: sink.naming.with_hostname,
            with_date: sink.naming.with_date,
            with_timestamp: sink.naming.with_timestamp,
            close_in_threads: sink.close_in_threads,
            concurrency: sink.concurrency,
            queue_capacity: sink.queue_capacity,
        },
        adapter,
        rotation: RotationInfo {
            enabled: rotation.enabled,
            max_rows_per_file: rotation.max_rows_per_file,
            max_backup_files: rotation.max_backup_files,
            period: format!("{:?}", rotation.time.period),
            bucket_ms: rotation.time.period.bucket().map(|b| b.as_millis()),
            path_format: format!("{:?}", rotation.time.path_format),
        },
        first_destination: first_destination(blueprint),
        metrics_port: blueprint.observability.metrics_port,
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                   rotsink Configuration                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let sink = &info.sink;
    println!("📁 Sink");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ Name: {}", sink.name);
    println!("   ├─ Path: {}", sink.path.display());
    println!(
        "   ├─ Naming: hostname={}, date={}, timestamp={}, suffix={}",
        sink.with_hostname, sink.with_date, sink.with_timestamp, sink.suffix
    );
    println!("   ├─ Writers: {}", sink.concurrency);
    match sink.queue_capacity {
        Some(capacity) => println!("   ├─ Queue: bounded ({})", capacity),
        None => println!("   ├─ Queue: unbounded"),
    }
    println!("   └─ Close in threads: {}", sink.close_in_threads);

    let adapter = &info.adapter;
    println!("\n✏️  Adapter");
    match adapter.delimiter {
        Some(delimiter) => {
            println!("   ├─ Kind: {}", adapter.kind);
            println!("   ├─ Delimiter: {:?}", delimiter);
            println!("   └─ Headers: {:?}", adapter.headers);
        }
        None => println!("   └─ Kind: {}", adapter.kind),
    }

    let rotation = &info.rotation;
    println!("\n🔄 Rotation");
    println!("   ├─ Enabled: {}", rotation.enabled);
    println!("   ├─ Max rows per file: {}", rotation.max_rows_per_file);
    match rotation.max_backup_files {
        Some(limit) => println!("   ├─ Max backup files: {}", limit),
        None => println!("   ├─ Max backup files: unlimited"),
    }
    println!("   ├─ Period: {}", rotation.period);
    println!("   └─ Date path format: {}", rotation.path_format);

    println!("\n➡️  First destination: {}", info.first_destination.display());
    if let Some(port) = info.metrics_port {
        println!("📈 Metrics: 0.0.0.0:{}", port);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ObservabilitySettings, SinkConfig};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_first_destination_skips_existing() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("runtime_0.log"), "").unwrap();

        let mut sink = SinkConfig::new("runtime");
        sink.path = dir.path().to_path_buf();
        let bp = SinkBlueprint {
            version: Default::default(),
            sink,
            adapter: AdapterConfig::Jsonl,
            observability: ObservabilitySettings::default(),
        };

        let info = build_config_info(&bp);
        assert_eq!(info.first_destination, dir.path().join("runtime_1.log"));
        assert_eq!(info.adapter.kind, "jsonl");
        assert_eq!(info.rotation.bucket_ms, None);
    }
}
