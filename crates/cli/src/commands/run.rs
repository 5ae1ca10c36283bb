//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use super::load_blueprint;
use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");
    let mut blueprint = load_blueprint(&args.config)?;

    // Apply CLI overrides
    if let Some(port) = args.metrics_port {
        info!(port = port, "Overriding metrics port from CLI");
        blueprint.observability.metrics_port = (port != 0).then_some(port);
    }

    info!(
        sink = %blueprint.sink.name,
        path = %blueprint.sink.path.display(),
        adapter = blueprint.adapter.kind(),
        rotate = blueprint.sink.rotation.enabled,
        max_rows = blueprint.sink.rotation.max_rows_per_file,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        return Ok(());
    }

    if let Some(port) = blueprint.observability.metrics_port {
        observability::init_metrics_only(port)?;
    }

    let pipeline_config = PipelineConfig {
        metrics_interval: blueprint
            .observability
            .metrics_port
            .map(|_| Duration::from_secs(1)),
        blueprint,
        input: args.input.clone(),
        max_records: (args.max_records != 0).then_some(args.max_records),
        timeout: (args.timeout != 0).then(|| Duration::from_secs(args.timeout)),
    };

    let pipeline = Pipeline::new(pipeline_config)?;
    let shutdown_signal = setup_shutdown_signal();

    info!("Starting pipeline...");

    tokio::select! {
        result = pipeline.run() => {
            result.context("Pipeline execution failed")?;
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, draining sink...");
            pipeline.stop();
        }
    }

    let stats = pipeline.finish().await?;
    info!(
        rows = stats.snapshot.rows_written,
        rotations = stats.snapshot.rotation_count,
        dropped = stats.snapshot.dropped_count,
        duration_secs = stats.duration.as_secs_f64(),
        "Pipeline completed"
    );

    if args.json {
        let json = serde_json::to_string_pretty(&stats.report())
            .context("Failed to serialize run summary")?;
        println!("{}", json);
    } else {
        stats.print_summary();
    }

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
///
/// A handler that fails to install is logged and never fires.
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
