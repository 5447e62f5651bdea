//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{ScenarioBlueprint, SinkType};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_scenario(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading scenario");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut blueprint, args);

    info!(
        map = %blueprint.episode.map,
        frames = blueprint.episode.frames,
        actors = blueprint.actors.len(),
        sensors = blueprint.sensors.len(),
        sinks = blueprint.sinks.len(),
        "Scenario loaded"
    );

    if args.dry_run {
        info!("Dry run mode - scenario is valid, exiting");
        print_scenario_summary(&blueprint);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        frames: blueprint.episode.frames,
        blueprint,
        episode_id: args.episode_id,
        realtime: args.realtime,
        buffer_size: args.buffer_size,
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
    });

    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    if stats.interrupted {
        warn!(
            frames = stats.frames_simulated,
            "Run interrupted, sinks drained"
        );
    }
    stats.print_summary();

    info!("CARLA Obstacle finished");
    Ok(())
}

/// Apply `--frames` and `--output` to the loaded scenario
fn apply_overrides(blueprint: &mut ScenarioBlueprint, args: &RunArgs) {
    if args.frames > 0 {
        info!(frames = args.frames, "Overriding frame count from CLI");
        blueprint.episode.frames = args.frames;
    }

    if let Some(output) = &args.output {
        for sink in blueprint
            .sinks
            .iter_mut()
            .filter(|s| s.sink_type == SinkType::File)
        {
            info!(sink = %sink.name, path = %output.display(), "Overriding file sink output");
            sink.params
                .insert("base_path".to_string(), output.display().to_string());
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM. A handler that fails to install never fires.
async fn shutdown_signal() {
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

fn print_scenario_summary(blueprint: &ScenarioBlueprint) {
    println!("\n=== Scenario Summary ===\n");
    println!("Episode:");
    println!("  Map: {}", blueprint.episode.map);
    println!(
        "  Step: {}s x {} frames",
        blueprint.episode.fixed_delta_seconds, blueprint.episode.frames
    );

    println!("\nActors ({}):", blueprint.actors.len());
    for actor in &blueprint.actors {
        let registered = if actor.registered { "" } else { ", unregistered" };
        println!(
            "  - {} ({}, {:?}{})",
            actor.id, actor.blueprint, actor.mobility, registered
        );
    }

    println!("\nSensors ({}):", blueprint.sensors.len());
    for sensor in &blueprint.sensors {
        println!(
            "  - {} ({}) on {}",
            sensor.id,
            sensor.sensor_type.blueprint_id(),
            sensor.parent.as_deref().unwrap_or("world")
        );
    }

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!();
}
