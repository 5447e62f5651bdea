//! `info` command implementation.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use contracts::ScenarioBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

#[derive(Serialize)]
struct ScenarioInfo {
    version: String,
    episode: EpisodeInfo,
    actors: Vec<ActorInfo>,
    sensors: Vec<SensorInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct EpisodeInfo {
    map: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    geo_reference: Option<String>,
    fixed_delta_seconds: f64,
    frames: u64,
}

#[derive(Serialize)]
struct ActorInfo {
    id: String,
    blueprint: String,
    mobility: String,
    registered: bool,
}

#[derive(Serialize)]
struct SensorInfo {
    id: String,
    sensor_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    params: BTreeMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading scenario info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_scenario_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize scenario info")?;
        println!("{}", json);
    } else {
        print_scenario_info(&blueprint, args);
    }

    Ok(())
}

fn build_scenario_info(blueprint: &ScenarioBlueprint, args: &InfoArgs) -> ScenarioInfo {
    let actors = blueprint
        .actors
        .iter()
        .map(|a| ActorInfo {
            id: a.id.clone(),
            blueprint: a.blueprint.clone(),
            mobility: format!("{:?}", a.mobility),
            registered: a.registered,
        })
        .collect();

    let sensors = blueprint
        .sensors
        .iter()
        .map(|s| SensorInfo {
            id: s.id.clone(),
            sensor_type: s.sensor_type.blueprint_id(),
            parent: s.parent.clone(),
            attributes: if args.sensors {
                s.attributes.clone().into_iter().collect()
            } else {
                BTreeMap::new()
            },
        })
        .collect();

    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
                params: s.params.clone().into_iter().collect(),
            })
            .collect()
    } else {
        Vec::new()
    };

    ScenarioInfo {
        version: format!("{:?}", blueprint.version),
        episode: EpisodeInfo {
            map: blueprint.episode.map.clone(),
            geo_reference: blueprint.episode.geo_reference.clone(),
            fixed_delta_seconds: blueprint.episode.fixed_delta_seconds,
            frames: blueprint.episode.frames,
        },
        actors,
        sensors,
        sinks,
    }
}

fn print_scenario_info(blueprint: &ScenarioBlueprint, args: &InfoArgs) {
    println!("=== CARLA Obstacle Scenario ===\n");

    let episode = &blueprint.episode;
    println!("Episode");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Map: {}", episode.map);
    println!(
        "   ├─ Geo reference: {}",
        episode.geo_reference.as_deref().unwrap_or("(none)")
    );
    println!(
        "   └─ Step: {}s x {} frames",
        episode.fixed_delta_seconds, episode.frames
    );

    println!("\nActors ({})", blueprint.actors.len());
    for (i, actor) in blueprint.actors.iter().enumerate() {
        let prefix = if i == blueprint.actors.len() - 1 { "└─" } else { "├─" };
        let tracked = if actor.registered { "registered" } else { "unregistered" };
        println!(
            "   {} {} ({}, {:?}, {})",
            prefix, actor.id, actor.blueprint, actor.mobility, tracked
        );
    }

    println!("\nSensors ({})", blueprint.sensors.len());
    for (i, sensor) in blueprint.sensors.iter().enumerate() {
        let is_last = i == blueprint.sensors.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!(
            "   {} {} ({}) on {}",
            prefix,
            sensor.id,
            sensor.sensor_type.blueprint_id(),
            sensor.parent.as_deref().unwrap_or("world")
        );

        if args.sensors && !sensor.attributes.is_empty() {
            let attributes: BTreeMap<_, _> = sensor.attributes.iter().collect();
            for (key, value) in attributes {
                println!("   {}     {} = {}", child_prefix, key, value);
            }
        }
    }

    if args.sinks && !blueprint.sinks.is_empty() {
        println!("\nSinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let prefix = if i == blueprint.sinks.len() - 1 { "└─" } else { "├─" };
            println!(
                "   {} {} ({:?}, queue {})",
                prefix, sink.name, sink.sink_type, sink.queue_capacity
            );
        }
    }

    println!();
}
