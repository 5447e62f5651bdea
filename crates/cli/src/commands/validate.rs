//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{ScenarioBlueprint, SensorType};
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
    summary: Option<ScenarioSummary>,
}

#[derive(Serialize)]
struct ScenarioSummary {
    version: String,
    map: String,
    frames: u64,
    actor_count: usize,
    sensor_count: usize,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating scenario");

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
        anyhow::bail!("Scenario validation failed")
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
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ScenarioSummary {
                    version: format!("{:?}", blueprint.version),
                    map: blueprint.episode.map.clone(),
                    frames: blueprint.episode.frames,
                    actor_count: blueprint.actors.len(),
                    sensor_count: blueprint.sensors.len(),
                    sink_count: blueprint.sinks.len(),
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

/// Non-fatal issues
fn collect_warnings(blueprint: &ScenarioBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - readings will be dropped".to_string());
    }

    if !blueprint
        .sensors
        .iter()
        .any(|s| s.sensor_type == SensorType::ObstacleDetector)
    {
        warnings.push("No obstacle detector configured".to_string());
    }

    let has_gnss = blueprint
        .sensors
        .iter()
        .any(|s| s.sensor_type == SensorType::Gnss);
    if has_gnss && blueprint.episode.geo_reference.is_none() {
        warnings.push(
            "GNSS sensor without episode.geo_reference - fixes use latitude/longitude 0"
                .to_string(),
        );
    }

    for actor in blueprint.actors.iter().filter(|a| !a.registered) {
        warnings.push(format!(
            "Actor '{}' is unregistered and will get a placeholder identity when struck",
            actor.id
        ));
    }

    if blueprint.episode.frames == 0 {
        warnings.push("episode.frames is 0 - run does nothing without --frames".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Scenario is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Map: {}", summary.map);
            println!("  Frames: {}", summary.frames);
            println!("  Actors: {}", summary.actor_count);
            println!("  Sensors: {}", summary.sensor_count);
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Scenario is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
