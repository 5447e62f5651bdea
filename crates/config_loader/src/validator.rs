//! Blueprint validation
//!
//! Rules:
//! - episode and sink fields pass their `validator` range checks
//! - actor ids unique, sensor ids unique, sink names unique
//! - sensor ids are non-empty `[A-Za-z0-9_-]` (they name output files)
//! - sensor parents refer to declared actors
//! - collision and GNSS sensors are attached to a parent
//! - collider dimensions strictly positive

use std::collections::HashSet;

use contracts::{ContractError, ScenarioBlueprint, SensorType, ShapeConfig};
use validator::{Validate, ValidationErrors};

/// First violation found, or `Ok(())`
pub fn validate(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    blueprint
        .episode
        .validate()
        .map_err(|e| field_errors("episode", &e))?;
    validate_actors(blueprint)?;
    validate_sensors(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

fn field_errors(prefix: &str, errors: &ValidationErrors) -> ContractError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    match fields.first() {
        Some((field, errs)) => {
            let detail = errs
                .iter()
                .map(|e| e.code.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            ContractError::config_validation(
                format!("{prefix}.{field}"),
                format!("invalid value ({detail})"),
            )
        }
        None => ContractError::config_validation(prefix, errors.to_string()),
    }
}

fn validate_actors(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for actor in &blueprint.actors {
        if !seen.insert(&actor.id) {
            return Err(ContractError::config_validation(
                format!("actors[id={}]", actor.id),
                "duplicate actor id",
            ));
        }
        let valid = match actor.shape {
            ShapeConfig::Sphere { radius } => radius > 0.0,
            ShapeConfig::Box { half_extents } => {
                half_extents.x > 0.0 && half_extents.y > 0.0 && half_extents.z > 0.0
            }
        };
        if !valid {
            return Err(ContractError::config_validation(
                format!("actors[{}].shape", actor.id),
                "collider dimensions must be > 0",
            ));
        }
    }
    Ok(())
}

fn validate_sensors(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    let actor_ids: HashSet<_> = blueprint.actors.iter().map(|a| a.id.as_str()).collect();
    let mut seen = HashSet::new();

    for sensor in &blueprint.sensors {
        if !is_file_safe_id(&sensor.id) {
            return Err(ContractError::config_validation(
                format!("sensors[id={}]", sensor.id),
                "sensor id must be non-empty and use only [A-Za-z0-9_-]",
            ));
        }
        if !seen.insert(&sensor.id) {
            return Err(ContractError::config_validation(
                format!("sensors[id={}]", sensor.id),
                "duplicate sensor id",
            ));
        }
        match &sensor.parent {
            Some(parent) if !actor_ids.contains(parent.as_str()) => {
                return Err(ContractError::config_validation(
                    format!("sensors[{}].parent", sensor.id),
                    format!("parent actor '{parent}' not found"),
                ));
            }
            None if matches!(sensor.sensor_type, SensorType::Collision | SensorType::Gnss) => {
                return Err(ContractError::config_validation(
                    format!("sensors[{}].parent", sensor.id),
                    format!("{} sensors must be attached to an actor", sensor.sensor_type),
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

fn is_file_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn validate_sinks(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        sink.validate()
            .map_err(|e| field_errors(&format!("sinks[{idx}]"), &e))?;
        if !seen.insert(&sink.name) {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                format!("duplicate sink name '{}'", sink.name),
            ));
        }
    }
    Ok(())
}
