//! Blueprint attribute parsing
//!
//! Attributes arrive as strings. Missing or unparsable values fall back to
//! a caller-supplied default instead of failing.

use std::collections::HashMap;

use contracts::Meters;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Float attribute, or `default`
pub fn retrieve_float(attributes: &HashMap<String, String>, key: &str, default: f64) -> f64 {
    match attributes.get(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => value,
            _ => {
                warn!(
                    attribute = key,
                    value = %raw,
                    default,
                    "invalid float attribute, using default"
                );
                default
            }
        },
    }
}

/// Bool attribute (`true`/`false`, case-insensitive), or `default`
pub fn retrieve_bool(attributes: &HashMap<String, String>, key: &str, default: bool) -> bool {
    match attributes.get(key) {
        None => default,
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" => true,
            "false" => false,
            _ => {
                warn!(
                    attribute = key,
                    value = %raw,
                    default,
                    "invalid bool attribute, using default"
                );
                default
            }
        },
    }
}

/// Obstacle detector tunables, client units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleDetectorConfig {
    /// Sweep length
    pub distance: Meters,

    /// Sweep sphere radius
    pub hit_radius: Meters,

    /// Sweep dynamic objects instead of static world geometry
    pub only_dynamics: bool,

    /// Ask the host to record the sweep for debug drawing
    pub debug_linetrace: bool,
}

impl Default for ObstacleDetectorConfig {
    fn default() -> Self {
        Self {
            distance: Meters(5.0),
            hit_radius: Meters(0.5),
            only_dynamics: false,
            debug_linetrace: false,
        }
    }
}

impl ObstacleDetectorConfig {
    /// Read `distance`, `hit_radius`, `only_dynamics`, `debug_linetrace`
    pub fn from_attributes(attributes: &HashMap<String, String>) -> Self {
        Self::from_attributes_or(attributes, Self::default())
    }

    /// Same as [`from_attributes`](Self::from_attributes) with explicit defaults
    pub fn from_attributes_or(attributes: &HashMap<String, String>, defaults: Self) -> Self {
        let config = Self {
            distance: Meters(retrieve_float(attributes, "distance", defaults.distance.value())),
            hit_radius: Meters(retrieve_float(
                attributes,
                "hit_radius",
                defaults.hit_radius.value(),
            )),
            only_dynamics: retrieve_bool(attributes, "only_dynamics", defaults.only_dynamics),
            debug_linetrace: retrieve_bool(attributes, "debug_linetrace", defaults.debug_linetrace),
        };
        debug!(
            distance = %config.distance,
            hit_radius = %config.hit_radius,
            only_dynamics = config.only_dynamics,
            debug_linetrace = config.debug_linetrace,
            "obstacle detector configured"
        );
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_when_missing() {
        let config = ObstacleDetectorConfig::from_attributes(&HashMap::new());
        assert_eq!(config, ObstacleDetectorConfig::default());
    }

    #[test]
    fn test_parses_all_attributes() {
        let config = ObstacleDetectorConfig::from_attributes(&attrs(&[
            ("distance", "10.0"),
            ("hit_radius", "0.25"),
            ("only_dynamics", "True"),
            ("debug_linetrace", "true"),
        ]));
        assert_eq!(config.distance, Meters(10.0));
        assert_eq!(config.hit_radius, Meters(0.25));
        assert!(config.only_dynamics);
        assert!(config.debug_linetrace);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let defaults = ObstacleDetectorConfig {
            distance: Meters(3.0),
            ..Default::default()
        };
        let config = ObstacleDetectorConfig::from_attributes_or(
            &attrs(&[("distance", "far"), ("only_dynamics", "yes"), ("hit_radius", "NaN")]),
            defaults,
        );
        assert_eq!(config.distance, Meters(3.0));
        assert_eq!(config.hit_radius, Meters(0.5));
        assert!(!config.only_dynamics);
    }
}
