//! Typed length quantities
//!
//! The engine works in centimeters, clients and configuration in meters.
//! Keeping both as distinct types makes every conversion explicit.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geom::{Location, Transform, Vector3};

const CENTIMETERS_PER_METER: f64 = 100.0;

/// Length in meters (client / configuration units)
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

/// Length in centimeters (engine units)
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Centimeters(pub f64);

impl Meters {
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn to_centimeters(self) -> Centimeters {
        Centimeters(self.0 * CENTIMETERS_PER_METER)
    }
}

impl Centimeters {
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn to_meters(self) -> Meters {
        Meters(self.0 / CENTIMETERS_PER_METER)
    }
}

fn cm_to_m(value: f64) -> f64 {
    Centimeters(value).to_meters().value()
}

// Engine-space geometry carries plain f64 components in centimeters.

impl Vector3 {
    pub fn to_meters(self) -> Self {
        Self::new(cm_to_m(self.x), cm_to_m(self.y), cm_to_m(self.z))
    }
}

impl Location {
    pub fn to_meters(self) -> Self {
        Self::new(cm_to_m(self.x), cm_to_m(self.y), cm_to_m(self.z))
    }
}

impl Transform {
    /// Location converted, rotation unchanged
    pub fn to_meters(self) -> Self {
        Self::new(self.location.to_meters(), self.rotation)
    }
}

impl From<Meters> for Centimeters {
    fn from(m: Meters) -> Self {
        m.to_centimeters()
    }
}

impl From<Centimeters> for Meters {
    fn from(cm: Centimeters) -> Self {
        cm.to_meters()
    }
}

impl fmt::Display for Meters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}

impl fmt::Display for Centimeters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}cm", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meters_to_centimeters() {
        assert_eq!(Meters(5.0).to_centimeters(), Centimeters(500.0));
        assert_eq!(Centimeters::from(Meters(0.1)).value(), 10.0);
    }

    #[test]
    fn test_centimeters_to_meters() {
        assert_eq!(Centimeters(250.0).to_meters(), Meters(2.5));
    }

    #[test]
    fn test_geometry_to_meters() {
        let pose = Transform::new(
            Location::new(250.0, -50.0, 150.0),
            crate::geom::Rotation::new(0.0, 90.0, 0.0),
        );
        let converted = pose.to_meters();
        assert_eq!(converted.location, Location::new(2.5, -0.5, 1.5));
        assert_eq!(converted.rotation, pose.rotation);
        assert_eq!(
            Vector3::new(-400.0, 0.0, 10.0).to_meters(),
            Vector3::new(-4.0, 0.0, 0.1)
        );
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&Meters(1.5)).unwrap();
        assert_eq!(json, "1.5");
    }
}
