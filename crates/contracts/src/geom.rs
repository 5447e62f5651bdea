//! Geometry primitives: location, rotation, rigid transform, 3D vector.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// 3D vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or zero for a zero-length input.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > f64::EPSILON {
            self * (1.0 / len)
        } else {
            Self::ZERO
        }
    }
}

impl Add for Vector3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vector3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Position (x, y, z)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn as_vector(self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn distance(self, other: Self) -> f64 {
        (other.as_vector() - self.as_vector()).length()
    }
}

impl From<Vector3> for Location {
    fn from(v: Vector3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl Add<Vector3> for Location {
    type Output = Self;
    fn add(self, rhs: Vector3) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

/// Rotation (pitch, yaw, roll) in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

impl Rotation {
    #[inline]
    pub const fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Unit forward (x) axis of this rotation.
    ///
    /// Roll does not affect the forward axis.
    pub fn forward_vector(&self) -> Vector3 {
        let (sp, cp) = self.pitch.to_radians().sin_cos();
        let (sy, cy) = self.yaw.to_radians().sin_cos();
        Vector3::new(cy * cp, sy * cp, sp)
    }
}

/// Rigid transform: location + rotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub location: Location,
    pub rotation: Rotation,
}

impl Transform {
    #[inline]
    pub const fn new(location: Location, rotation: Rotation) -> Self {
        Self { location, rotation }
    }

    #[inline]
    pub fn forward_vector(&self) -> Vector3 {
        self.rotation.forward_vector()
    }

    /// Map a point from this transform's local frame into the parent frame.
    pub fn transform_point(&self, point: Location) -> Location {
        let (sp, cp) = self.rotation.pitch.to_radians().sin_cos();
        let (sy, cy) = self.rotation.yaw.to_radians().sin_cos();
        let (sr, cr) = self.rotation.roll.to_radians().sin_cos();

        let x_axis = Vector3::new(cp * cy, cp * sy, sp);
        let y_axis = Vector3::new(sr * sp * cy - cr * sy, sr * sp * sy + cr * cy, -sr * cp);
        let z_axis = Vector3::new(-(cr * sp * cy + sr * sy), cy * sr - cr * sp * sy, cr * cp);

        self.location + (x_axis * point.x + y_axis * point.y + z_axis * point.z)
    }

    /// Pose of a child attached at `relative` to this transform.
    ///
    /// Rotations are composed by summing angles, which is exact when the
    /// parent only yaws (the ground-vehicle case).
    pub fn compose(&self, relative: &Transform) -> Transform {
        Transform {
            location: self.transform_point(relative.location),
            rotation: Rotation::new(
                self.rotation.pitch + relative.rotation.pitch,
                self.rotation.yaw + relative.rotation.yaw,
                self.rotation.roll + relative.rotation.roll,
            ),
        }
    }
}
