//! World query capability
//!
//! The host supplies an implementation of [`WorldQuery`]; sensors only ever
//! describe *what* to sweep.

use serde::{Deserialize, Serialize};

use crate::{Centimeters, EngineHandle, HitResult, Location};

/// Coarse target filter for a sweep
///
/// A binary split between dynamic objects and static world geometry rather
/// than a collision-layer system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepFilter {
    /// Only objects flagged as dynamic
    AllDynamicObjects,
    /// Only static world geometry
    WorldStatic,
}

/// Sphere sweep from `start` to `end`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRequest {
    pub start: Location,
    pub end: Location,
    pub radius: Centimeters,
    pub filter: SweepFilter,

    /// Handles excluded from hit candidates
    pub ignored: Vec<EngineHandle>,

    /// When set, the host records the sweep for debug drawing under this tag
    pub debug_tag: Option<String>,
}

impl SweepRequest {
    pub fn is_ignored(&self, handle: EngineHandle) -> bool {
        self.ignored.contains(&handle)
    }
}

/// Scene query capability provided by the simulation host
pub trait WorldQuery {
    /// Closest blocking hit along the sweep, if any
    fn sweep_single(&self, request: &SweepRequest) -> Option<HitResult>;
}

impl<T: WorldQuery + ?Sized> WorldQuery for &T {
    fn sweep_single(&self, request: &SweepRequest) -> Option<HitResult> {
        (**self).sweep_single(request)
    }
}
