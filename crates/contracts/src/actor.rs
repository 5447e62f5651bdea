//! Logical actor identities
//!
//! An actor's logical identity is stable for the lifetime of a session and
//! independent of the engine handle that backs it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical actor id, session-scoped, never reused
pub type ActorId = u32;

/// Type id given to actors that were never registered but got struck or detected
pub const PLACEHOLDER_TYPE_ID: &str = "static.unregistered";

/// Engine-native handle of a simulated object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineHandle(pub u64);

impl fmt::Display for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Serialized view of an actor, as carried inside sensor events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    /// Logical id
    pub id: ActorId,

    /// Blueprint type (e.g. "vehicle.tesla.model3")
    pub type_id: String,

    /// Parent actor, if attached
    pub parent_id: Option<ActorId>,

    /// True when the identity was synthesized on first sight
    pub placeholder: bool,
}

impl ActorSnapshot {
    /// Placeholder identity for an untracked engine object
    pub fn placeholder(id: ActorId) -> Self {
        Self {
            id,
            type_id: PLACEHOLDER_TYPE_ID.to_string(),
            parent_id: None,
            placeholder: true,
        }
    }
}

impl fmt::Display for ActorSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Actor(id={}, type={})", self.id, self.type_id)
    }
}
