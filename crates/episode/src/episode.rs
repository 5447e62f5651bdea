//! Episode - the running session

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use contracts::ActorSnapshot;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::proxy::EpisodeProxy;
use crate::registry::ActorRegistry;

/// Simulation clock value
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Timestamp {
    /// Frames elapsed since the episode started
    pub frame: u64,

    /// Simulated seconds elapsed since the episode started
    pub elapsed_seconds: f64,

    /// Length of the last step (seconds)
    pub delta_seconds: f64,
}

/// Simulation session
///
/// Always lives behind an `Arc`; obtain one through [`Episode::start`].
#[derive(Debug)]
pub struct Episode {
    id: u64,
    map_name: String,
    geo_reference: Option<String>,
    clock: RwLock<Timestamp>,
    actors: ActorRegistry,
    ended: AtomicBool,
    collisions: AtomicU64,
}

impl Episode {
    /// Start a new episode and return the owning handle
    pub fn start(
        id: u64,
        map_name: impl Into<String>,
        geo_reference: Option<String>,
    ) -> EpisodeProxy {
        let episode = Self {
            id,
            map_name: map_name.into(),
            geo_reference,
            clock: RwLock::new(Timestamp::default()),
            actors: ActorRegistry::new(),
            ended: AtomicBool::new(false),
            collisions: AtomicU64::new(0),
        };
        info!(episode_id = id, map = %episode.map_name, "episode started");
        EpisodeProxy::from_arc(Arc::new(episode))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    pub fn geo_reference(&self) -> Option<&str> {
        self.geo_reference.as_deref()
    }

    pub fn actors(&self) -> &ActorRegistry {
        &self.actors
    }

    /// Current clock value
    pub fn timestamp(&self) -> Timestamp {
        *self.clock.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Step the clock by one frame
    pub fn advance(&self, delta_seconds: f64) -> Timestamp {
        let mut clock = self.clock.write().unwrap_or_else(|e| e.into_inner());
        clock.frame += 1;
        clock.elapsed_seconds += delta_seconds;
        clock.delta_seconds = delta_seconds;
        *clock
    }

    /// Mark the session finished; weak handles report expired from now on
    pub fn end(&self) {
        if !self.ended.swap(true, Ordering::SeqCst) {
            let ts = self.timestamp();
            info!(episode_id = self.id, frame = ts.frame, "episode ended");
        }
    }

    pub fn has_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    /// Count a collision between two actors
    pub fn record_collision(&self, actor: &ActorSnapshot, other: &ActorSnapshot) {
        self.collisions.fetch_add(1, Ordering::Relaxed);
        debug!(
            episode_id = self.id,
            actor_id = actor.id,
            other_id = other.id,
            "collision recorded"
        );
    }

    pub fn collision_count(&self) -> u64 {
        self.collisions.load(Ordering::Relaxed)
    }
}
