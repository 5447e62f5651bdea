//! Collision reading

use contracts::{ActorSnapshot, Vector3};

use crate::data::{SensorData, SensorDataBase};

/// A collision of the sensor's parent with another actor
#[derive(Debug, Clone)]
pub struct CollisionEvent {
    base: SensorData,
    actor: ActorSnapshot,
    other_actor: ActorSnapshot,
    normal_impulse: Vector3,
}

impl CollisionEvent {
    pub fn new(
        base: SensorData,
        actor: ActorSnapshot,
        other_actor: ActorSnapshot,
        normal_impulse: Vector3,
    ) -> Self {
        Self {
            base,
            actor,
            other_actor,
            normal_impulse,
        }
    }

    pub fn actor_snapshot(&self) -> &ActorSnapshot {
        &self.actor
    }

    pub fn other_actor_snapshot(&self) -> &ActorSnapshot {
        &self.other_actor
    }

    /// Parent actor as currently known to the episode
    pub fn actor(&self) -> Option<ActorSnapshot> {
        let episode = self.base.episode().try_lock()?;
        episode.actors().find(self.actor.id)
    }

    /// Other actor as currently known to the episode
    pub fn other_actor(&self) -> Option<ActorSnapshot> {
        let episode = self.base.episode().try_lock()?;
        episode.actors().find(self.other_actor.id)
    }

    /// Normal impulse of the collision (N·s)
    pub fn normal_impulse(&self) -> Vector3 {
        self.normal_impulse
    }
}

impl SensorDataBase for CollisionEvent {
    fn base(&self) -> &SensorData {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{EngineHandle, Transform};
    use episode::Episode;

    #[test]
    fn test_other_actor_may_be_a_placeholder() {
        let episode = Episode::start(1, "Town01", None);
        let ego = episode
            .actors()
            .register(EngineHandle(1), "vehicle.tesla.model3", None)
            .unwrap();
        let wall = episode.actors().find_or_fake(EngineHandle(7));

        let event = CollisionEvent::new(
            SensorData::new(5, 0.25, Transform::default()).with_episode(episode.downgrade()),
            ego.clone(),
            wall.clone(),
            Vector3::new(-4.0, 0.0, 0.0),
        );
        assert_eq!(event.actor(), Some(ego));
        assert_eq!(event.other_actor(), Some(wall));
        assert!(event.other_actor_snapshot().placeholder);

        drop(episode);
        assert_eq!(event.actor(), None);
        assert_eq!(event.normal_impulse().x, -4.0);
        assert_eq!(event.frame(), 5);
    }
}
