//! Frame scheduler
//!
//! Owns the episode, the world and every sensor. Each [`Simulation::tick`]
//! advances the clock, integrates the world, then runs sensors in order:
//! collision, obstacle, GNSS.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use contracts::{
    EngineHandle, EventSink, ScenarioBlueprint, SensorEvent, SensorType, Transform,
};
use episode::{Episode, EpisodeError, EpisodeProxy};
use sensor_actors::{CollisionSensor, ObstacleDetectionSensor, ObstacleDetectorConfig};
use sensor_data::GnssSensor;
use tracing::{debug, info, instrument, trace};

use crate::error::{Result, SimError};
use crate::world::{Collider, DebugTrace, World};

/// Outcome of one simulated frame
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    pub frame: u64,
    pub elapsed_seconds: f64,
    pub obstacle_events: usize,
    pub collision_events: usize,
    pub debug_traces: Vec<DebugTrace>,
}

impl FrameReport {
    pub fn events(&self) -> usize {
        self.obstacle_events + self.collision_events
    }
}

/// Where a sensor sits: world-fixed or riding on a parent body
#[derive(Debug, Clone, Copy)]
struct Mount {
    handle: EngineHandle,
    parent: Option<EngineHandle>,
    relative: Transform,
}

pub struct Simulation {
    episode: EpisodeProxy,
    world: World,
    fixed_delta_seconds: f64,
    actor_handles: HashMap<String, EngineHandle>,
    probes: Vec<(Mount, ObstacleDetectionSensor)>,
    collision_sensors: Vec<(Mount, CollisionSensor)>,
    gnss_sensors: Vec<(Mount, Arc<GnssSensor>)>,
    active_contacts: HashSet<(EngineHandle, EngineHandle)>,
    sink: Arc<dyn EventSink>,
}

impl Simulation {
    pub fn new(episode: EpisodeProxy, fixed_delta_seconds: f64, sink: Arc<dyn EventSink>) -> Self {
        Self {
            episode,
            world: World::new(),
            fixed_delta_seconds,
            actor_handles: HashMap::new(),
            probes: Vec::new(),
            collision_sensors: Vec::new(),
            gnss_sensors: Vec::new(),
            active_contacts: HashSet::new(),
            sink,
        }
    }

    /// Start an episode and populate it from a validated blueprint
    pub fn from_blueprint(
        blueprint: &ScenarioBlueprint,
        episode_id: u64,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        let episode = Episode::start(
            episode_id,
            blueprint.episode.map.clone(),
            blueprint.episode.geo_reference.clone(),
        );
        let mut sim = Self::new(episode, blueprint.episode.fixed_delta_seconds, sink);

        for actor in &blueprint.actors {
            if sim.actor_handles.contains_key(&actor.id) {
                return Err(SimError::DuplicateActor {
                    id: actor.id.clone(),
                });
            }
            let handle = sim.world.spawn(
                actor.transform,
                Collider::from(actor.shape),
                actor.mobility,
                actor.velocity,
            );
            if actor.registered {
                sim.episode
                    .actors()
                    .register(handle, actor.blueprint.clone(), None)?;
            }
            sim.actor_handles.insert(actor.id.clone(), handle);
        }

        for sensor in &blueprint.sensors {
            let parent = match &sensor.parent {
                Some(parent) => Some(sim.handle_of(parent).ok_or_else(|| {
                    SimError::UnknownParent {
                        sensor_id: sensor.id.clone(),
                        parent: parent.clone(),
                    }
                })?),
                None => None,
            };

            match sensor.sensor_type {
                SensorType::ObstacleDetector => {
                    let config = ObstacleDetectorConfig::from_attributes(&sensor.attributes);
                    sim.add_obstacle_detector(&sensor.id, parent, sensor.transform, config)?;
                }
                SensorType::Collision => {
                    let parent = parent.ok_or_else(|| SimError::parent_required(&sensor.id))?;
                    sim.add_collision_sensor(&sensor.id, parent, sensor.transform)?;
                }
                SensorType::Gnss => {
                    let parent = parent.ok_or_else(|| SimError::parent_required(&sensor.id))?;
                    sim.add_gnss_sensor(&sensor.id, parent, sensor.transform)?;
                }
            }
        }

        info!(
            episode_id,
            map = %blueprint.episode.map,
            bodies = sim.world.len(),
            actors = sim.episode.actors().len(),
            probes = sim.probes.len(),
            "simulation ready"
        );
        Ok(sim)
    }

    pub fn episode(&self) -> &EpisodeProxy {
        &self.episode
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn fixed_delta_seconds(&self) -> f64 {
        self.fixed_delta_seconds
    }

    /// Engine handle of a blueprint actor
    pub fn handle_of(&self, actor_id: &str) -> Option<EngineHandle> {
        self.actor_handles.get(actor_id).copied()
    }

    pub fn gnss_sensor(&self, sensor_id: &str) -> Option<Arc<GnssSensor>> {
        self.gnss_sensors
            .iter()
            .find(|(_, s)| s.sensor_id() == sensor_id)
            .map(|(_, s)| Arc::clone(s))
    }

    pub fn gnss_sensors(&self) -> impl Iterator<Item = &Arc<GnssSensor>> {
        self.gnss_sensors.iter().map(|(_, s)| s)
    }

    pub fn add_obstacle_detector(
        &mut self,
        sensor_id: &str,
        parent: Option<EngineHandle>,
        relative: Transform,
        config: ObstacleDetectorConfig,
    ) -> Result<EngineHandle> {
        let mount = self.mount(SensorType::ObstacleDetector, parent, relative)?;
        let mut sensor = ObstacleDetectionSensor::new(sensor_id, mount.handle, parent, config);
        sensor.begin_play(Some(&self.episode));
        self.probes.push((mount, sensor));
        Ok(mount.handle)
    }

    pub fn add_collision_sensor(
        &mut self,
        sensor_id: &str,
        parent: EngineHandle,
        relative: Transform,
    ) -> Result<EngineHandle> {
        let mount = self.mount(SensorType::Collision, Some(parent), relative)?;
        let mut sensor = CollisionSensor::new(sensor_id, parent);
        sensor.begin_play(Some(&self.episode));
        self.collision_sensors.push((mount, sensor));
        Ok(mount.handle)
    }

    /// GNSS fixes follow a vehicle, so the sensor needs a parent body
    pub fn add_gnss_sensor(
        &mut self,
        sensor_id: &str,
        parent: EngineHandle,
        relative: Transform,
    ) -> Result<EngineHandle> {
        let mount = self.mount(SensorType::Gnss, Some(parent), relative)?;
        let sensor = Arc::new(GnssSensor::new(sensor_id, self.episode.downgrade()));
        self.gnss_sensors.push((mount, sensor));
        Ok(mount.handle)
    }

    /// Register the sensor actor, attached to its parent when tracked
    fn mount(
        &mut self,
        sensor_type: SensorType,
        parent: Option<EngineHandle>,
        relative: Transform,
    ) -> Result<Mount> {
        let handle = self.world.allocate_handle();
        let actors = self.episode.actors();
        let parent_id = parent
            .and_then(|p| actors.find_by_handle(p))
            .map(|a| a.id);
        actors.register(handle, sensor_type.blueprint_id(), parent_id)?;
        Ok(Mount {
            handle,
            parent,
            relative,
        })
    }

    fn mount_pose(&self, mount: &Mount) -> Option<Transform> {
        match mount.parent {
            Some(parent) => self
                .world
                .pose(parent)
                .map(|pose| pose.compose(&mount.relative)),
            None => Some(mount.relative),
        }
    }

    /// Simulate one frame
    #[instrument(level = "debug", skip_all, fields(episode_id = self.episode.id()))]
    pub fn tick(&mut self) -> Result<FrameReport> {
        if self.episode.has_ended() {
            return Err(EpisodeError::Expired.into());
        }
        let delta = self.fixed_delta_seconds;
        let timestamp = self.episode.advance(delta);
        self.world.step(delta);

        let mut report = FrameReport {
            frame: timestamp.frame,
            elapsed_seconds: timestamp.elapsed_seconds,
            ..Default::default()
        };

        let mut contacts = HashSet::new();
        for (mount, sensor) in &self.collision_sensors {
            let parent = sensor.parent();
            for contact in self.world.contacts(parent) {
                let key = (mount.handle, contact.other);
                contacts.insert(key);
                if self.active_contacts.contains(&key) {
                    continue;
                }
                let Some(pose) = self.mount_pose(mount) else {
                    continue;
                };
                let closing = (self.world.velocity(parent) - self.world.velocity(contact.other))
                    .dot(contact.normal)
                    .max(0.0);
                let impulse = -contact.normal * closing;
                if let Some(record) =
                    sensor.on_collision(contact.other, impulse, &pose, self.sink.as_ref())
                {
                    observability::record_sensor_event(&SensorEvent::Collision(record));
                    report.collision_events += 1;
                }
            }
        }
        self.active_contacts = contacts;

        for (mount, sensor) in &self.probes {
            let Some(pose) = self.mount_pose(mount) else {
                trace!(sensor_id = %sensor.sensor_id(), "parent gone, probe skipped");
                continue;
            };
            if let Some(event) = sensor.tick(&pose, &self.world, self.sink.as_ref()) {
                observability::record_sensor_event(&SensorEvent::Obstacle(event));
                report.obstacle_events += 1;
            }
        }

        for (mount, sensor) in &self.gnss_sensors {
            if let Some(pose) = self.mount_pose(mount) {
                sensor.on_tick(&timestamp, pose.to_meters());
            }
        }

        report.debug_traces = self.world.take_debug_traces();
        for t in &report.debug_traces {
            trace!(tag = %t.tag, start = ?t.start, end = ?t.end, hit = ?t.hit, "debug sweep");
        }

        observability::record_frame_simulated(report.frame, report.events());
        debug!(
            frame = report.frame,
            obstacles = report.obstacle_events,
            collisions = report.collision_events,
            "frame simulated"
        );
        Ok(report)
    }

    /// Simulate up to `frames` frames, stopping early if the episode ends.
    ///
    /// Reports of the frames simulated before the end are kept; any other
    /// error is returned.
    pub fn run(&mut self, frames: u64) -> Result<Vec<FrameReport>> {
        let mut reports = Vec::new();
        for _ in 0..frames {
            match self.tick() {
                Ok(report) => reports.push(report),
                Err(SimError::Episode(EpisodeError::Expired)) => {
                    debug!(
                        simulated = reports.len(),
                        requested = frames,
                        "episode ended, run stopped"
                    );
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(reports)
    }

    /// End the episode; outstanding weak handles expire
    pub fn end(&self) {
        self.episode.end();
    }
}


#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use contracts::{
        ActorConfig, EpisodeConfig, Location, Meters, Mobility, NullSink, Rotation, SensorConfig,
        ShapeConfig, Vector3,
    };
    use sensor_data::SensorMeasurement;

    use super::*;

    #[derive(Default)]
    struct CollectSink(Mutex<Vec<SensorEvent>>);

    impl EventSink for CollectSink {
        fn name(&self) -> &str {
            "collect"
        }

        fn send(&self, event: SensorEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn actor(id: &str, x: f64, mobility: Mobility, shape: ShapeConfig) -> ActorConfig {
        ActorConfig {
            id: id.into(),
            blueprint: format!("static.prop.{id}"),
            transform: Transform::new(Location::new(x, 0.0, 0.0), Rotation::default()),
            mobility,
            shape,
            velocity: Vector3::ZERO,
            registered: true,
        }
    }

    fn blueprint(actors: Vec<ActorConfig>, sensors: Vec<SensorConfig>) -> ScenarioBlueprint {
        ScenarioBlueprint {
            version: Default::default(),
            episode: EpisodeConfig {
                map: "Town01".into(),
                geo_reference: None,
                fixed_delta_seconds: 0.05,
                frames: 10,
            },
            actors,
            sensors,
            sinks: Vec::new(),
        }
    }

    fn obstacle_sensor(parent: Option<&str>, attrs: &[(&str, &str)]) -> SensorConfig {
        SensorConfig {
            id: "front".into(),
            sensor_type: SensorType::ObstacleDetector,
            parent: parent.map(String::from),
            transform: Transform::default(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let bp = blueprint(Vec::new(), vec![obstacle_sensor(Some("ghost"), &[])]);
        let err = Simulation::from_blueprint(&bp, 1, Arc::new(NullSink)).err().unwrap();
        assert!(matches!(err, SimError::UnknownParent { .. }));
    }

    #[test]
    fn test_probe_follows_parent() {
        let mut car = actor(
            "car",
            0.0,
            Mobility::Dynamic,
            ShapeConfig::Box {
                half_extents: Vector3::new(200.0, 90.0, 70.0),
            },
        );
        car.velocity = Vector3::new(1000.0, 0.0, 0.0);
        let wall = actor(
            "wall",
            1000.0,
            Mobility::Static,
            ShapeConfig::Box {
                half_extents: Vector3::new(10.0, 500.0, 300.0),
            },
        );
        let mut sensor = obstacle_sensor(Some("car"), &[("distance", "5.0")]);
        sensor.transform.location = Location::new(210.0, 0.0, 0.0);

        let sink = Arc::new(CollectSink::default());
        let mut sim =
            Simulation::from_blueprint(&blueprint(vec![car, wall], vec![sensor]), 1, sink.clone())
                .unwrap();

        // Probe tip at 210 + 500; wall face at 990 is out of reach until the car moves
        let first = sim.tick().unwrap();
        assert_eq!(first.obstacle_events, 0);

        let reports = sim.run(10).unwrap();
        assert!(reports.iter().any(|r| r.obstacle_events == 1));

        let events = sink.0.lock().unwrap();
        let SensorEvent::Obstacle(event) = &events[0] else {
            panic!("expected obstacle event");
        };
        let wall_id = sim
            .episode()
            .actors()
            .find_by_handle(sim.handle_of("wall").unwrap())
            .unwrap()
            .id;
        assert_eq!(event.other_actor.as_ref().map(|a| a.id), Some(wall_id));
        assert!(event.distance.value() <= Meters(5.0).to_centimeters().value());
    }

    #[test]
    fn test_collision_reported_once_per_contact() {
        let mut car = actor(
            "car",
            0.0,
            Mobility::Dynamic,
            ShapeConfig::Sphere { radius: 100.0 },
        );
        car.velocity = Vector3::new(400.0, 0.0, 0.0);
        let mut pole = actor("pole", 150.0, Mobility::Static, ShapeConfig::Sphere { radius: 20.0 });
        pole.registered = false;
        let collision = SensorConfig {
            id: "collision".into(),
            sensor_type: SensorType::Collision,
            parent: Some("car".into()),
            transform: Transform::default(),
            attributes: HashMap::new(),
        };

        let sink = Arc::new(CollectSink::default());
        let mut sim = Simulation::from_blueprint(
            &blueprint(vec![car, pole], vec![collision]),
            1,
            sink.clone(),
        )
        .unwrap();

        let reports = sim.run(3).unwrap();
        let total: usize = reports.iter().map(|r| r.collision_events).sum();
        assert_eq!(total, 1);
        assert_eq!(sim.episode().collision_count(), 1);

        let events = sink.0.lock().unwrap();
        let SensorEvent::Collision(record) = &events[0] else {
            panic!("expected collision");
        };
        assert!(record.other_actor.placeholder);
        // 400 cm/s closing speed, pushed back along -x, in meters
        assert!((record.normal_impulse.x + 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_gnss_reading_in_meters() {
        let sensor = SensorConfig {
            id: "gnss".into(),
            sensor_type: SensorType::Gnss,
            parent: Some("ego".into()),
            transform: Transform::new(Location::new(0.0, 0.0, 250.0), Rotation::default()),
            attributes: HashMap::new(),
        };
        let ego = actor("ego", 0.0, Mobility::Static, ShapeConfig::Sphere { radius: 50.0 });
        let mut sim =
            Simulation::from_blueprint(&blueprint(vec![ego], vec![sensor]), 1, Arc::new(NullSink))
                .unwrap();

        let readings = Arc::new(Mutex::new(Vec::new()));
        let store = readings.clone();
        sim.gnss_sensor("gnss")
            .unwrap()
            .listen(Arc::new(move |reading: Arc<SensorMeasurement>| {
                store.lock().unwrap().push(reading);
            }));

        sim.tick().unwrap();
        let readings = readings.lock().unwrap();
        assert_eq!(readings.len(), 1);
        let fix = readings[0].as_gnss().unwrap();
        assert!((fix.altitude() - 2.5).abs() < 1e-12);
        assert!((fix.latitude() - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_tick_after_end_fails() {
        let mut sim =
            Simulation::from_blueprint(&blueprint(Vec::new(), Vec::new()), 1, Arc::new(NullSink))
                .unwrap();
        sim.tick().unwrap();
        sim.end();
        assert!(matches!(
            sim.tick(),
            Err(SimError::Episode(EpisodeError::Expired))
        ));
    }

    #[test]
    fn test_run_stops_when_episode_ends() {
        let mut sim =
            Simulation::from_blueprint(&blueprint(Vec::new(), Vec::new()), 1, Arc::new(NullSink))
                .unwrap();

        let reports = sim.run(2).unwrap();
        assert_eq!(reports.iter().map(|r| r.frame).collect::<Vec<_>>(), vec![1, 2]);

        sim.end();
        assert!(sim.run(3).unwrap().is_empty());
    }

    #[test]
    fn test_gnss_requires_parent() {
        let sensor = SensorConfig {
            id: "gnss".into(),
            sensor_type: SensorType::Gnss,
            parent: None,
            transform: Transform::default(),
            attributes: HashMap::new(),
        };
        let result =
            Simulation::from_blueprint(&blueprint(Vec::new(), vec![sensor]), 1, Arc::new(NullSink));
        assert!(matches!(result, Err(SimError::ParentRequired { .. })));
    }
}
