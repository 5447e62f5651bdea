//! # Integration Tests
//!
//! Cross-crate scenarios, no CARLA server required:
//! - obstacle probe behavior against a simulated world
//! - simulation -> stream -> dispatcher -> file sink
//! - readings outliving their episode

#[cfg(test)]
mod probe_scenarios {
    use std::sync::{Arc, Mutex};

    use contracts::{
        EventSink, Location, Meters, Mobility, Rotation, SensorEvent, Transform, Vector3,
    };
    use episode::Episode;
    use sensor_actors::ObstacleDetectorConfig;
    use sim_world::{Collider, Simulation};

    #[derive(Default)]
    struct CollectSink(Mutex<Vec<SensorEvent>>);

    impl CollectSink {
        fn take(&self) -> Vec<SensorEvent> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    impl EventSink for CollectSink {
        fn name(&self) -> &str {
            "collect"
        }

        fn send(&self, event: SensorEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    const OBSTACLE_RADIUS_CM: f64 = 1.0;

    /// Probe at the origin facing +x: 500 cm range, 10 cm sweep radius
    fn probe_config(only_dynamics: bool) -> ObstacleDetectorConfig {
        ObstacleDetectorConfig {
            distance: Meters(5.0),
            hit_radius: Meters(0.1),
            only_dynamics,
            debug_linetrace: false,
        }
    }

    fn simulation(
        obstacle: Option<Mobility>,
        only_dynamics: bool,
    ) -> (Simulation, Arc<CollectSink>) {
        let sink = Arc::new(CollectSink::default());
        let episode = Episode::start(1, "Town01", None);
        let mut sim = Simulation::new(episode, 0.05, sink.clone());

        if let Some(mobility) = obstacle {
            let handle = sim.world_mut().spawn(
                Transform::new(Location::new(250.0, 0.0, 0.0), Rotation::default()),
                Collider::Sphere {
                    radius: OBSTACLE_RADIUS_CM,
                },
                mobility,
                Vector3::ZERO,
            );
            sim.episode()
                .actors()
                .register(handle, "static.prop.cone", None)
                .unwrap();
        }

        sim.add_obstacle_detector(
            "probe",
            None,
            Transform::default(),
            probe_config(only_dynamics),
        )
        .unwrap();
        (sim, sink)
    }

    #[test]
    fn static_obstacle_halfway_is_detected_once() {
        let (mut sim, sink) = simulation(Some(Mobility::Static), false);

        let report = sim.tick().unwrap();
        assert_eq!(report.obstacle_events, 1);

        let events = sink.take();
        assert_eq!(events.len(), 1);
        let SensorEvent::Obstacle(event) = &events[0] else {
            panic!("expected obstacle event");
        };

        // contact is on the near side of the obstacle, within both radii
        let tolerance = 10.0 + OBSTACLE_RADIUS_CM;
        assert!(
            (event.distance.value() - 250.0).abs() <= tolerance,
            "distance {}",
            event.distance.value()
        );
        assert_eq!(event.hit_radius.value(), 10.0);
        assert_eq!(event.header.frame, 1);

        let other = event.other_actor.as_ref().unwrap();
        assert_eq!(other.type_id, "static.prop.cone");
        assert!(!other.placeholder);
        assert_eq!(event.actor.type_id, "sensor.other.obstacle");
    }

    #[test]
    fn dynamics_only_ignores_static_obstacle() {
        let (mut sim, sink) = simulation(Some(Mobility::Static), true);

        let report = sim.tick().unwrap();
        assert_eq!(report.obstacle_events, 0);
        assert!(sink.take().is_empty());
    }

    #[test]
    fn dynamics_only_sees_dynamic_obstacle() {
        let (mut sim, sink) = simulation(Some(Mobility::Dynamic), true);

        sim.tick().unwrap();
        assert_eq!(sink.take().len(), 1);
    }

    #[test]
    fn empty_sweep_has_no_side_effects() {
        let (mut sim, sink) = simulation(None, false);
        let actors_before = sim.episode().actors().snapshot_all();

        for _ in 0..3 {
            let report = sim.tick().unwrap();
            assert_eq!(report.events(), 0);
        }

        assert!(sink.take().is_empty());
        assert_eq!(sim.episode().actors().snapshot_all(), actors_before);
        assert_eq!(sim.episode().collision_count(), 0);
    }

    #[test]
    fn unregistered_obstacle_gets_one_placeholder() {
        let sink = Arc::new(CollectSink::default());
        let episode = Episode::start(1, "Town01", None);
        let mut sim = Simulation::new(episode, 0.05, sink.clone());
        sim.world_mut().spawn(
            Transform::new(Location::new(250.0, 0.0, 0.0), Rotation::default()),
            Collider::Sphere { radius: 20.0 },
            Mobility::Static,
            Vector3::ZERO,
        );
        sim.add_obstacle_detector("probe", None, Transform::default(), probe_config(false))
            .unwrap();
        let known_before = sim.episode().actors().len();

        sim.tick().unwrap();
        sim.tick().unwrap();

        let events = sink.take();
        assert_eq!(events.len(), 2);
        let ids: Vec<_> = events
            .iter()
            .map(|e| match e {
                SensorEvent::Obstacle(o) => o.other_actor.as_ref().unwrap().clone(),
                SensorEvent::Collision(_) => panic!("unexpected collision"),
            })
            .collect();
        assert!(ids[0].placeholder);
        assert_eq!(ids[0], ids[1]);
        assert_eq!(sim.episode().actors().len(), known_before + 1);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::fs;
    use std::sync::Arc;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{EventSink, SinkConfig, SinkType};
    use dispatcher::{create_dispatcher, DataStream};
    use sensor_data::{SensorDataBase, SensorMeasurement};
    use serde_json::Value;
    use sim_world::Simulation;

    const SCENARIO: &str = include_str!("../../../configs/obstacle_scenario.toml");

    fn read_jsonl(path: &std::path::Path) -> Vec<Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// Bundled scenario -> DataStream -> Dispatcher -> FileSink
    #[tokio::test]
    async fn test_e2e_scenario_to_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let mut blueprint = ConfigLoader::load_from_str(SCENARIO, ConfigFormat::Toml).unwrap();
        blueprint.sinks = vec![SinkConfig {
            name: "file".to_string(),
            sink_type: SinkType::File,
            queue_capacity: 1024,
            params: HashMap::from([(
                "base_path".to_string(),
                dir.path().display().to_string(),
            )]),
        }];

        let (stream, rx) = DataStream::channel("e2e", 1024);
        let stream = Arc::new(stream);
        let mut sim =
            Simulation::from_blueprint(&blueprint, 1, Arc::clone(&stream) as Arc<dyn EventSink>)
                .unwrap();

        let gnss = sim.gnss_sensor("gnss").unwrap();
        let gnss_stream = Arc::clone(&stream);
        let gnss_id = gnss.sensor_id().clone();
        gnss.listen(Arc::new(move |reading: Arc<SensorMeasurement>| {
            if let Some(fix) = reading.as_gnss() {
                gnss_stream.send_gnss(&gnss_id, fix);
            }
        }));

        let dispatcher = create_dispatcher(blueprint.sinks.clone(), sim.episode().downgrade(), rx)
            .unwrap();
        let handle = dispatcher.spawn();

        let frames = blueprint.episode.frames;
        let reports = sim.run(frames).unwrap();
        let obstacle_events: usize = reports.iter().map(|r| r.obstacle_events).sum();

        gnss.stop();
        drop(gnss);
        sim.end();
        drop(sim);
        assert_eq!(stream.metrics().snapshot().dropped_count, 0);
        drop(stream);

        let metrics = handle.await.unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].0, "file");
        assert_eq!(metrics[0].1.failure_count, 0);

        // one GNSS fix per frame, in frame order
        let fixes = read_jsonl(&dir.path().join("gnss.jsonl"));
        assert_eq!(fixes.len() as u64, frames);
        for (i, fix) in fixes.iter().enumerate() {
            assert_eq!(fix["kind"], "gnss");
            assert_eq!(fix["frame"], i as u64 + 1);
            assert!((fix["altitude"].as_f64().unwrap() - 1.5).abs() < 1e-9);
        }

        // the ego closes on the parked car, so the front probe fires
        let front = read_jsonl(&dir.path().join("front_obstacle.jsonl"));
        assert!(!front.is_empty());
        assert!(front.len() <= obstacle_events);
        for event in &front {
            assert_eq!(event["kind"], "obstacle");
            assert_eq!(event["hit_radius"], 0.5);
            let distance = event["distance"].as_f64().unwrap();
            assert!((0.0..=10.0).contains(&distance), "distance {distance}");
            assert_eq!(event["other_actor"]["type_id"], "vehicle.audi.tt");
        }

        // the bumpers meet at frame 63; a lasting contact is reported once
        let collisions = read_jsonl(&dir.path().join("collision.jsonl"));
        assert_eq!(collisions.len(), 1);
        let hit = &collisions[0];
        assert_eq!(hit["kind"], "collision");
        assert_eq!(hit["frame"], 63);
        assert_eq!(hit["actor"]["type_id"], "vehicle.tesla.model3");
        assert_eq!(hit["other_actor"]["type_id"], "vehicle.audi.tt");
        // 500 cm/s closing speed, in meters
        let impulse = hit["normal_impulse"]["x"].as_f64().unwrap();
        assert!((impulse + 5.0).abs() < 1e-9, "impulse {impulse}");
    }

    /// Readings that outlive their episode report it as expired
    #[tokio::test]
    async fn test_readings_outlive_episode() {
        let blueprint = ConfigLoader::load_from_str(SCENARIO, ConfigFormat::Toml).unwrap();
        let (stream, mut rx) = DataStream::channel("expiry", 1024);
        let mut sim = Simulation::from_blueprint(&blueprint, 9, Arc::new(stream)).unwrap();
        let weak = sim.episode().downgrade();

        let mut frames = 0;
        while frames < blueprint.episode.frames && rx.is_empty() {
            sim.tick().unwrap();
            frames += 1;
        }
        let message = rx.recv().await.expect("at least one event");
        let raw = contracts::RawBuffer::decode(message.buffer).unwrap();
        let reading = sensor_data::deserialize(raw, weak.clone()).unwrap();
        let obstacle = reading.as_obstacle().expect("obstacle event");
        assert!(obstacle.actor().is_some());

        sim.end();
        assert!(weak.try_lock().is_none());
        assert!(obstacle.actor().is_none());
        assert!(obstacle.other_actor().is_none());
        // the serialized identities survive
        assert_eq!(obstacle.actor_snapshot().type_id, "sensor.other.obstacle");

        assert!(sim.tick().is_err());

        drop(sim);
        assert!(weak.is_expired());
        // envelope fields are plain values, unaffected by expiry
        assert_eq!(reading.frame(), frames);
        assert!((reading.timestamp() - frames as f64 * 0.05).abs() < 1e-9);
    }
}
