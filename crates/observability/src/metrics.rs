//! Metric recording and the in-memory run summary
//!
//! All metric names carry the `carla_obstacle_` prefix.

use std::collections::HashMap;
use std::fmt;

use contracts::{SensorEvent, SensorType};
use metrics::{counter, gauge, histogram};

/// One simulated frame
pub fn record_frame_simulated(frame: u64, events: usize) {
    counter!("carla_obstacle_frames_total").increment(1);
    gauge!("carla_obstacle_last_frame").set(frame as f64);
    histogram!("carla_obstacle_events_per_frame").record(events as f64);
}

/// Event produced by a host-side sensor
pub fn record_sensor_event(event: &SensorEvent) {
    let sensor_id = event.sensor_id().to_string();
    match event {
        SensorEvent::Obstacle(e) => {
            counter!("carla_obstacle_detections_total", "sensor_id" => sensor_id.clone())
                .increment(1);
            histogram!("carla_obstacle_hit_distance_m", "sensor_id" => sensor_id)
                .record(e.distance.to_meters().value());
            if e.other_actor.as_ref().is_some_and(|a| a.placeholder) {
                counter!("carla_obstacle_placeholder_hits_total").increment(1);
            }
        }
        SensorEvent::Collision(_) => {
            counter!("carla_obstacle_collisions_total", "sensor_id" => sensor_id).increment(1);
        }
    }
}

/// Event dropped because a stream queue was full or closed
pub fn record_event_dropped(stream: &str) {
    counter!("carla_obstacle_events_dropped_total", "stream" => stream.to_string()).increment(1);
}

/// Reading handed to a sink
pub fn record_reading_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "carla_obstacle_readings_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Raw buffer that could not be turned into a reading
pub fn record_decode_failure(sensor_type: Option<SensorType>) {
    let label = sensor_type.map_or("unknown", |t| t.blueprint_id());
    counter!("carla_obstacle_decode_failures_total", "sensor_type" => label).increment(1);
}

/// Per-run event statistics, aggregated in memory
#[derive(Debug, Clone, Default)]
pub struct DetectionAggregator {
    pub frames: u64,
    pub detections: u64,
    pub collisions: u64,
    /// Detections whose struck identity was synthesized
    pub placeholder_hits: u64,
    /// Detections on geometry with no owning actor
    pub ownerless_hits: u64,
    /// Hit distance (m) per sensor
    pub distance_stats: HashMap<String, RunningStats>,
}

impl DetectionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame(&mut self) {
        self.frames += 1;
    }

    pub fn update(&mut self, event: &SensorEvent) {
        match event {
            SensorEvent::Obstacle(e) => {
                self.detections += 1;
                match &e.other_actor {
                    Some(other) if other.placeholder => self.placeholder_hits += 1,
                    Some(_) => {}
                    None => self.ownerless_hits += 1,
                }
                self.distance_stats
                    .entry(e.header.sensor_id.to_string())
                    .or_default()
                    .push(e.distance.to_meters().value());
            }
            SensorEvent::Collision(_) => self.collisions += 1,
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            frames: self.frames,
            detections: self.detections,
            collisions: self.collisions,
            placeholder_hits: self.placeholder_hits,
            ownerless_hits: self.ownerless_hits,
            detection_rate: if self.frames > 0 {
                self.detections as f64 / self.frames as f64
            } else {
                0.0
            },
            distance_m: self
                .distance_stats
                .iter()
                .map(|(sensor, stats)| (sensor.clone(), StatsSummary::from(stats)))
                .collect(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub frames: u64,
    pub detections: u64,
    pub collisions: u64,
    pub placeholder_hits: u64,
    pub ownerless_hits: u64,
    /// Detections per frame
    pub detection_rate: f64,
    pub distance_m: HashMap<String, StatsSummary>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Run Summary ===")?;
        writeln!(f, "Frames: {}", self.frames)?;
        writeln!(
            f,
            "Detections: {} ({:.2} per frame)",
            self.detections, self.detection_rate
        )?;
        writeln!(f, "Collisions: {}", self.collisions)?;
        writeln!(
            f,
            "Unregistered hits: {} placeholder, {} ownerless",
            self.placeholder_hits, self.ownerless_hits
        )?;

        let mut sensors: Vec<_> = self.distance_m.iter().collect();
        sensors.sort_by(|a, b| a.0.cmp(b.0));
        for (sensor, stats) in sensors {
            writeln!(f, "  {} distance (m): {}", sensor, stats)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            return write!(f, "N/A");
        }
        write!(
            f,
            "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
            self.min, self.max, self.mean, self.std_dev, self.count
        )
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }
        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
