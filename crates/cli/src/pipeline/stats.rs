//! Pipeline statistics.

use std::time::Duration;

use dispatcher::MetricsSnapshot;
use observability::RunSummary;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Frames the episode advanced
    pub frames_simulated: u64,

    /// Stopped by a shutdown signal before the last frame
    pub interrupted: bool,

    /// Wall-clock duration of the run
    pub duration: Duration,

    /// Actors with a logical identity at the end of the run, placeholders included
    pub registered_actors: usize,

    /// Collisions recorded on the episode
    pub collisions_recorded: u64,

    /// Host-side event tallies
    pub detections: RunSummary,

    /// Sensor stream counters
    pub stream: MetricsSnapshot,

    /// Final per-sink counters
    pub sinks: Vec<(String, MetricsSnapshot)>,
}

impl PipelineStats {
    /// Simulated frames per wall-clock second
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.frames_simulated as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of stream messages dropped, as a percentage
    pub fn drop_rate(&self) -> f64 {
        let total = self.stream.offered();
        if total > 0 {
            (self.stream.dropped_count as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn print_summary(&self) {
        println!("\n=== Pipeline Statistics ===\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Frames simulated: {}", self.frames_simulated);
        println!("   ├─ FPS: {:.2}", self.fps());
        println!("   ├─ Interrupted: {}", self.interrupted);
        println!("   ├─ Actors known: {}", self.registered_actors);
        println!("   └─ Collisions recorded: {}", self.collisions_recorded);

        println!("\nSensor Stream");
        println!("   ├─ Sent: {}", self.stream.write_count);
        println!(
            "   └─ Dropped: {} ({:.2}%)",
            self.stream.dropped_count,
            self.drop_rate()
        );

        if !self.sinks.is_empty() {
            println!("\nSinks");
            for (i, (name, m)) in self.sinks.iter().enumerate() {
                let prefix = if i == self.sinks.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {} {}: {} written, {} failed, {} dropped",
                    prefix, name, m.write_count, m.failure_count, m.dropped_count
                );
            }
        }

        println!("\n{}", self.detections);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_handle_empty_runs() {
        let stats = PipelineStats::default();
        assert_eq!(stats.fps(), 0.0);
        assert_eq!(stats.drop_rate(), 0.0);
    }

    #[test]
    fn drop_rate_counts_stream_drops() {
        let stats = PipelineStats {
            frames_simulated: 40,
            duration: Duration::from_secs(2),
            stream: MetricsSnapshot {
                write_count: 75,
                dropped_count: 25,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(stats.fps(), 20.0);
        assert_eq!(stats.drop_rate(), 25.0);
    }
}
