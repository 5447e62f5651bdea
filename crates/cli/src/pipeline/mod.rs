//! Scenario pipeline: simulation, sensor stream, dispatcher.

mod orchestrator;
mod recorder;
mod stats;

pub use orchestrator::{Pipeline, PipelineConfig};
pub use recorder::RecordingSink;
pub use stats::PipelineStats;
