//! # Dispatcher
//!
//! Carries sensor output from the simulation thread to consumers.
//!
//! Responsibilities:
//! - Encode host-side events into raw buffers without blocking the producer
//! - Deserialize buffers into readings bound to the episode
//! - Fan out to multiple sinks, isolating slow ones

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sink;
pub mod sinks;
pub mod stream;

pub use dispatcher::{create_dispatcher, Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, QueueMetrics};
pub use sink::{DataSink, Reading};
pub use sinks::{FileSink, FileSinkConfig, LogSink};
pub use stream::{DataStream, SensorMessage};
