//! Dispatcher setup errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatcherError {
    /// A sink could not open its output
    #[error("failed to create sink '{name}': {source}")]
    SinkCreation {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl DispatcherError {
    pub fn sink_creation(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::SinkCreation {
            name: name.into(),
            source,
        }
    }
}
