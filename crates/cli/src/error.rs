//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Scenario could not be built or stepped
    #[error("Simulation failed: {0}")]
    Simulation(#[from] sim_world::SimError),

    /// Sinks could not be created
    #[error("Dispatcher setup failed: {0}")]
    Dispatcher(#[from] dispatcher::DispatcherError),

    /// Dispatcher task did not drain in time or panicked
    #[error("Error during shutdown: {message}")]
    Shutdown { message: String },

    /// Generic error wrapper
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn shutdown(message: impl Into<String>) -> Self {
        Self::Shutdown {
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
