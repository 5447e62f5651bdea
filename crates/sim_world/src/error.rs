use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Episode error: {0}")]
    Episode(#[from] episode::EpisodeError),

    #[error("Duplicate actor id: {id}")]
    DuplicateActor { id: String },

    #[error("Sensor '{sensor_id}' references unknown parent '{parent}'")]
    UnknownParent { sensor_id: String, parent: String },

    #[error("Sensor '{sensor_id}' must be attached to a parent actor")]
    ParentRequired { sensor_id: String },
}

impl SimError {
    pub fn parent_required(sensor_id: impl Into<String>) -> Self {
        Self::ParentRequired {
            sensor_id: sensor_id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
