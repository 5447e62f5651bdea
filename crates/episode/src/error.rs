//! Episode error types

use contracts::{ActorId, EngineHandle};
use thiserror::Error;

/// Episode specific error
#[derive(Debug, Error)]
pub enum EpisodeError {
    /// The session behind a weak handle has ended
    #[error("episode has expired")]
    Expired,

    /// Engine handle registered twice
    #[error("engine handle {handle} already registered as actor {actor_id}")]
    AlreadyRegistered {
        handle: EngineHandle,
        actor_id: ActorId,
    },

    /// Parent actor unknown to the registry
    #[error("parent actor {parent_id} not found")]
    ParentNotFound { parent_id: ActorId },
}

/// Result alias
pub type Result<T> = std::result::Result<T, EpisodeError>;
