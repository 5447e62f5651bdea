//! # Episode
//!
//! The running simulation session.
//!
//! Responsibilities:
//! - Own the session clock (frame counter + elapsed seconds)
//! - Own the session-scoped actor registry ("find or fake" identities)
//! - Hand out strong [`EpisodeProxy`] and weak [`WeakEpisodeProxy`] handles
//!
//! Readings and sensors never own the episode; they hold a
//! [`WeakEpisodeProxy`] and resolve it with a non-blocking `try_lock`, which
//! yields `None` once the session has ended.

mod episode;
mod error;
mod proxy;
mod registry;

pub use contracts::{ActorId, ActorSnapshot, EngineHandle};
pub use episode::{Episode, Timestamp};
pub use error::{EpisodeError, Result};
pub use proxy::{EpisodeProxy, WeakEpisodeProxy};
pub use registry::ActorRegistry;
