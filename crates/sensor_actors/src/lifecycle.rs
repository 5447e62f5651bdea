//! Start-up binding shared by host-side sensors

use episode::{EpisodeProxy, WeakEpisodeProxy};
use tracing::{debug, error};

/// Host-side sensor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    /// Constructed, `begin_play` not called yet
    Unbound,
    /// Bound to an episode, ticking
    Active,
    /// No compatible episode at start-up; never ticks again
    Disabled,
}

/// Bind to the hosting episode, or disable
pub(crate) fn bind(
    sensor_id: &str,
    kind: &'static str,
    episode: Option<&EpisodeProxy>,
) -> (SensorState, WeakEpisodeProxy) {
    match episode {
        Some(episode) => {
            debug!(
                sensor_id = %sensor_id,
                kind,
                episode_id = episode.id(),
                "sensor bound to episode"
            );
            (SensorState::Active, episode.downgrade())
        }
        None => {
            error!(sensor_id = %sensor_id, kind, "game mode not compatible with this sensor");
            (SensorState::Disabled, WeakEpisodeProxy::default())
        }
    }
}
