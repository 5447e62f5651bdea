//! Strong and weak episode handles

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Weak};

use crate::episode::Episode;
use crate::error::{EpisodeError, Result};

/// Strong handle, keeps the episode alive
#[derive(Clone)]
pub struct EpisodeProxy(Arc<Episode>);

impl EpisodeProxy {
    pub(crate) fn from_arc(episode: Arc<Episode>) -> Self {
        Self(episode)
    }

    /// Non-owning handle to the same episode
    pub fn downgrade(&self) -> WeakEpisodeProxy {
        WeakEpisodeProxy(Arc::downgrade(&self.0))
    }

    /// True if both handles point at the same episode
    pub fn same_episode(&self, other: &EpisodeProxy) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for EpisodeProxy {
    type Target = Episode;

    fn deref(&self) -> &Episode {
        &self.0
    }
}

impl fmt::Debug for EpisodeProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EpisodeProxy(id={})", self.0.id())
    }
}

/// Weak handle, never keeps the episode alive
///
/// `WeakEpisodeProxy::default()` never resolves.
#[derive(Clone, Default)]
pub struct WeakEpisodeProxy(Weak<Episode>);

impl WeakEpisodeProxy {
    /// Resolve to a live episode without blocking
    ///
    /// `None` once the episode was dropped or ended. Upgrading is atomic with
    /// respect to the last strong handle going away.
    pub fn try_lock(&self) -> Option<EpisodeProxy> {
        let episode = self.0.upgrade()?;
        if episode.has_ended() {
            return None;
        }
        Some(EpisodeProxy(episode))
    }

    /// Like [`try_lock`](Self::try_lock), as a `Result`
    pub fn lock(&self) -> Result<EpisodeProxy> {
        self.try_lock().ok_or(EpisodeError::Expired)
    }

    pub fn is_expired(&self) -> bool {
        self.try_lock().is_none()
    }
}

impl fmt::Debug for WeakEpisodeProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_lock() {
            Some(episode) => write!(f, "WeakEpisodeProxy(id={})", episode.id()),
            None => f.write_str("WeakEpisodeProxy(expired)"),
        }
    }
}
