//! Session-scoped actor registry
//!
//! Maps engine handles to stable logical identities. Unknown handles get a
//! placeholder identity the first time they are seen, and keep it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::RwLock;

use contracts::{ActorId, ActorSnapshot, EngineHandle};
use tracing::{debug, trace};

use crate::error::{EpisodeError, Result};

#[derive(Debug, Default)]
struct RegistryInner {
    by_handle: HashMap<EngineHandle, ActorId>,
    actors: HashMap<ActorId, ActorSnapshot>,
}

/// Actor registry
#[derive(Debug)]
pub struct ActorRegistry {
    /// Next logical id, ids start at 1 and are never reused
    next_id: AtomicU32,
    inner: RwLock<RegistryInner>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU32::new(1),
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    fn allocate_id(&self) -> ActorId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    // The registry holds plain maps; a poisoned lock still has consistent data.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a spawned actor
    ///
    /// # Errors
    /// - `handle` already registered
    /// - `parent` not registered
    pub fn register(
        &self,
        handle: EngineHandle,
        type_id: impl Into<String>,
        parent: Option<ActorId>,
    ) -> Result<ActorSnapshot> {
        let mut inner = self.write();

        if let Some(&actor_id) = inner.by_handle.get(&handle) {
            return Err(EpisodeError::AlreadyRegistered { handle, actor_id });
        }
        if let Some(parent_id) = parent {
            if !inner.actors.contains_key(&parent_id) {
                return Err(EpisodeError::ParentNotFound { parent_id });
            }
        }

        let snapshot = ActorSnapshot {
            id: self.allocate_id(),
            type_id: type_id.into(),
            parent_id: parent,
            placeholder: false,
        };
        inner.by_handle.insert(handle, snapshot.id);
        inner.actors.insert(snapshot.id, snapshot.clone());

        debug!(
            handle = %handle,
            actor_id = snapshot.id,
            type_id = %snapshot.type_id,
            "actor registered"
        );
        Ok(snapshot)
    }

    /// Tracked identity for `handle`, creating a placeholder on first sight
    ///
    /// Idempotent: the same handle always resolves to the same id.
    pub fn find_or_fake(&self, handle: EngineHandle) -> ActorSnapshot {
        if let Some(found) = self.find_by_handle(handle) {
            return found;
        }

        let mut inner = self.write();
        // Re-check under the write lock, another caller may have faked it
        if let Some(id) = inner.by_handle.get(&handle) {
            if let Some(found) = inner.actors.get(id) {
                return found.clone();
            }
        }

        let snapshot = ActorSnapshot::placeholder(self.allocate_id());
        inner.by_handle.insert(handle, snapshot.id);
        inner.actors.insert(snapshot.id, snapshot.clone());

        trace!(handle = %handle, actor_id = snapshot.id, "placeholder actor created");
        snapshot
    }

    pub fn find(&self, id: ActorId) -> Option<ActorSnapshot> {
        self.read().actors.get(&id).cloned()
    }

    pub fn find_by_handle(&self, handle: EngineHandle) -> Option<ActorSnapshot> {
        let inner = self.read();
        inner
            .by_handle
            .get(&handle)
            .and_then(|id| inner.actors.get(id))
            .cloned()
    }

    /// Remove an actor (destroyed). Its id is not reused.
    pub fn remove(&self, handle: EngineHandle) -> Option<ActorSnapshot> {
        let mut inner = self.write();
        let id = inner.by_handle.remove(&handle)?;
        inner.actors.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.read().actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All actors, ordered by id
    pub fn snapshot_all(&self) -> Vec<ActorSnapshot> {
        let mut all: Vec<_> = self.read().actors.values().cloned().collect();
        all.sort_by_key(|a| a.id);
        all
    }
}

impl Default for ActorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
