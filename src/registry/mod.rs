//! Stream registry - the set of active sessions and their metadata
//!
//! Each session lives in its own slot behind its own mutex, holding both
//! the [`StreamSession`] metadata and the [`SessionRoute`] routing table.
//! The two are created and destroyed together. There is no lock spanning
//! sessions: the outer map is sharded and only ever held long enough to
//! clone a slot handle.

mod session;

pub use session::{SessionId, StreamInfo, StreamSession};

use crate::directory::SessionRoute;
use crate::error::{RelayError, RelayResult};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Per-session state, serialized by the slot mutex
#[derive(Debug)]
pub struct SessionSlot {
    pub stream: StreamSession,
    pub route: SessionRoute,

    /// Creation order, used to keep listings deterministic
    seq: u64,
}

pub type SharedSlot = Arc<Mutex<SessionSlot>>;

/// Owner of all active sessions
#[derive(Debug, Default)]
pub struct StreamRegistry {
    sessions: DashMap<SessionId, SharedSlot>,
    next_seq: AtomicU64,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new active session under a freshly generated identifier
    pub fn create(&self, name: impl Into<String>, password: impl Into<String>) -> SessionId {
        let stream = StreamSession::new(name, password);
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);

        loop {
            let id = SessionId::generate();
            match self.sessions.entry(id.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    slot.insert(Arc::new(Mutex::new(SessionSlot {
                        stream,
                        route: SessionRoute::default(),
                        seq,
                    })));
                    return id;
                }
            }
        }
    }

    /// Remove a session after checking its password.
    ///
    /// On success the slot is marked inactive (so holders of a stale handle
    /// see it as gone) and its routing table is handed back to the caller.
    pub fn remove(&self, id: &SessionId, password: &str) -> RelayResult<SessionRoute> {
        let slot = self.get(id).ok_or(RelayError::NotFound)?;
        let mut guard = slot.lock();

        if !guard.stream.active {
            return Err(RelayError::NotFound);
        }
        if !guard.stream.password_matches(password) {
            return Err(RelayError::Unauthorized);
        }

        guard.stream.active = false;
        self.sessions.remove(id);
        Ok(std::mem::take(&mut guard.route))
    }

    /// Handle to a session slot, if the session exists
    pub fn get(&self, id: &SessionId) -> Option<SharedSlot> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Snapshot of all active sessions in creation order
    pub fn list(&self) -> Vec<StreamInfo> {
        // Collect handles first so no shard lock is held while locking slots
        let slots: Vec<(SessionId, SharedSlot)> = self
            .sessions
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        let mut infos: Vec<(u64, StreamInfo)> = slots
            .iter()
            .filter_map(|(id, slot)| {
                let guard = slot.lock();
                guard
                    .stream
                    .active
                    .then(|| (guard.seq, guard.stream.info(id)))
            })
            .collect();

        infos.sort_by_key(|(seq, _)| *seq);
        infos.into_iter().map(|(_, info)| info).collect()
    }

    /// Check credentials, distinguishing unknown sessions from bad passwords
    pub fn verify(&self, id: &SessionId, password: &str) -> RelayResult<()> {
        let slot = self.get(id).ok_or(RelayError::NotFound)?;
        let guard = slot.lock();

        if !guard.stream.active {
            return Err(RelayError::NotFound);
        }
        if !guard.stream.password_matches(password) {
            return Err(RelayError::Unauthorized);
        }
        Ok(())
    }

    /// True only if the session exists and the password matches exactly
    pub fn authorize(&self, id: &SessionId, password: &str) -> bool {
        self.verify(id, password).is_ok()
    }

    /// Adjust the viewer count, clamped at zero. No-op for unknown sessions.
    pub fn adjust_viewer_count(&self, id: &SessionId, delta: i64) -> Option<usize> {
        let slot = self.get(id)?;
        let mut guard = slot.lock();
        if !guard.stream.active {
            return None;
        }
        Some(guard.stream.adjust_viewer_count(delta))
    }

    /// Current viewer count of a session
    pub fn viewer_count(&self, id: &SessionId) -> Option<usize> {
        let slot = self.get(id)?;
        let guard = slot.lock();
        guard.stream.active.then_some(guard.stream.viewer_count)
    }

    /// Number of active sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
