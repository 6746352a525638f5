//! Reverse connection index

use crate::registry::SessionId;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Identifier of one live transport connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Role a connection holds within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Streamer,
    Viewer,
}

/// Where a connection is bound
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionBinding {
    pub connection_id: ConnectionId,
    pub session_id: SessionId,
    pub role: Role,

    /// Present only for viewers
    pub viewer_id: Option<String>,
}

impl ConnectionBinding {
    pub fn streamer(connection_id: ConnectionId, session_id: SessionId) -> Self {
        Self {
            connection_id,
            session_id,
            role: Role::Streamer,
            viewer_id: None,
        }
    }

    pub fn viewer(
        connection_id: ConnectionId,
        session_id: SessionId,
        viewer_id: impl Into<String>,
    ) -> Self {
        Self {
            connection_id,
            session_id,
            role: Role::Viewer,
            viewer_id: Some(viewer_id.into()),
        }
    }
}

/// Connection id -> binding, plus the sessions a connection joined
/// anonymously
#[derive(Debug, Default)]
pub struct ConnectionIndex {
    bindings: DashMap<ConnectionId, ConnectionBinding>,
    presence: DashMap<ConnectionId, HashSet<SessionId>>,
}

impl ConnectionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a connection, replacing any binding it already held
    pub fn bind(&self, binding: ConnectionBinding) -> Option<ConnectionBinding> {
        self.bindings.insert(binding.connection_id, binding)
    }

    pub fn lookup(&self, connection_id: ConnectionId) -> Option<ConnectionBinding> {
        self.bindings
            .get(&connection_id)
            .map(|entry| entry.value().clone())
    }

    pub fn unbind(&self, connection_id: ConnectionId) -> Option<ConnectionBinding> {
        self.bindings
            .remove(&connection_id)
            .map(|(_, binding)| binding)
    }

    /// Remove the entry only if it still equals `expected`.
    ///
    /// Cleanup paths use this so a stale view of a binding can never evict
    /// a newer one held by the same connection.
    pub fn unbind_matching(&self, expected: &ConnectionBinding) -> Option<ConnectionBinding> {
        self.bindings
            .remove_if(&expected.connection_id, |_, current| current == expected)
            .map(|(_, binding)| binding)
    }

    /// Remove the entry only if it points into `session_id`
    pub fn unbind_in_session(
        &self,
        connection_id: ConnectionId,
        session_id: &SessionId,
    ) -> Option<ConnectionBinding> {
        self.bindings
            .remove_if(&connection_id, |_, current| current.session_id == *session_id)
            .map(|(_, binding)| binding)
    }

    /// Note an anonymous join of `session_id`
    pub fn mark_present(&self, connection_id: ConnectionId, session_id: SessionId) {
        self.presence
            .entry(connection_id)
            .or_default()
            .insert(session_id);
    }

    /// Forget an anonymous join of `session_id`
    pub fn clear_present(&self, connection_id: ConnectionId, session_id: &SessionId) {
        if let Some(mut sessions) = self.presence.get_mut(&connection_id) {
            sessions.remove(session_id);
        }
        self.presence
            .remove_if(&connection_id, |_, sessions| sessions.is_empty());
    }

    /// Sessions the connection joined anonymously
    pub fn present_in(&self, connection_id: ConnectionId) -> Vec<SessionId> {
        self.presence
            .get(&connection_id)
            .map(|sessions| sessions.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Take every anonymous join the connection holds
    pub fn take_presence(&self, connection_id: ConnectionId) -> Vec<SessionId> {
        self.presence
            .remove(&connection_id)
            .map(|(_, sessions)| sessions.into_iter().collect())
            .unwrap_or_default()
    }

    /// Number of bound connections
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
