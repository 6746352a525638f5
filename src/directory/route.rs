//! Per-session routing table

use super::ConnectionId;
use std::collections::{HashMap, HashSet};

/// What an unregistered connection had been bound as
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unregistered {
    Streamer,
    Viewer(String),
}

/// Routing table of one session
#[derive(Debug, Clone, Default)]
pub struct SessionRoute {
    /// Connection currently acting as streamer
    streamer: Option<ConnectionId>,

    /// Viewer id -> connection
    viewers: HashMap<String, ConnectionId>,

    /// Connections present through an anonymous join
    anonymous: HashSet<ConnectionId>,
}

impl SessionRoute {
    /// Bind the streamer connection. The most recent registration wins;
    /// the displaced connection (if different) is returned.
    pub fn register_streamer(&mut self, connection_id: ConnectionId) -> Option<ConnectionId> {
        self.streamer
            .replace(connection_id)
            .filter(|previous| *previous != connection_id)
    }

    /// Bind a viewer id to a connection, replacing any previous binding.
    /// Returns the previous connection for that viewer id, if any.
    pub fn register_viewer(
        &mut self,
        viewer_id: impl Into<String>,
        connection_id: ConnectionId,
    ) -> Option<ConnectionId> {
        self.viewers.insert(viewer_id.into(), connection_id)
    }

    pub fn streamer_connection(&self) -> Option<ConnectionId> {
        self.streamer
    }

    pub fn viewer_connection(&self, viewer_id: &str) -> Option<ConnectionId> {
        self.viewers.get(viewer_id).copied()
    }

    /// Record an anonymous join. Returns false if the connection was already
    /// present.
    pub fn join_anonymous(&mut self, connection_id: ConnectionId) -> bool {
        self.anonymous.insert(connection_id)
    }

    /// Drop an anonymous join. Returns false if the connection was not present.
    pub fn leave_anonymous(&mut self, connection_id: ConnectionId) -> bool {
        self.anonymous.remove(&connection_id)
    }

    pub fn anonymous_len(&self) -> usize {
        self.anonymous.len()
    }

    /// Remove whatever entry points at this exact connection. Idempotent.
    pub fn unregister_connection(&mut self, connection_id: ConnectionId) -> Option<Unregistered> {
        let mut removed = None;

        if self.streamer == Some(connection_id) {
            self.streamer = None;
            removed = Some(Unregistered::Streamer);
        }

        let viewer_id = self
            .viewers
            .iter()
            .find(|(_, conn)| **conn == connection_id)
            .map(|(viewer_id, _)| viewer_id.clone());
        if let Some(viewer_id) = viewer_id {
            self.viewers.remove(&viewer_id);
            removed = Some(Unregistered::Viewer(viewer_id));
        }

        removed
    }

    /// Registered viewers as (viewer id, connection) pairs
    pub fn viewer_connections(&self) -> impl Iterator<Item = (&str, ConnectionId)> {
        self.viewers
            .iter()
            .map(|(viewer_id, conn)| (viewer_id.as_str(), *conn))
    }

    /// Number of registered viewers
    pub fn viewer_len(&self) -> usize {
        self.viewers.len()
    }

    /// Every bound connection (streamer and registered viewers)
    pub fn connections(&self) -> Vec<ConnectionId> {
        self.streamer
            .into_iter()
            .chain(self.viewers.values().copied())
            .collect()
    }

    /// Connections present through an anonymous join
    pub fn anonymous_connections(&self) -> Vec<ConnectionId> {
        self.anonymous.iter().copied().collect()
    }
}
