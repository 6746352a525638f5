//! Session lifecycle controller
//!
//! [`Relay`] is the single handle request handlers share. It owns the
//! registry and the reverse index and drives the transport.
//!
//! Locking rules:
//! - every mutation of a session's metadata, routing table, and the reverse
//!   index entries pointing into it happens under that session's slot lock
//! - at most one slot lock is held at a time
//! - no transport call is made while a slot lock is held

use crate::directory::{ConnectionBinding, ConnectionId, ConnectionIndex, Unregistered};
use crate::error::{RelayError, RelayResult};
use crate::protocol::ServerEvent;
use crate::registry::{SessionId, StreamInfo, StreamRegistry};
use crate::signaling::{self, Transport};
use serde_json::Value;
use std::sync::Arc;

/// Label used when a session is created without a name
pub const DEFAULT_STREAM_NAME: &str = "Camera Stream";

pub struct Relay<T: Transport> {
    registry: StreamRegistry,
    index: ConnectionIndex,
    transport: Arc<T>,
    default_name: String,
}

impl<T: Transport> Relay<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            registry: StreamRegistry::new(),
            index: ConnectionIndex::new(),
            transport,
            default_name: DEFAULT_STREAM_NAME.to_string(),
        }
    }

    pub fn with_default_name(mut self, name: impl Into<String>) -> Self {
        self.default_name = name.into();
        self
    }

    pub fn registry(&self) -> &StreamRegistry {
        &self.registry
    }

    pub fn index(&self) -> &ConnectionIndex {
        &self.index
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    // ---- request/response surface ----

    /// Create a session. A missing or empty password is rejected; a missing
    /// name falls back to the default label.
    pub fn create(
        &self,
        name: Option<String>,
        password: Option<String>,
    ) -> RelayResult<SessionId> {
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| RelayError::InvalidInput("Password is required".to_string()))?;
        let name = name.unwrap_or_else(|| self.default_name.clone());

        let session_id = self.registry.create(name.clone(), password);
        tracing::info!("Stream session created: {} ({})", session_id, name);
        Ok(session_id)
    }

    /// Stop a session: remove it, evict its viewers from the group, and
    /// announce the end to whoever is left in the group.
    pub fn stop(&self, session_id: &SessionId, password: &str) -> RelayResult<()> {
        let route = match self.registry.remove(session_id, password) {
            Ok(route) => route,
            Err(e) => {
                tracing::warn!("Rejected stop for {}: {}", session_id, e);
                return Err(e);
            }
        };

        for connection_id in route.connections() {
            self.index.unbind_in_session(connection_id, session_id);
        }
        let anonymous = route.anonymous_connections();
        for connection_id in &anonymous {
            self.index.clear_present(*connection_id, session_id);
        }

        let ended = ServerEvent::SessionEnded {
            session_id: session_id.clone(),
        };
        for (_, connection_id) in route.viewer_connections() {
            self.transport.send_to(connection_id, ended.clone());
            self.transport.leave_group(session_id, connection_id);
        }
        self.transport.broadcast(session_id, ended, None);

        // Empty the group so the transport can drop it
        for connection_id in route.streamer_connection().into_iter().chain(anonymous) {
            self.transport.leave_group(session_id, connection_id);
        }

        tracing::info!(
            "Stream session stopped: {} ({} viewers evicted)",
            session_id,
            route.viewer_len()
        );
        Ok(())
    }

    /// Active sessions in creation order
    pub fn list(&self) -> Vec<StreamInfo> {
        self.registry.list()
    }

    /// Viewer admission check
    pub fn authorize(&self, session_id: &SessionId, password: &str) -> bool {
        self.registry.authorize(session_id, password)
    }

    /// Viewer admission check with the failure reason
    pub fn verify(&self, session_id: &SessionId, password: &str) -> RelayResult<()> {
        self.registry.verify(session_id, password)
    }

    // ---- connection events ----

    /// Anonymous viewer joins the session group. A repeated join from the
    /// same connection is counted once.
    pub fn join(&self, connection_id: ConnectionId, session_id: &SessionId) {
        let Some(slot) = self.registry.get(session_id) else {
            tracing::debug!("Join for unknown session {} ignored", session_id);
            return;
        };

        self.transport.join_group(session_id, connection_id);

        let viewers = {
            let mut guard = slot.lock();
            if !guard.stream.active {
                return;
            }
            if !guard.route.join_anonymous(connection_id) {
                tracing::debug!("Connection {} already joined {}", connection_id, session_id);
                return;
            }
            self.index.mark_present(connection_id, session_id.clone());
            guard.stream.adjust_viewer_count(1)
        };

        self.transport.broadcast(
            session_id,
            ServerEvent::ViewerJoined {
                viewer_id: None,
                viewers,
            },
            None,
        );
    }

    /// Mirror of [`Relay::join`]. Only a connection that joined is
    /// uncounted.
    pub fn leave(&self, connection_id: ConnectionId, session_id: &SessionId) {
        self.transport.leave_group(session_id, connection_id);
        self.depart(connection_id, session_id);
    }

    /// Bind a connection as the session's streamer
    pub fn register_streamer(&self, connection_id: ConnectionId, session_id: &SessionId) {
        let Some(slot) = self.registry.get(session_id) else {
            tracing::debug!("Streamer registration for unknown session {} ignored", session_id);
            return;
        };

        let binding = ConnectionBinding::streamer(connection_id, session_id.clone());
        self.release_previous(&binding);
        self.transport.join_group(session_id, connection_id);

        let mut guard = slot.lock();
        if !guard.stream.active {
            return;
        }
        if let Some(previous) = guard.route.register_streamer(connection_id) {
            self.index.unbind_matching(&ConnectionBinding::streamer(
                previous,
                session_id.clone(),
            ));
            tracing::info!(
                "Streamer {} superseded by {} in {}",
                previous,
                connection_id,
                session_id
            );
        }
        self.index.bind(binding);
        drop(guard);

        tracing::info!("Streamer {} registered for {}", connection_id, session_id);
    }

    /// Bind a connection under a viewer id and notify the group
    pub fn register_viewer(
        &self,
        connection_id: ConnectionId,
        session_id: &SessionId,
        viewer_id: &str,
    ) {
        let Some(slot) = self.registry.get(session_id) else {
            tracing::debug!("Viewer registration for unknown session {} ignored", session_id);
            return;
        };

        let binding = ConnectionBinding::viewer(connection_id, session_id.clone(), viewer_id);
        self.release_previous(&binding);
        self.transport.join_group(session_id, connection_id);

        let viewers = {
            let mut guard = slot.lock();
            if !guard.stream.active {
                return;
            }
            match guard.route.register_viewer(viewer_id, connection_id) {
                Some(previous) if previous == connection_id => {}
                Some(previous) => {
                    // Same viewer id reconnected: already counted
                    self.index.unbind_matching(&ConnectionBinding::viewer(
                        previous,
                        session_id.clone(),
                        viewer_id,
                    ));
                }
                None => {
                    guard.stream.adjust_viewer_count(1);
                }
            }
            self.index.bind(binding);
            guard.stream.viewer_count
        };

        tracing::info!(
            "Viewer '{}' registered for {} on {} ({} viewers)",
            viewer_id,
            session_id,
            connection_id,
            viewers
        );
        self.transport.broadcast(
            session_id,
            ServerEvent::ViewerJoined {
                viewer_id: Some(viewer_id.to_string()),
                viewers,
            },
            None,
        );
    }

    /// Route a streamer payload to the viewer it names
    pub fn streamer_signal(&self, sender: ConnectionId, session_id: &SessionId, signal: Value) {
        let Some(slot) = self.registry.get(session_id) else {
            tracing::debug!("Streamer signal for unknown session {} dropped", session_id);
            return;
        };

        let delivery = {
            let guard = slot.lock();
            if !guard.stream.active {
                return;
            }
            signaling::route_to_viewer(&guard.route, &signal, sender)
        };

        signaling::deliver(
            self.transport.as_ref(),
            session_id,
            delivery,
            ServerEvent::StreamerSignal(signal),
        );
    }

    /// Route a viewer payload to the session's streamer
    pub fn viewer_signal(&self, sender: ConnectionId, session_id: &SessionId, signal: Value) {
        let Some(slot) = self.registry.get(session_id) else {
            tracing::debug!("Viewer signal for unknown session {} dropped", session_id);
            return;
        };

        let delivery = {
            let guard = slot.lock();
            if !guard.stream.active {
                return;
            }
            signaling::route_to_streamer(&guard.route, sender)
        };

        signaling::deliver(
            self.transport.as_ref(),
            session_id,
            delivery,
            ServerEvent::ViewerSignal(signal),
        );
    }

    /// Drop everything a closed connection was bound to or had joined.
    ///
    /// The sessions are found through the reverse index; callers need not
    /// know them.
    pub fn disconnect(&self, connection_id: ConnectionId) {
        let released = self.release(connection_id);
        if let Some(session_id) = &released {
            self.transport.leave_group(session_id, connection_id);
            tracing::info!("Connection {} released from {}", connection_id, session_id);
        }

        let joined = self.index.take_presence(connection_id);
        for session_id in &joined {
            self.depart(connection_id, session_id);
            self.transport.leave_group(session_id, connection_id);
        }

        if released.is_none() && joined.is_empty() {
            tracing::debug!("Connection {} held no binding", connection_id);
        }
    }

    // ---- queries ----

    pub fn streamer_connection_of(&self, session_id: &SessionId) -> Option<ConnectionId> {
        let slot = self.registry.get(session_id)?;
        let guard = slot.lock();
        guard.route.streamer_connection()
    }

    pub fn viewer_connection_of(
        &self,
        session_id: &SessionId,
        viewer_id: &str,
    ) -> Option<ConnectionId> {
        let slot = self.registry.get(session_id)?;
        let guard = slot.lock();
        guard.route.viewer_connection(viewer_id)
    }

    pub fn binding_of(&self, connection_id: ConnectionId) -> Option<ConnectionBinding> {
        self.index.lookup(connection_id)
    }

    pub fn viewer_count(&self, session_id: &SessionId) -> Option<usize> {
        self.registry.viewer_count(session_id)
    }

    // ---- internals ----

    /// Undo an anonymous join and tell the rest of the group
    fn depart(&self, connection_id: ConnectionId, session_id: &SessionId) {
        let Some(slot) = self.registry.get(session_id) else {
            self.index.clear_present(connection_id, session_id);
            return;
        };

        let viewers = {
            let mut guard = slot.lock();
            self.index.clear_present(connection_id, session_id);
            if !guard.stream.active || !guard.route.leave_anonymous(connection_id) {
                return;
            }
            guard.stream.adjust_viewer_count(-1)
        };

        self.transport.broadcast(
            session_id,
            ServerEvent::ViewerLeft {
                viewer_id: None,
                viewers,
            },
            Some(connection_id),
        );
    }

    /// Release whatever the connection holds unless it is exactly `next`
    fn release_previous(&self, next: &ConnectionBinding) {
        match self.index.lookup(next.connection_id) {
            Some(current) if current == *next => {}
            Some(_) => {
                self.release(next.connection_id);
            }
            None => {}
        }
    }

    /// Remove a connection's binding from the reverse index and its
    /// session route, keyed on the exact connection id. Returns the session
    /// the connection was bound to.
    fn release(&self, connection_id: ConnectionId) -> Option<SessionId> {
        let binding = self.index.lookup(connection_id)?;
        let session_id = binding.session_id.clone();

        let Some(slot) = self.registry.get(&session_id) else {
            self.index.unbind_matching(&binding);
            return Some(session_id);
        };

        let mut guard = slot.lock();
        // Superseded between lookup and lock: the newer owner keeps it
        self.index.unbind_matching(&binding)?;
        if !guard.stream.active {
            return Some(session_id);
        }

        match guard.route.unregister_connection(connection_id) {
            Some(Unregistered::Viewer(viewer_id)) => {
                let viewers = guard.stream.adjust_viewer_count(-1);
                drop(guard);
                self.transport.broadcast(
                    &session_id,
                    ServerEvent::ViewerLeft {
                        viewer_id: Some(viewer_id),
                        viewers,
                    },
                    Some(connection_id),
                );
            }
            Some(Unregistered::Streamer) => {
                drop(guard);
                tracing::info!("Streamer {} left {}", connection_id, session_id);
            }
            None => {}
        }

        Some(session_id)
    }
}
