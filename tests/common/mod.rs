//! Shared test helpers

#![allow(dead_code)]

use camrelay::directory::ConnectionId;
use camrelay::protocol::ServerEvent;
use camrelay::registry::SessionId;
use camrelay::relay::Relay;
use camrelay::signaling::Transport;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// One call made on the transport
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    To(ConnectionId, ServerEvent),
    Broadcast {
        group: SessionId,
        event: ServerEvent,
        except: Option<ConnectionId>,
    },
}

/// Transport double that records calls and expands broadcasts into
/// per-connection inboxes using the membership at send time
#[derive(Debug, Default)]
pub struct RecordingTransport {
    log: Mutex<Vec<Sent>>,
    groups: Mutex<HashMap<SessionId, HashSet<ConnectionId>>>,
    inboxes: Mutex<HashMap<ConnectionId, Vec<ServerEvent>>>,
}

impl RecordingTransport {
    pub fn log(&self) -> Vec<Sent> {
        self.log.lock().clone()
    }

    pub fn members(&self, group: &SessionId) -> HashSet<ConnectionId> {
        self.groups.lock().get(group).cloned().unwrap_or_default()
    }

    /// Everything delivered to a connection so far
    pub fn received(&self, connection_id: ConnectionId) -> Vec<ServerEvent> {
        self.inboxes
            .lock()
            .get(&connection_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Drain a connection's inbox
    pub fn take_received(&self, connection_id: ConnectionId) -> Vec<ServerEvent> {
        self.inboxes
            .lock()
            .remove(&connection_id)
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        self.log.lock().clear();
        self.inboxes.lock().clear();
    }

    fn push(&self, connection_id: ConnectionId, event: ServerEvent) {
        self.inboxes
            .lock()
            .entry(connection_id)
            .or_default()
            .push(event);
    }
}

impl Transport for RecordingTransport {
    fn join_group(&self, group: &SessionId, connection_id: ConnectionId) {
        self.groups
            .lock()
            .entry(group.clone())
            .or_default()
            .insert(connection_id);
    }

    fn leave_group(&self, group: &SessionId, connection_id: ConnectionId) {
        if let Some(members) = self.groups.lock().get_mut(group) {
            members.remove(&connection_id);
        }
    }

    fn send_to(&self, connection_id: ConnectionId, event: ServerEvent) {
        self.log.lock().push(Sent::To(connection_id, event.clone()));
        self.push(connection_id, event);
    }

    fn broadcast(&self, group: &SessionId, event: ServerEvent, except: Option<ConnectionId>) {
        self.log.lock().push(Sent::Broadcast {
            group: group.clone(),
            event: event.clone(),
            except,
        });
        for member in self.members(group) {
            if Some(member) != except {
                self.push(member, event.clone());
            }
        }
    }
}

/// Relay wired to a fresh recording transport
pub fn relay() -> (Relay<RecordingTransport>, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::default());
    (Relay::new(Arc::clone(&transport)), transport)
}
