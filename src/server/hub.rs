//! In-process broadcast hub - the transport behind the WebSocket server

use crate::directory::ConnectionId;
use crate::protocol::ServerEvent;
use crate::registry::SessionId;
use crate::signaling::Transport;
use dashmap::DashMap;
use std::collections::HashSet;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Outbound queues of live connections plus session group membership
#[derive(Debug, Default)]
pub struct Hub {
    peers: DashMap<ConnectionId, mpsc::Sender<ServerEvent>>,
    groups: DashMap<SessionId, HashSet<ConnectionId>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the outbound queue of a new connection
    pub fn attach(&self, connection_id: ConnectionId, sender: mpsc::Sender<ServerEvent>) {
        self.peers.insert(connection_id, sender);
    }

    /// Forget a connection: drop its queue and remove it from every group
    pub fn detach(&self, connection_id: ConnectionId) {
        self.peers.remove(&connection_id);
        self.groups.retain(|_, members| {
            members.remove(&connection_id);
            !members.is_empty()
        });
    }

    /// Current members of a group
    pub fn members(&self, group: &SessionId) -> Vec<ConnectionId> {
        self.groups
            .get(group)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn connection_count(&self) -> usize {
        self.peers.len()
    }

    /// Number of non-empty groups
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    fn deliver(&self, connection_id: ConnectionId, event: ServerEvent) {
        let Some(sender) = self.peers.get(&connection_id).map(|s| s.value().clone()) else {
            tracing::debug!("Dropping event for detached connection {}", connection_id);
            return;
        };

        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Outbound queue full for {}, event dropped", connection_id);
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("Outbound queue closed for {}", connection_id);
            }
        }
    }
}

impl Transport for Hub {
    fn join_group(&self, group: &SessionId, connection_id: ConnectionId) {
        self.groups
            .entry(group.clone())
            .or_default()
            .insert(connection_id);
    }

    fn leave_group(&self, group: &SessionId, connection_id: ConnectionId) {
        if let Some(mut members) = self.groups.get_mut(group) {
            members.remove(&connection_id);
        }
        self.groups.remove_if(group, |_, members| members.is_empty());
    }

    fn send_to(&self, connection_id: ConnectionId, event: ServerEvent) {
        self.deliver(connection_id, event);
    }

    fn broadcast(&self, group: &SessionId, event: ServerEvent, except: Option<ConnectionId>) {
        for member in self.members(group) {
            if Some(member) != except {
                self.deliver(member, event.clone());
            }
        }
    }
}
