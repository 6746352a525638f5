//! Signaling router and the transport capability it drives
//!
//! The relay never interprets negotiation payloads. Routing only decides
//! *where* a payload goes: point-to-point when the target connection is
//! known, otherwise a best-effort broadcast to the session group excluding
//! the sender.

mod router;

pub use router::{deliver, route_to_streamer, route_to_viewer, viewer_id_of, Delivery};

use crate::directory::ConnectionId;
use crate::protocol::ServerEvent;
use crate::registry::SessionId;

/// Group membership and message delivery, implemented by the transport.
///
/// Sends are fire-and-forget: a failed delivery to one connection must not
/// affect any other, and implementations must never block.
pub trait Transport: Send + Sync {
    /// Add a connection to a session's broadcast group
    fn join_group(&self, group: &SessionId, connection_id: ConnectionId);

    /// Remove a connection from a session's broadcast group
    fn leave_group(&self, group: &SessionId, connection_id: ConnectionId);

    /// Send to a single connection
    fn send_to(&self, connection_id: ConnectionId, event: ServerEvent);

    /// Send to every member of a group, optionally skipping one connection
    fn broadcast(&self, group: &SessionId, event: ServerEvent, except: Option<ConnectionId>);
}
