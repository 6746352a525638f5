//! Destination resolution for signaling payloads

use super::Transport;
use crate::directory::{ConnectionId, SessionRoute};
use crate::protocol::ServerEvent;
use crate::registry::SessionId;
use serde_json::Value;

/// Where a payload should go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Point-to-point
    Direct(ConnectionId),

    /// Fallback: whole group except the sender
    Broadcast { except: ConnectionId },
}

/// The `viewerId` a streamer payload is addressed to, if any
pub fn viewer_id_of(signal: &Value) -> Option<&str> {
    signal.get("viewerId").and_then(Value::as_str)
}

/// Resolve a streamer -> viewer payload
pub fn route_to_viewer(route: &SessionRoute, signal: &Value, sender: ConnectionId) -> Delivery {
    viewer_id_of(signal)
        .and_then(|viewer_id| route.viewer_connection(viewer_id))
        .map(Delivery::Direct)
        .unwrap_or(Delivery::Broadcast { except: sender })
}

/// Resolve a viewer -> streamer payload
pub fn route_to_streamer(route: &SessionRoute, sender: ConnectionId) -> Delivery {
    route
        .streamer_connection()
        .map(Delivery::Direct)
        .unwrap_or(Delivery::Broadcast { except: sender })
}

/// Hand a resolved delivery to the transport
pub fn deliver<T: Transport + ?Sized>(
    transport: &T,
    group: &SessionId,
    delivery: Delivery,
    event: ServerEvent,
) {
    match delivery {
        Delivery::Direct(target) => {
            tracing::debug!("Routing signal in {} to {}", group, target);
            transport.send_to(target, event);
        }
        Delivery::Broadcast { except } => {
            tracing::debug!(
                "No target bound in {}, broadcasting signal except {}",
                group,
                except
            );
            transport.broadcast(group, event, Some(except));
        }
    }
}
