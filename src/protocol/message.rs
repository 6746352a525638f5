//! Event types for the relay connection protocol

use crate::directory::ConnectionId;
use crate::registry::SessionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events sent from a connection to the relay
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Anonymous viewer presence
    #[serde(rename_all = "camelCase")]
    Join { session_id: SessionId },

    #[serde(rename_all = "camelCase")]
    Leave { session_id: SessionId },

    /// Bind this connection as the session's streamer
    #[serde(rename_all = "camelCase")]
    RegisterStreamer { session_id: SessionId },

    /// Bind this connection under a viewer id
    #[serde(rename_all = "camelCase")]
    RegisterViewer {
        session_id: SessionId,
        viewer_id: String,
    },

    /// Streamer -> viewer negotiation payload (carries `viewerId`)
    #[serde(rename_all = "camelCase")]
    StreamerSignal { session_id: SessionId, signal: Value },

    /// Viewer -> streamer negotiation payload
    #[serde(rename_all = "camelCase")]
    ViewerSignal { session_id: SessionId, signal: Value },
}

impl ClientEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Join { .. } => "join",
            ClientEvent::Leave { .. } => "leave",
            ClientEvent::RegisterStreamer { .. } => "registerStreamer",
            ClientEvent::RegisterViewer { .. } => "registerViewer",
            ClientEvent::StreamerSignal { .. } => "streamerSignal",
            ClientEvent::ViewerSignal { .. } => "viewerSignal",
        }
    }

    /// Session the event targets
    pub fn session_id(&self) -> &SessionId {
        match self {
            ClientEvent::Join { session_id }
            | ClientEvent::Leave { session_id }
            | ClientEvent::RegisterStreamer { session_id }
            | ClientEvent::RegisterViewer { session_id, .. }
            | ClientEvent::StreamerSignal { session_id, .. }
            | ClientEvent::ViewerSignal { session_id, .. } => session_id,
        }
    }
}

/// Events sent from the relay to a connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Sent once when the connection opens
    #[serde(rename_all = "camelCase")]
    Welcome {
        connection_id: ConnectionId,
        protocol_version: u32,
    },

    /// Acknowledges a presence or registration event
    #[serde(rename_all = "camelCase")]
    Ack { for_event: String },

    #[serde(rename_all = "camelCase")]
    ViewerJoined {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        viewer_id: Option<String>,
        viewers: usize,
    },

    #[serde(rename_all = "camelCase")]
    ViewerLeft {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        viewer_id: Option<String>,
        viewers: usize,
    },

    /// Forwarded streamer payload, verbatim
    StreamerSignal(Value),

    /// Forwarded viewer payload, verbatim
    ViewerSignal(Value),

    #[serde(rename_all = "camelCase")]
    SessionEnded { session_id: SessionId },

    /// Error response
    Error { message: String },
}
