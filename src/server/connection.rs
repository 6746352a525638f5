//! WebSocket connection handling

use super::hub::Hub;
use super::AppState;
use crate::directory::ConnectionId;
use crate::protocol::{ClientEvent, Codec, Frame, ServerEvent, PROTOCOL_VERSION};
use crate::relay::Relay;
use crate::signaling::Transport;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Serve one upgraded socket until it closes
pub async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = ConnectionId::new();
    let (sink, mut stream) = socket.split();

    let (tx, rx) = mpsc::channel::<ServerEvent>(state.outbound_buffer);
    let (codec_tx, codec_rx) = watch::channel(Codec::Json);

    let hub: Arc<Hub> = Arc::clone(state.relay.transport());
    hub.attach(connection_id, tx);
    tracing::info!("Client connected: {}", connection_id);

    // The writer exits once the hub drops the last sender on detach
    tokio::spawn(client_writer_task(sink, rx, codec_rx));

    hub.send_to(connection_id, create_welcome_message(connection_id));

    while let Some(frame) = stream.next().await {
        let message = match frame {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Error reading from client {}: {}", connection_id, e);
                break;
            }
        };

        let (codec, bytes): (Codec, &[u8]) = match &message {
            Message::Text(text) => (Codec::Json, text.as_str().as_bytes()),
            Message::Binary(data) => (Codec::MessagePack, data.as_ref()),
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => break,
        };
        codec_tx.send_replace(codec);

        match codec.decode::<ClientEvent>(bytes) {
            Ok(event) => {
                if let Some(reply) = process_event(event, connection_id, &state.relay) {
                    hub.send_to(connection_id, reply);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to parse message from {}: {}", connection_id, e);
                hub.send_to(
                    connection_id,
                    create_error_message(format!("Invalid message: {}", e)),
                );
            }
        }
    }

    tracing::info!("Client disconnected: {}", connection_id);
    state.relay.disconnect(connection_id);
    hub.detach(connection_id);
}

/// Task to write outgoing events to the socket
async fn client_writer_task(
    mut sink: SplitSink<WebSocket, Message>,
    mut receiver: mpsc::Receiver<ServerEvent>,
    codec: watch::Receiver<Codec>,
) {
    while let Some(event) = receiver.recv().await {
        let current = *codec.borrow();
        let message = match current.encode(&event) {
            Ok(Frame::Text(text)) => Message::Text(text.into()),
            Ok(Frame::Binary(bytes)) => Message::Binary(bytes.into()),
            Err(e) => {
                tracing::error!("Failed to serialize event: {}", e);
                continue;
            }
        };

        if let Err(e) = sink.send(message).await {
            tracing::error!("Failed to write event to client: {}", e);
            break;
        }
    }

    let _ = sink.close().await;
    tracing::debug!("Client writer task finished");
}

/// Apply a client event and return the optional direct reply
fn process_event(
    event: ClientEvent,
    connection_id: ConnectionId,
    relay: &Relay<Hub>,
) -> Option<ServerEvent> {
    let name = event.name();
    tracing::debug!("{} from {} for {}", name, connection_id, event.session_id());

    match event {
        ClientEvent::Join { session_id } => relay.join(connection_id, &session_id),
        ClientEvent::Leave { session_id } => relay.leave(connection_id, &session_id),
        ClientEvent::RegisterStreamer { session_id } => {
            relay.register_streamer(connection_id, &session_id)
        }
        ClientEvent::RegisterViewer {
            session_id,
            viewer_id,
        } => relay.register_viewer(connection_id, &session_id, &viewer_id),

        // Signals are fire-and-forget
        ClientEvent::StreamerSignal { session_id, signal } => {
            relay.streamer_signal(connection_id, &session_id, signal);
            return None;
        }
        ClientEvent::ViewerSignal { session_id, signal } => {
            relay.viewer_signal(connection_id, &session_id, signal);
            return None;
        }
    }

    Some(ServerEvent::Ack {
        for_event: name.to_string(),
    })
}

/// Create the welcome event for a new connection
pub fn create_welcome_message(connection_id: ConnectionId) -> ServerEvent {
    ServerEvent::Welcome {
        connection_id,
        protocol_version: PROTOCOL_VERSION,
    }
}

/// Create an error event
pub fn create_error_message(message: String) -> ServerEvent {
    ServerEvent::Error { message }
}
