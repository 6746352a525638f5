//! Server module - HTTP lifecycle endpoints and WebSocket signaling transport

mod connection;
mod http;
mod hub;
mod listener;

pub use connection::{create_error_message, create_welcome_message};
pub use http::{
    AuthorizeResponse, CreateSessionRequest, CreateSessionResponse, SessionCredentials,
    StopSessionResponse,
};
pub use hub::Hub;
pub use listener::{create_app, ServerListener};

use crate::relay::Relay;
use std::sync::Arc;

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay<Hub>>,

    /// Per-connection outbound queue depth
    pub outbound_buffer: usize,
}
