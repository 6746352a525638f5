//! Wire protocol between connections and the relay
//!
//! Events travel as WebSocket frames: text frames carry JSON, binary frames
//! carry MessagePack. Both encodings share the same adjacently tagged shape
//! `{"event": <name>, "data": <payload>}`.

mod message;

pub use message::{ClientEvent, ServerEvent};

use anyhow::{anyhow, bail, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Protocol version announced in the welcome event
pub const PROTOCOL_VERSION: u32 = 1;

/// Maximum accepted frame size (signaling payloads are small)
pub const MAX_MESSAGE_SIZE: usize = 256 * 1024;

/// Protocol-specific errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Frame encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Codec {
    #[default]
    Json,
    MessagePack,
}

/// An encoded frame ready for the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

impl Codec {
    /// Encode a message into a frame of this codec's kind
    pub fn encode<T: Serialize>(self, msg: &T) -> Result<Frame> {
        match self {
            Codec::Json => Ok(Frame::Text(serde_json::to_string(msg)?)),
            Codec::MessagePack => Ok(Frame::Binary(rmp_serde::to_vec_named(msg)?)),
        }
    }

    /// Decode a message from raw frame bytes
    pub fn decode<T: DeserializeOwned>(self, bytes: &[u8]) -> Result<T> {
        if bytes.len() > MAX_MESSAGE_SIZE {
            bail!(ProtocolError::MessageTooLarge {
                size: bytes.len(),
                max: MAX_MESSAGE_SIZE
            });
        }

        match self {
            Codec::Json => serde_json::from_slice(bytes).map_err(|e| {
                anyhow!(ProtocolError::MalformedMessage(format!(
                    "Failed to deserialize: {}",
                    e
                )))
            }),
            Codec::MessagePack => rmp_serde::from_slice(bytes).map_err(|e| {
                anyhow!(ProtocolError::MalformedMessage(format!(
                    "Failed to deserialize: {}",
                    e
                )))
            }),
        }
    }
}

/// Serialize a message as JSON
pub fn serialize<T: Serialize>(msg: &T) -> Result<String> {
    Ok(serde_json::to_string(msg)?)
}

/// Deserialize a JSON message
pub fn deserialize<T: DeserializeOwned>(text: &str) -> Result<T> {
    Codec::Json.decode(text.as_bytes())
}
