//! camrelay - A signaling relay for password-protected peer-to-peer camera streams
//!
//! This crate provides the core functionality for camrelay, including:
//! - The stream registry (active sessions and their metadata)
//! - The session directory and reverse connection index
//! - Signaling payload routing between a streamer and its viewers
//! - An HTTP + WebSocket server exposing all of the above
//!
//! # Architecture
//!
//! A streamer creates a session over HTTP and receives an unguessable id.
//! Streamer and viewers then open WebSocket connections and register
//! against that id. Negotiation payloads (offers, answers, candidates) are
//! relayed point-to-point between the streamer and a specific viewer; media
//! never passes through the relay.

pub mod config;
pub mod directory;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod server;
pub mod signaling;
