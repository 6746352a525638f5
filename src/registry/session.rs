//! Stream session metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque, unguessable session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh identifier (122 random bits)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata of one advertised stream
#[derive(Debug, Clone)]
pub struct StreamSession {
    /// Display label
    pub name: String,

    /// When the session was created
    pub created_at: DateTime<Utc>,

    /// Always true while the session is in the registry
    pub active: bool,

    /// Best-effort count of joined viewers
    pub viewer_count: usize,

    password: String,
}

impl StreamSession {
    /// Create a new, active session with no viewers
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: Utc::now(),
            active: true,
            viewer_count: 0,
            password: password.into(),
        }
    }

    /// Exact-match password comparison
    pub fn password_matches(&self, candidate: &str) -> bool {
        self.password == candidate
    }

    /// Apply a signed delta to the viewer count, clamping at zero.
    /// Returns the new count.
    pub fn adjust_viewer_count(&mut self, delta: i64) -> usize {
        let current = self.viewer_count as i64;
        self.viewer_count = current.saturating_add(delta).max(0) as usize;
        self.viewer_count
    }

    /// Snapshot for listings
    pub fn info(&self, id: &SessionId) -> StreamInfo {
        StreamInfo {
            id: id.clone(),
            name: self.name.clone(),
            started_at: self.created_at,
            viewers: self.viewer_count,
        }
    }
}

/// Listing entry for an active session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInfo {
    pub id: SessionId,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub viewers: usize,
}
