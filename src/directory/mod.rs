//! Session directory and reverse connection index
//!
//! [`SessionRoute`] is the per-session routing table (who is the streamer,
//! which connection each viewer id maps to). [`ConnectionIndex`] maps every
//! bound connection back to its session and role so a dropped connection can
//! be cleaned up without knowing its session in advance.

mod index;
mod route;

pub use index::{ConnectionBinding, ConnectionId, ConnectionIndex, Role};
pub use route::{SessionRoute, Unregistered};
