//! Transport layer for Parlor.
//!
//! Listens on a single TCP port and sorts incoming streams into two kinds:
//! WebSocket clients (the game protocol) and plain `GET /health` probes.
//! Everything above this crate deals in whole text messages; framing,
//! upgrades, and the outbound write loop live here.

mod error;
mod websocket;

pub use error::TransportError;
pub use websocket::{
    Accepted, ConnectionReceiver, ConnectionSender, HealthProbe,
    WebSocketConnection, WebSocketTransport,
};

use std::fmt;

/// Opaque identifier for a connection.
///
/// Process-unique and never reused; seats and the dispatcher key their
/// per-connection state by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}
