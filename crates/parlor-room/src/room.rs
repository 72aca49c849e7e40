//! One room: seats, spectators, and the deferred-deletion handle.

use parlor_protocol::{GameFamily, PlayerInfo};
use parlor_transport::{ConnectionId, ConnectionSender};
use tokio::task::AbortHandle;

/// A stable position in a room. The connection handle is null while the
/// player is disconnected; the seat itself survives for reconnection.
#[derive(Debug)]
pub struct Seat {
    pub name: String,
    pub color: String,
    pub conn: Option<ConnectionSender>,
}

/// A watcher with no seat. Spectators are dropped on disconnect.
#[derive(Debug)]
pub struct Spectator {
    pub name: String,
    pub conn: ConnectionSender,
}

/// A room record. Rooms are created on first join and deleted only by the
/// manager after the grace window empties them.
#[derive(Debug)]
pub struct Room {
    pub id: String,
    pub family: GameFamily,
    pub seats: Vec<Seat>,
    pub spectators: Vec<Spectator>,
    /// Armed only while no seat holds a live connection.
    pub delete_timer: Option<AbortHandle>,
}

impl Room {
    pub(crate) fn new(id: String, family: GameFamily) -> Self {
        Self {
            id,
            family,
            seats: Vec::new(),
            spectators: Vec::new(),
            delete_timer: None,
        }
    }

    /// The seat list as shown in `room_update` and game views.
    pub fn player_infos(&self) -> Vec<PlayerInfo> {
        self.seats
            .iter()
            .map(|seat| PlayerInfo {
                name: seat.name.clone(),
                color: seat.color.clone(),
                connected: seat.conn.is_some(),
            })
            .collect()
    }

    pub fn spectator_names(&self) -> Vec<String> {
        self.spectators.iter().map(|s| s.name.clone()).collect()
    }

    /// Whether any seat still holds a live connection. Spectators do not
    /// keep a room alive.
    pub fn has_live_seats(&self) -> bool {
        self.seats.iter().any(|seat| seat.conn.is_some())
    }

    /// The seat index bound to a connection, if any.
    pub fn seat_of_conn(&self, conn_id: ConnectionId) -> Option<usize> {
        self.seats.iter().position(|seat| {
            seat.conn.as_ref().map(|c| c.id()) == Some(conn_id)
        })
    }

    pub fn seat_by_name(&self, name: &str) -> Option<usize> {
        self.seats.iter().position(|seat| seat.name == name)
    }

    /// Every live connection in the room: seated players, then spectators.
    pub fn connections(&self) -> impl Iterator<Item = &ConnectionSender> {
        self.seats
            .iter()
            .filter_map(|seat| seat.conn.as_ref())
            .chain(self.spectators.iter().map(|s| &s.conn))
    }

    /// Disarms a pending deletion.
    pub fn cancel_delete_timer(&mut self) {
        if let Some(timer) = self.delete_timer.take() {
            timer.abort();
            tracing::debug!(room_id = %self.id, "deletion timer cancelled");
        }
    }
}
