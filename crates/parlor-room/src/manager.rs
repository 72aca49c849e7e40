//! Room manager: creates rooms, resolves joins, and tracks which
//! connection sits where.

use std::collections::HashMap;

use parlor_protocol::GameFamily;
use parlor_transport::{ConnectionId, ConnectionSender};
use rand::Rng;

use crate::{color_set, max_players, Room, RoomError, Seat, Spectator};

/// Room ids are 6 characters from this set.
const ID_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Display names are trimmed and cut to this length.
const MAX_NAME_LEN: usize = 30;

/// The result of a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub color: String,
    pub reconnected: bool,
    pub spectator: bool,
}

/// What a departing connection left behind. The dispatcher uses this to
/// arm the grace timers.
#[derive(Debug, Clone)]
pub struct Departure {
    pub room_id: String,
    pub name: String,
    pub was_player: bool,
    /// True when no seat holds a live connection any more.
    pub room_emptied: bool,
}

/// The room table. Owned by the dispatcher and mutated only under its
/// lock, so plain maps suffice.
pub struct RoomManager {
    rooms: HashMap<String, Room>,
    conn_rooms: HashMap<ConnectionId, String>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            conn_rooms: HashMap::new(),
        }
    }

    /// Creates an empty room for a family and returns its fresh id.
    pub fn create_room(
        &mut self,
        family: GameFamily,
        rng: &mut impl Rng,
    ) -> String {
        let id = loop {
            let candidate: String = (0..6)
                .map(|_| {
                    ID_CHARS[rng.random_range(0..ID_CHARS.len())] as char
                })
                .collect();
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        self.rooms.insert(id.clone(), Room::new(id.clone(), family));
        tracing::info!(room_id = %id, %family, "room created");
        id
    }

    /// Resolves a join: reconnection by name first, then a free seat,
    /// then spectating. Cancels any pending deletion.
    pub fn join_room(
        &mut self,
        room_id: &str,
        conn: ConnectionSender,
        name: &str,
    ) -> Result<JoinOutcome, RoomError> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.to_string()))?;
        room.cancel_delete_timer();

        let name: String = name.trim().chars().take(MAX_NAME_LEN).collect();
        let conn_id = conn.id();

        let outcome = if let Some(seat_idx) = room.seat_by_name(&name) {
            let seat = &mut room.seats[seat_idx];
            if let Some(old) = seat.conn.replace(conn) {
                // Two connections under one name collapse to one seat.
                self.conn_rooms.remove(&old.id());
            }
            tracing::info!(
                room_id, %name, color = %seat.color, "player reconnected"
            );
            JoinOutcome {
                color: seat.color.clone(),
                reconnected: true,
                spectator: false,
            }
        } else if room.seats.len() < max_players(room.family) {
            let color = color_set(room.family)[room.seats.len()].to_string();
            room.seats.push(Seat {
                name: name.clone(),
                color: color.clone(),
                conn: Some(conn),
            });
            tracing::info!(room_id, %name, %color, "player joined");
            JoinOutcome {
                color,
                reconnected: false,
                spectator: false,
            }
        } else {
            room.spectators.push(Spectator {
                name: name.clone(),
                conn,
            });
            tracing::info!(room_id, %name, "spectator joined");
            JoinOutcome {
                color: "spectator".to_string(),
                reconnected: false,
                spectator: true,
            }
        };

        self.conn_rooms.insert(conn_id, room_id.to_string());
        Ok(outcome)
    }

    /// Handles a dropped connection. Seats keep their place with the
    /// handle cleared; spectators are removed outright.
    pub fn leave(&mut self, conn_id: ConnectionId) -> Option<Departure> {
        let room_id = self.conn_rooms.remove(&conn_id)?;
        let room = self.rooms.get_mut(&room_id)?;

        if let Some(seat_idx) = room.seat_of_conn(conn_id) {
            let seat = &mut room.seats[seat_idx];
            seat.conn = None;
            let departure = Departure {
                room_id: room_id.clone(),
                name: seat.name.clone(),
                was_player: true,
                room_emptied: !room.has_live_seats(),
            };
            tracing::info!(
                room_id = %room_id,
                name = %departure.name,
                emptied = departure.room_emptied,
                "player disconnected"
            );
            return Some(departure);
        }

        let spec_idx = room
            .spectators
            .iter()
            .position(|s| s.conn.id() == conn_id)?;
        let spectator = room.spectators.remove(spec_idx);
        Some(Departure {
            room_id,
            name: spectator.name,
            was_player: false,
            room_emptied: false,
        })
    }

    /// Deletes a room and forgets every connection bound to it.
    pub fn delete_room(&mut self, room_id: &str) -> bool {
        match self.rooms.remove(room_id) {
            Some(mut room) => {
                room.cancel_delete_timer();
                self.conn_rooms.retain(|_, rid| rid != room_id);
                tracing::info!(room_id, "room deleted");
                true
            }
            None => false,
        }
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn room_mut(&mut self, room_id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(room_id)
    }

    /// The room a connection currently belongs to.
    pub fn room_of_conn(&self, conn_id: ConnectionId) -> Option<&str> {
        self.conn_rooms.get(&conn_id).map(String::as_str)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}
