//! Room lifecycle for Parlor: the room table, seat allocation, and
//! reconnection by display name.
//!
//! A room's identity model is deliberately name-based: the browser client
//! navigates between lobby and game pages, which destroys the socket, so
//! the only stable identity across that hop is `{room id, display name}`.
//! Rebinding a seat to a fresh connection when the names match is the
//! reconnect path; it also collapses two simultaneous connections under
//! one name into one seat.

mod error;
mod family;
mod manager;
mod room;

pub use error::RoomError;
pub use family::{color_set, max_players, min_players};
pub use manager::{Departure, JoinOutcome, RoomManager};
pub use room::{Room, Seat, Spectator};
