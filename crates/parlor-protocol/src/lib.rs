//! Wire protocol for Parlor.
//!
//! Defines the "language" clients and the server speak: inbound
//! [`ClientCommand`]s, outbound [`ServerEvent`]s, and the per-family
//! `game_state` views. The event names and payload field names here are
//! the client contract and must not drift.
//!
//! The protocol layer knows nothing about connections, rooms, or game
//! rules; it only describes shapes and converts them to/from JSON text.

mod error;
mod types;

pub use error::ProtocolError;
pub use types::{
    BingoWinnerEntry, BoardStateView, BoggleStateView, CardTableStateView,
    ClientCommand, GameFamily, NumberGridStateView, PlayerInfo, ServerEvent,
    Square, StateView, TableComboView, WinnerView, WordEntry,
};

/// Serializes a server event to its wire text.
pub fn encode_event(event: &ServerEvent) -> Result<String, ProtocolError> {
    serde_json::to_string(event).map_err(ProtocolError::Encode)
}

/// Parses one inbound wire message into a command.
pub fn decode_command(text: &str) -> Result<ClientCommand, ProtocolError> {
    serde_json::from_str(text).map_err(ProtocolError::Decode)
}
