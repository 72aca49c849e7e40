//! Authoritative game engines for Parlor.
//!
//! Five rule engines behind one tagged union ([`Engine`]): western chess,
//! xiangqi, big two (chor dai di), boggle, and bingo. Engines are pure
//! synchronous state machines with no I/O, so the dispatcher can drive
//! them under its lock and every transition is trivially testable.
//!
//! Private state never leaves an engine raw: the card-table engine builds
//! the per-seat `game_state` view itself, so a recipient's seat index is
//! the only thing the dispatcher chooses.

mod bigtwo;
mod bingo;
mod board;
mod boggle;
mod cards;
mod chess;
mod dictionary;
mod engine;
mod xiangqi;

pub use bigtwo::{BigTwoGame, PlayError};
pub use bingo::{BingoGame, CallError};
pub use board::{FenError, MoveError, Side};
pub use boggle::{BoggleGame, RoundResults, SubmitError};
pub use cards::{deal_four_hands, Card, THREE_OF_DIAMONDS};
pub use chess::ChessGame;
pub use engine::{Engine, Winner};
pub use xiangqi::XiangqiGame;
