//! Pieces shared by the two board-game engines.

use std::fmt;

/// Side to move. `White` doubles as red in xiangqi (red moves first and
/// serializes as `w`, matching the wire contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn flip(self) -> Side {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// The one-letter FEN / wire form.
    pub fn letter(self) -> char {
        match self {
            Self::White => 'w',
            Self::Black => 'b',
        }
    }

    pub fn from_letter(c: char) -> Option<Side> {
        match c {
            'w' => Some(Self::White),
            'b' => Some(Self::Black),
            _ => None,
        }
    }

    /// Which side owns a piece code (uppercase = white / red).
    pub fn of_piece(piece: char) -> Side {
        if piece.is_ascii_uppercase() {
            Self::White
        } else {
            Self::Black
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Rejection reasons for chess and xiangqi moves. The display strings are
/// sent to clients verbatim in `invalid_move`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("Game over")]
    GameOver,

    #[error("No piece at source")]
    NoPieceAtSource,

    #[error("Not your piece")]
    NotYourPiece,

    #[error("Illegal move")]
    IllegalMove,

    #[error("Move leaves king in check")]
    LeavesKingInCheck,
}

/// A position string that could not be parsed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid FEN: {0}")]
pub struct FenError(pub String);
