//! The uniform engine surface the dispatcher drives.
//!
//! One enum variant per game family. The shared queries (`family`,
//! `is_game_over`, `winner`, `undo`) live here; family-specific verbs are
//! called on the concrete engine after matching the variant.

use rand::Rng;

use parlor_protocol::GameFamily;

use crate::{BigTwoGame, BingoGame, BoggleGame, ChessGame, XiangqiGame};

/// A family-specific winner representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Winner {
    /// Board games: `white`, `black`, or `red`.
    Color(&'static str),
    /// Big two and boggle: the winning seat.
    Seat(usize),
    /// Bingo: every seat that completed a pattern.
    Seats(Vec<usize>),
    /// Chess only: stalemate.
    Draw,
}

/// A running engine of any family.
pub enum Engine {
    Chess(ChessGame),
    Xiangqi(XiangqiGame),
    ChorDaiDi(BigTwoGame),
    Boggle(BoggleGame),
    Bingo(BingoGame),
}

impl Engine {
    /// Starts a fresh engine for a family and seat count.
    pub fn start(
        family: GameFamily,
        player_count: usize,
        rng: &mut impl Rng,
    ) -> Self {
        match family {
            GameFamily::Chess => Self::Chess(ChessGame::new()),
            GameFamily::Xiangqi => Self::Xiangqi(XiangqiGame::new()),
            GameFamily::ChorDaiDi => Self::ChorDaiDi(BigTwoGame::new(rng)),
            GameFamily::Boggle => {
                Self::Boggle(BoggleGame::new(player_count, rng))
            }
            GameFamily::Bingo => {
                Self::Bingo(BingoGame::new(player_count, rng))
            }
        }
    }

    pub fn family(&self) -> GameFamily {
        match self {
            Self::Chess(_) => GameFamily::Chess,
            Self::Xiangqi(_) => GameFamily::Xiangqi,
            Self::ChorDaiDi(_) => GameFamily::ChorDaiDi,
            Self::Boggle(_) => GameFamily::Boggle,
            Self::Bingo(_) => GameFamily::Bingo,
        }
    }

    pub fn is_game_over(&self) -> bool {
        match self {
            Self::Chess(game) => game.is_game_over(),
            Self::Xiangqi(game) => game.is_game_over(),
            Self::ChorDaiDi(game) => game.is_game_over(),
            Self::Boggle(game) => game.is_game_over(),
            Self::Bingo(game) => game.is_game_over(),
        }
    }

    pub fn winner(&self) -> Option<Winner> {
        match self {
            Self::Chess(game) => game.winner().map(|w| match w {
                "draw" => Winner::Draw,
                color => Winner::Color(color),
            }),
            Self::Xiangqi(game) => game.winner().map(Winner::Color),
            Self::ChorDaiDi(game) => game.winner().map(Winner::Seat),
            Self::Boggle(game) => game.winner().map(Winner::Seat),
            Self::Bingo(game) => {
                let seats: Vec<usize> =
                    game.winners().iter().map(|w| w.seat).collect();
                if seats.is_empty() {
                    None
                } else {
                    Some(Winner::Seats(seats))
                }
            }
        }
    }

    /// Takes back one ply in the board games; other families have no
    /// history to rewind.
    pub fn undo(&mut self) -> bool {
        match self {
            Self::Chess(game) => game.undo(),
            Self::Xiangqi(game) => game.undo(),
            _ => false,
        }
    }
}
