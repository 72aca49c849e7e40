//! Per-family seat metadata: color sets and seat counts.
//!
//! Seat 0 is always the host: the first-to-act color in the board games,
//! the caller in bingo.

use parlor_protocol::GameFamily;

/// The ordered color labels for a family. The list length is the seat
/// capacity; colors are assigned in order as players join.
pub fn color_set(family: GameFamily) -> &'static [&'static str] {
    match family {
        GameFamily::Chess => &["white", "black"],
        GameFamily::Xiangqi => &["red", "black"],
        GameFamily::ChorDaiDi => &["south", "west", "north", "east"],
        GameFamily::Boggle => &["red", "blue", "green", "purple"],
        GameFamily::Bingo => {
            &["caller", "p2", "p3", "p4", "p5", "p6", "p7", "p8"]
        }
    }
}

/// Seats required before the host may start.
pub fn min_players(family: GameFamily) -> usize {
    match family {
        GameFamily::Chess | GameFamily::Xiangqi => 2,
        GameFamily::ChorDaiDi => 4,
        GameFamily::Boggle | GameFamily::Bingo => 2,
    }
}

/// Seat capacity; joins beyond this become spectators.
pub fn max_players(family: GameFamily) -> usize {
    color_set(family).len()
}
