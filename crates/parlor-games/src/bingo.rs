//! Bingo: caller-driven number draws over per-seat 5x5 cards.
//!
//! Cards are generated column by column from the classic disjoint ranges
//! (B 1-15, I 16-30, N 31-45, G 46-60, O 61-75) with a pre-marked FREE
//! center. Seat 0 is the caller; every card is public.

use rand::seq::SliceRandom;
use rand::Rng;

use parlor_protocol::{BingoWinnerEntry, NumberGridStateView, PlayerInfo};

/// The FREE center square is modeled as 0.
const FREE: u8 = 0;

/// Rejection reasons. Display strings go to clients verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    #[error("Game over")]
    GameOver,

    #[error("Only the caller can call numbers")]
    NotTheCaller,

    #[error("No numbers left")]
    PoolEmpty,
}

/// A running bingo game.
pub struct BingoGame {
    /// Remaining numbers, drawn from the back.
    pool: Vec<u8>,
    called: Vec<u8>,
    cards: Vec<[[u8; 5]; 5]>,
    marked: Vec<[[bool; 5]; 5]>,
    winners: Vec<BingoWinnerEntry>,
    over: bool,
}

impl BingoGame {
    /// Deals cards for 2..=8 seats and shuffles the 1..=75 pool.
    pub fn new(player_count: usize, rng: &mut impl Rng) -> Self {
        let mut pool: Vec<u8> = (1..=75).collect();
        pool.shuffle(rng);

        let mut cards = Vec::with_capacity(player_count);
        let mut marked = Vec::with_capacity(player_count);
        for _ in 0..player_count {
            cards.push(generate_card(rng));
            let mut marks = [[false; 5]; 5];
            marks[2][2] = true; // FREE
            marked.push(marks);
        }

        Self {
            pool,
            called: Vec::new(),
            cards,
            marked,
            winners: Vec::new(),
            over: false,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.over
    }

    /// Every number drawn so far, in call order.
    pub fn called(&self) -> &[u8] {
        &self.called
    }

    /// The accumulated winners with their pattern labels.
    pub fn winners(&self) -> &[BingoWinnerEntry] {
        &self.winners
    }

    /// Draws the next number, marks every card, and scans for winners.
    /// Any seat newly completing a pattern on this call is appended to
    /// the winners list; the first such call ends the game.
    pub fn call_number(&mut self, seat: usize) -> Result<u8, CallError> {
        if seat != 0 {
            return Err(CallError::NotTheCaller);
        }
        if self.over {
            return Err(CallError::GameOver);
        }
        let number = self.pool.pop().ok_or(CallError::PoolEmpty)?;
        self.called.push(number);

        for (card, marks) in self.cards.iter().zip(self.marked.iter_mut()) {
            for r in 0..5 {
                for c in 0..5 {
                    if card[r][c] == number {
                        marks[r][c] = true;
                    }
                }
            }
        }

        for seat in 0..self.cards.len() {
            if self.winners.iter().any(|w| w.seat == seat) {
                continue;
            }
            let types = win_patterns(&self.marked[seat]);
            if !types.is_empty() {
                self.winners.push(BingoWinnerEntry { seat, types });
            }
        }
        if !self.winners.is_empty() {
            self.over = true;
        }

        Ok(number)
    }

    /// Builds the `game_state` view; bingo has nothing to hide.
    pub fn view(&self, players: Vec<PlayerInfo>) -> NumberGridStateView {
        NumberGridStateView {
            game_type: "bingo".to_string(),
            called: self.called.clone(),
            last_called: self.called.last().copied(),
            cards: self.cards.clone(),
            marked: self.marked.clone(),
            is_game_over: self.over,
            winners: self.winners.clone(),
            caller_seat: 0,
            player_count: self.cards.len(),
            players,
        }
    }
}

/// One card: five distinct numbers per column from that column's range,
/// FREE in the center.
fn generate_card(rng: &mut impl Rng) -> [[u8; 5]; 5] {
    let mut card = [[0u8; 5]; 5];
    for col in 0..5 {
        let low = 1 + 15 * col as u8;
        let mut range: Vec<u8> = (low..low + 15).collect();
        range.shuffle(rng);
        for row in 0..5 {
            card[row][col] = range[row];
        }
    }
    card[2][2] = FREE;
    card
}

/// Labels of every complete pattern on a marked grid.
fn win_patterns(marks: &[[bool; 5]; 5]) -> Vec<String> {
    let mut types = Vec::new();
    if (0..5).any(|r| (0..5).all(|c| marks[r][c])) {
        types.push("row".to_string());
    }
    if (0..5).any(|c| (0..5).all(|r| marks[r][c])) {
        types.push("col".to_string());
    }
    if (0..5).all(|i| marks[i][i]) || (0..5).all(|i| marks[i][4 - i]) {
        types.push("diagonal".to_string());
    }
    if marks.iter().all(|row| row.iter().all(|&m| m)) {
        types.push("fullhouse".to_string());
    }
    types
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_cards_respect_column_ranges_and_free_center() {
        let mut rng = StdRng::seed_from_u64(3);
        let game = BingoGame::new(4, &mut rng);

        for (seat, card) in game.cards.iter().enumerate() {
            assert_eq!(card[2][2], FREE);
            assert!(game.marked[seat][2][2], "center pre-marked");
            for col in 0..5 {
                let low = 1 + 15 * col as u8;
                let mut seen = std::collections::HashSet::new();
                for row in 0..5 {
                    if (row, col) == (2, 2) {
                        continue;
                    }
                    let n = card[row][col];
                    assert!(
                        (low..low + 15).contains(&n),
                        "column {col} number {n}"
                    );
                    assert!(seen.insert(n), "distinct within column");
                }
            }
        }
    }

    #[test]
    fn test_only_the_caller_draws() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut game = BingoGame::new(2, &mut rng);
        assert_eq!(game.call_number(1), Err(CallError::NotTheCaller));
        assert!(game.call_number(0).is_ok());
    }

    #[test]
    fn test_calls_are_unique_and_in_range_and_marked_cells_match() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut game = BingoGame::new(3, &mut rng);

        for _ in 0..30 {
            if game.is_game_over() {
                break;
            }
            game.call_number(0).unwrap();
        }

        let mut seen = std::collections::HashSet::new();
        for &n in game.called() {
            assert!((1..=75).contains(&n));
            assert!(seen.insert(n), "no repeats");
        }

        // Every marked cell is FREE or a called number.
        for (card, marks) in game.cards.iter().zip(&game.marked) {
            for r in 0..5 {
                for c in 0..5 {
                    if marks[r][c] {
                        let n = card[r][c];
                        assert!(
                            n == FREE || game.called().contains(&n),
                            "marked {n} was never called"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_game_ends_when_a_pattern_completes() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut game = BingoGame::new(2, &mut rng);

        while !game.is_game_over() {
            game.call_number(0).unwrap();
        }
        assert!(!game.winners().is_empty());
        for winner in game.winners() {
            assert!(!winner.types.is_empty());
        }
        assert_eq!(game.call_number(0), Err(CallError::GameOver));
    }

    #[test]
    fn test_win_patterns_labels() {
        let mut marks = [[false; 5]; 5];
        assert!(win_patterns(&marks).is_empty());

        marks[1] = [true; 5];
        assert_eq!(win_patterns(&marks), vec!["row"]);

        let mut marks = [[false; 5]; 5];
        for r in 0..5 {
            marks[r][3] = true;
        }
        assert_eq!(win_patterns(&marks), vec!["col"]);

        let mut marks = [[false; 5]; 5];
        for i in 0..5 {
            marks[i][4 - i] = true;
        }
        assert_eq!(win_patterns(&marks), vec!["diagonal"]);

        let full = [[true; 5]; 5];
        assert_eq!(
            win_patterns(&full),
            vec!["row", "col", "diagonal", "fullhouse"]
        );
    }

    #[test]
    fn test_simultaneous_winners_all_recorded() {
        // Force both cards to share the same N column so one call can
        // complete a line on each.
        let mut rng = StdRng::seed_from_u64(8);
        let mut game = BingoGame::new(2, &mut rng);
        let shared_col: Vec<u8> =
            (0..5).map(|r| game.cards[0][r][2]).collect();
        for r in 0..5 {
            game.cards[1][r][2] = shared_col[r];
        }

        // Call the shared column numbers directly from the pool order.
        game.pool.retain(|n| !shared_col.contains(n));
        for &n in shared_col.iter().filter(|&&n| n != FREE) {
            game.pool.push(n);
        }
        while !game.is_game_over() {
            game.call_number(0).unwrap();
        }
        let seats: Vec<usize> =
            game.winners().iter().map(|w| w.seat).collect();
        assert_eq!(seats, vec![0, 1], "both seats won on the same call");
    }

    #[test]
    fn test_view_exposes_everything_publicly() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut game = BingoGame::new(2, &mut rng);
        game.call_number(0).unwrap();

        let view = game.view(vec![]);
        assert_eq!(view.game_type, "bingo");
        assert_eq!(view.caller_seat, 0);
        assert_eq!(view.player_count, 2);
        assert_eq!(view.called.len(), 1);
        assert_eq!(view.last_called, Some(view.called[0]));
        assert_eq!(view.cards.len(), 2);
    }
}
