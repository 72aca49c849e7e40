//! Big two (chor dai di): four hands, combo ranking, table ownership.
//!
//! The holder of the 3♦ opens and must include it in the first play.
//! After that a seat either beats the table combo or passes; three passes
//! against the owner clear the table and hand the lead back.

use rand::Rng;

use parlor_protocol::{CardTableStateView, PlayerInfo, TableComboView};

use crate::cards::{deal_four_hands, Card, THREE_OF_DIAMONDS};

/// Combo kinds. The five-card kinds are ordered: any higher kind beats
/// any lower one, so the derived `Ord` is the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ComboKind {
    Single,
    Pair,
    Triple,
    Straight,
    Flush,
    FullHouse,
    Quads,
    StraightFlush,
}

impl ComboKind {
    fn is_five_card(self) -> bool {
        self >= ComboKind::Straight
    }

    /// The wire label in `tableCombo.type`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Pair => "pair",
            Self::Triple => "triple",
            Self::Straight => "straight",
            Self::Flush => "flush",
            Self::FullHouse => "fullhouse",
            Self::Quads => "quads",
            Self::StraightFlush => "straightflush",
        }
    }
}

/// A classified play, cards sorted ascending by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combo {
    pub kind: ComboKind,
    pub cards: Vec<Card>,
}

impl Combo {
    /// Tie-break key between combos of the same kind: the highest card's
    /// total id (rank then suit).
    fn key(&self) -> u8 {
        self.cards.last().expect("combo never empty").id()
    }

    /// Whether this combo beats the combo currently on the table.
    fn beats(&self, table: &Combo) -> bool {
        if table.kind.is_five_card() {
            self.kind.is_five_card()
                && (self.kind > table.kind
                    || (self.kind == table.kind && self.key() > table.key()))
        } else {
            self.kind == table.kind && self.key() > table.key()
        }
    }
}

/// Classifies a card set, or `None` if it is not a playable combo.
/// Four-card inputs are never legal. Five cards classify in priority
/// order straight-flush > quads > full house > flush > straight.
pub fn classify(cards: &[Card]) -> Option<Combo> {
    let mut sorted = cards.to_vec();
    sorted.sort();

    let same_rank =
        |cs: &[Card]| cs.iter().all(|c| c.rank() == cs[0].rank());

    let kind = match sorted.len() {
        1 => ComboKind::Single,
        2 if same_rank(&sorted) => ComboKind::Pair,
        3 if same_rank(&sorted) => ComboKind::Triple,
        5 => {
            let ranks: Vec<u8> = sorted.iter().map(|c| c.rank()).collect();
            // Five consecutive ranks in the 3..2 ordering, no wrap.
            let straight =
                ranks.windows(2).all(|w| w[1] == w[0] + 1);
            let flush =
                sorted.iter().all(|c| c.suit() == sorted[0].suit());
            let quads = same_rank(&sorted[..4]) || same_rank(&sorted[1..]);
            let full_house = (same_rank(&sorted[..3])
                && same_rank(&sorted[3..]))
                || (same_rank(&sorted[..2]) && same_rank(&sorted[2..]));

            if straight && flush {
                ComboKind::StraightFlush
            } else if quads {
                ComboKind::Quads
            } else if full_house {
                ComboKind::FullHouse
            } else if flush {
                ComboKind::Flush
            } else if straight {
                ComboKind::Straight
            } else {
                return None;
            }
        }
        _ => return None,
    };

    Some(Combo {
        kind,
        cards: sorted,
    })
}

/// Rejection reasons. Display strings go to clients verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlayError {
    #[error("Game over")]
    GameOver,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Card not in hand")]
    CardNotInHand,

    #[error("Invalid combination")]
    InvalidCombination,

    #[error("First play must include 3♦")]
    FirstPlayWithoutLowCard,

    #[error("Does not beat the table")]
    DoesNotBeatTable,

    #[error("Cannot pass on an empty table")]
    PassOnEmptyTable,

    #[error("You own the table — play or wait")]
    OwnerCannotPass,
}

/// A running big two game.
pub struct BigTwoGame {
    hands: [Vec<Card>; 4],
    current_seat: usize,
    table: Option<Combo>,
    table_owner: Option<usize>,
    pass_count: u8,
    first_play: bool,
    winner: Option<usize>,
}

impl BigTwoGame {
    /// Deals a fresh game; the holder of the 3♦ acts first.
    pub fn new(rng: &mut impl Rng) -> Self {
        Self::from_hands(deal_four_hands(rng))
    }

    /// Builds a game from explicit hands (they must partition the deck).
    /// Mainly useful for deterministic tests.
    pub fn from_hands(hands: [Vec<Card>; 4]) -> Self {
        let current_seat = hands
            .iter()
            .position(|h| h.contains(&THREE_OF_DIAMONDS))
            .expect("some hand holds the 3 of diamonds");
        Self {
            hands,
            current_seat,
            table: None,
            table_owner: None,
            pass_count: 0,
            first_play: true,
            winner: None,
        }
    }

    /// The seat whose turn it is.
    pub fn turn(&self) -> usize {
        self.current_seat
    }

    pub fn is_game_over(&self) -> bool {
        self.winner.is_some()
    }

    /// The winning seat, once a hand has been emptied.
    pub fn winner(&self) -> Option<usize> {
        self.winner
    }

    /// The only path to hand contents outside of tests is the per-seat
    /// [`view`](Self::view).
    #[cfg(test)]
    fn hand(&self, seat: usize) -> &[Card] {
        &self.hands[seat]
    }

    /// Plays a combo of card ids from `seat`'s hand.
    pub fn play(
        &mut self,
        seat: usize,
        card_ids: &[u8],
    ) -> Result<(), PlayError> {
        if self.winner.is_some() {
            return Err(PlayError::GameOver);
        }
        if seat != self.current_seat {
            return Err(PlayError::NotYourTurn);
        }

        let mut cards = Vec::with_capacity(card_ids.len());
        for &id in card_ids {
            let card = Card(id);
            if !self.hands[seat].contains(&card) || cards.contains(&card) {
                return Err(PlayError::CardNotInHand);
            }
            cards.push(card);
        }

        let combo =
            classify(&cards).ok_or(PlayError::InvalidCombination)?;

        if self.first_play && !combo.cards.contains(&THREE_OF_DIAMONDS) {
            return Err(PlayError::FirstPlayWithoutLowCard);
        }
        if let Some(table) = &self.table {
            if !combo.beats(table) {
                return Err(PlayError::DoesNotBeatTable);
            }
        }

        self.hands[seat].retain(|c| !combo.cards.contains(c));
        self.table = Some(combo);
        self.table_owner = Some(seat);
        self.pass_count = 0;
        self.first_play = false;

        if self.hands[seat].is_empty() {
            self.winner = Some(seat);
        } else {
            self.current_seat = (seat + 1) % 4;
        }
        Ok(())
    }

    /// Passes. The third consecutive pass clears the table and returns
    /// the turn to the owner, whose pointer is then cleared.
    pub fn pass(&mut self, seat: usize) -> Result<(), PlayError> {
        if self.winner.is_some() {
            return Err(PlayError::GameOver);
        }
        if seat != self.current_seat {
            return Err(PlayError::NotYourTurn);
        }
        if self.table.is_none() {
            return Err(PlayError::PassOnEmptyTable);
        }
        if self.table_owner == Some(seat) {
            return Err(PlayError::OwnerCannotPass);
        }

        self.pass_count += 1;
        if self.pass_count >= 3 {
            self.current_seat =
                self.table_owner.take().expect("table had an owner");
            self.table = None;
            self.pass_count = 0;
        } else {
            self.current_seat = (seat + 1) % 4;
        }
        Ok(())
    }

    /// Builds the `game_state` view for one recipient. Only the view for
    /// `seat` carries that hand; everyone else gets hand counts.
    pub fn view(
        &self,
        seat: Option<usize>,
        players: Vec<PlayerInfo>,
    ) -> CardTableStateView {
        CardTableStateView {
            game_type: "chordaidi".to_string(),
            my_hand: seat.map(|s| {
                self.hands[s].iter().map(|c| c.id()).collect()
            }),
            hand_counts: self.hands.iter().map(Vec::len).collect(),
            current_seat: self.current_seat,
            table_combo: self.table.as_ref().map(|combo| TableComboView {
                combo_type: combo.kind.label().to_string(),
                card_ids: combo.cards.iter().map(|c| c.id()).collect(),
            }),
            table_owner: self.table_owner,
            pass_count: self.pass_count,
            is_game_over: self.winner.is_some(),
            winner: self.winner,
            players,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn cards(ids: &[u8]) -> Vec<Card> {
        ids.iter().map(|&id| Card(id)).collect()
    }

    /// Deterministic hands: seat 2 holds the 3♦ plus low straights;
    /// the deck is partitioned by dealing blocks of 13 raw ids.
    fn fixed_hands() -> [Vec<Card>; 4] {
        let mut hands: [Vec<Card>; 4] = Default::default();
        // Seat 2 gets ids 0..13, seat 3 gets 13..26, seat 0 gets 26..39,
        // seat 1 gets 39..52.
        for id in 0u8..52 {
            let seat = match id / 13 {
                0 => 2,
                1 => 3,
                2 => 0,
                _ => 1,
            };
            hands[seat as usize].push(Card(id));
        }
        hands
    }

    // -- classification ----------------------------------------------------

    #[test]
    fn test_classify_simple_kinds() {
        assert_eq!(classify(&cards(&[5])).unwrap().kind, ComboKind::Single);
        // Two sixes (rank 3): ids 12 and 14.
        assert_eq!(
            classify(&cards(&[12, 14])).unwrap().kind,
            ComboKind::Pair
        );
        assert_eq!(
            classify(&cards(&[12, 13, 15])).unwrap().kind,
            ComboKind::Triple
        );
        // Mixed ranks are not a pair.
        assert!(classify(&cards(&[12, 16])).is_none());
        // Four-card inputs are never legal, even four of a kind.
        assert!(classify(&cards(&[12, 13, 14, 15])).is_none());
    }

    #[test]
    fn test_classify_five_card_priority() {
        // 3,4,5,6,7 mixed suits: straight.
        assert_eq!(
            classify(&cards(&[0, 5, 10, 13, 17])).unwrap().kind,
            ComboKind::Straight
        );
        // All diamonds, ranks 3,5,7,9,J: flush.
        assert_eq!(
            classify(&cards(&[0, 8, 16, 24, 32])).unwrap().kind,
            ComboKind::Flush
        );
        // Three fours and two fives: full house.
        assert_eq!(
            classify(&cards(&[4, 5, 6, 8, 9])).unwrap().kind,
            ComboKind::FullHouse
        );
        // Four threes and a kicker: quads.
        assert_eq!(
            classify(&cards(&[0, 1, 2, 3, 17])).unwrap().kind,
            ComboKind::Quads
        );
        // 3♦4♦5♦6♦7♦: straight flush outranks its flush reading.
        assert_eq!(
            classify(&cards(&[0, 4, 8, 12, 16])).unwrap().kind,
            ComboKind::StraightFlush
        );
        // A,2 then 3: ranks 11,12 don't wrap around to 0.
        assert!(classify(&cards(&[44, 48, 0, 4, 9])).is_none());
    }

    #[test]
    fn test_pair_tiebreak_uses_highest_suit() {
        // 6♣6♠ beats 6♦6♥: same rank, key compares card ids.
        let low = classify(&cards(&[12, 14])).unwrap(); // 6♦ 6♥
        let high = classify(&cards(&[13, 15])).unwrap(); // 6♣ 6♠
        assert!(high.beats(&low));
        assert!(!low.beats(&high));
    }

    #[test]
    fn test_five_card_kind_ordering_beats() {
        let straight = classify(&cards(&[0, 5, 10, 13, 17])).unwrap();
        let flush = classify(&cards(&[0, 8, 16, 24, 32])).unwrap();
        let quads = classify(&cards(&[4, 5, 6, 7, 0])).unwrap();
        assert!(flush.beats(&straight));
        assert!(quads.beats(&flush));
        assert!(!straight.beats(&flush));
        // A single never beats a five-card combo and vice versa.
        let single = classify(&cards(&[51])).unwrap();
        assert!(!single.beats(&straight));
        assert!(!straight.beats(&single));
    }

    // -- game flow ---------------------------------------------------------

    #[test]
    fn test_first_play_must_include_three_of_diamonds() {
        let mut game = BigTwoGame::from_hands(fixed_hands());
        assert_eq!(game.turn(), 2, "holder of card 0 acts first");

        // 6♦ alone is a fine single but not a legal opener.
        assert_eq!(
            game.play(2, &[12]),
            Err(PlayError::FirstPlayWithoutLowCard)
        );

        game.play(2, &[0]).unwrap();
        let view = game.view(None, vec![]);
        let table = view.table_combo.unwrap();
        assert_eq!(table.combo_type, "single");
        assert_eq!(table.card_ids, vec![0]);
        assert_eq!(view.table_owner, Some(2));
        assert_eq!(game.turn(), 3);
    }

    #[test]
    fn test_play_rejections() {
        let mut game = BigTwoGame::from_hands(fixed_hands());
        assert_eq!(game.play(0, &[26]), Err(PlayError::NotYourTurn));
        // Seat 2 does not hold id 26.
        assert_eq!(game.play(2, &[26]), Err(PlayError::CardNotInHand));
        // Duplicated id.
        assert_eq!(game.play(2, &[0, 0]), Err(PlayError::CardNotInHand));
        // 3♦ with an off-rank second card is no combo.
        assert_eq!(
            game.play(2, &[0, 5]),
            Err(PlayError::InvalidCombination)
        );
    }

    #[test]
    fn test_must_beat_table_and_pass_bookkeeping() {
        let mut game = BigTwoGame::from_hands(fixed_hands());
        game.play(2, &[0]).unwrap(); // 3♦ single, owner = 2

        game.pass(3).unwrap();
        assert_eq!(game.turn(), 0);
        game.pass(0).unwrap();
        // The third pass clears the table back to the owner.
        game.pass(1).unwrap();

        let view = game.view(None, vec![]);
        assert_eq!(game.turn(), 2);
        assert!(view.table_combo.is_none());
        assert_eq!(view.table_owner, None);
        assert_eq!(view.pass_count, 0);
    }

    #[test]
    fn test_owner_cannot_pass_and_empty_table_cannot_be_passed() {
        let mut game = BigTwoGame::from_hands(fixed_hands());
        assert_eq!(game.pass(2), Err(PlayError::PassOnEmptyTable));

        game.play(2, &[0]).unwrap();
        game.pass(3).unwrap();
        game.pass(0).unwrap();
        game.pass(1).unwrap();
        // Round cleared; owner regained the lead onto an empty table.
        assert_eq!(game.pass(2), Err(PlayError::PassOnEmptyTable));

        // The owner guard itself: the turn can only come back to the
        // owner through a round clear, so force the state directly.
        game.play(2, &[1]).unwrap(); // 3♣ single, owner = 2
        game.current_seat = 2;
        assert_eq!(game.pass(2), Err(PlayError::OwnerCannotPass));
    }

    #[test]
    fn test_singles_that_fail_to_beat_the_table() {
        // Deal blocks so seat 2 holds only middling cards.
        let mut hands: [Vec<Card>; 4] = Default::default();
        for id in 0u8..52 {
            let seat = match id / 13 {
                0 => 0,
                1 => 3,
                2 => 2,
                _ => 1,
            };
            hands[seat as usize].push(Card(id));
        }
        let mut game = BigTwoGame::from_hands(hands);
        assert_eq!(game.turn(), 0);
        game.play(0, &[0]).unwrap();

        // A pair is no answer to a table single.
        assert_eq!(
            game.play(1, &[40, 41]),
            Err(PlayError::DoesNotBeatTable)
        );
        game.play(1, &[51]).unwrap(); // 2♠, the top single
        assert_eq!(game.play(2, &[38]), Err(PlayError::DoesNotBeatTable));
    }

    #[test]
    fn test_win_when_hand_empties() {
        // Seat 2 plays its whole hand as singles while everyone passes.
        let mut game = BigTwoGame::from_hands(fixed_hands());
        loop {
            let lowest = game.hand(2)[0].id();
            game.play(2, &[lowest]).unwrap();
            if game.is_game_over() {
                break;
            }
            game.pass(3).unwrap();
            game.pass(0).unwrap();
            game.pass(1).unwrap();
        }
        assert_eq!(game.winner(), Some(2));
        assert_eq!(game.play(3, &[13]), Err(PlayError::GameOver));
        let view = game.view(Some(2), vec![]);
        assert_eq!(view.my_hand.as_deref(), Some(&[][..]));
        assert!(view.is_game_over);
        assert_eq!(view.winner, Some(2));
    }

    #[test]
    fn test_hands_partition_deck_and_shrink() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut game = BigTwoGame::new(&mut rng);
        let opener = game.turn();
        assert!(game.hand(opener).contains(&THREE_OF_DIAMONDS));

        let before: usize = (0..4).map(|s| game.hand(s).len()).sum();
        assert_eq!(before, 52);
        game.play(opener, &[0]).unwrap();
        let after: usize = (0..4).map(|s| game.hand(s).len()).sum();
        assert_eq!(after, 51);
    }

    #[test]
    fn test_view_hides_other_hands() {
        let game = BigTwoGame::from_hands(fixed_hands());
        let spectator = game.view(None, vec![]);
        assert!(spectator.my_hand.is_none());
        assert_eq!(spectator.hand_counts, vec![13, 13, 13, 13]);

        let seat0 = game.view(Some(0), vec![]);
        assert_eq!(
            seat0.my_hand.unwrap(),
            (26..39).collect::<Vec<u8>>()
        );
    }
}
