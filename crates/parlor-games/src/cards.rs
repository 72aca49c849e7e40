//! The 52-card deck used by big two.
//!
//! A card is a stable integer id `0..52` with `id = rank * 4 + suit`.
//! Ranks run 3,4,5,6,7,8,9,10,J,Q,K,A,2 (3 lowest, 2 highest) and suits
//! run diamonds, clubs, hearts, spades — so the raw id is a total order
//! and doubles as the tie-break key between cards of equal rank.

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

const RANK_NAMES: [&str; 13] = [
    "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K", "A", "2",
];
const SUIT_NAMES: [char; 4] = ['♦', '♣', '♥', '♠'];

/// One card, identified by its deck id.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct Card(pub u8);

/// Card 0: the 3 of diamonds, which opens every game.
pub const THREE_OF_DIAMONDS: Card = Card(0);

impl Card {
    /// Rank index 0..13, where 0 is a 3 and 12 is a 2.
    pub fn rank(self) -> u8 {
        self.0 / 4
    }

    /// Suit index 0..4: diamonds, clubs, hearts, spades.
    pub fn suit(self) -> u8 {
        self.0 % 4
    }

    pub fn id(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            RANK_NAMES[self.rank() as usize],
            SUIT_NAMES[self.suit() as usize]
        )
    }
}

/// Shuffles ids 0..52 and deals every fourth card to each of four hands,
/// each hand sorted ascending.
pub fn deal_four_hands(rng: &mut impl Rng) -> [Vec<Card>; 4] {
    let mut ids: Vec<u8> = (0..52).collect();
    ids.shuffle(rng);

    let mut hands: [Vec<Card>; 4] = Default::default();
    for (i, id) in ids.into_iter().enumerate() {
        hands[i % 4].push(Card(id));
    }
    for hand in &mut hands {
        hand.sort();
    }
    hands
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_card_zero_is_three_of_diamonds() {
        assert_eq!(THREE_OF_DIAMONDS.rank(), 0);
        assert_eq!(THREE_OF_DIAMONDS.suit(), 0);
        assert_eq!(THREE_OF_DIAMONDS.to_string(), "3♦");
    }

    #[test]
    fn test_rank_and_suit_decomposition() {
        // id 12 = rank 3 (a six), suit 0 (diamonds).
        assert_eq!(Card(12).to_string(), "6♦");
        // id 51 = rank 12 (a two), suit 3 (spades) — the highest card.
        assert_eq!(Card(51).to_string(), "2♠");
        assert_eq!(Card(51).rank(), 12);
    }

    #[test]
    fn test_deal_partitions_whole_deck() {
        let mut rng = StdRng::seed_from_u64(7);
        let hands = deal_four_hands(&mut rng);

        let mut all: Vec<u8> =
            hands.iter().flatten().map(|c| c.id()).collect();
        all.sort();
        assert_eq!(all, (0..52).collect::<Vec<_>>());
        for hand in &hands {
            assert_eq!(hand.len(), 13);
            assert!(hand.windows(2).all(|w| w[0] < w[1]), "sorted");
        }
    }
}
