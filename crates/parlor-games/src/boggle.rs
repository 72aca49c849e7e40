//! Boggle: a shared 4x4 dice board, concurrent submissions, and
//! unique-word scoring at round end.
//!
//! Submissions race in real time against a 180 second clock. Words that
//! more than one seat found cancel out; only unique finds score.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

use parlor_protocol::{BoggleStateView, WordEntry};

use crate::dictionary;

/// The sixteen standard dice. One face each is rolled per game; the `Q`
/// face stands for the digraph `QU` during matching.
const DICE: [&str; 16] = [
    "AAEEGN", "ABBJOO", "ACHOPS", "AFFKPS", "AOOTTW", "CIMOTU", "DEILRX",
    "DELRVY", "DISTTY", "EEGHNW", "EEINSU", "EHRTVW", "EIOSST", "ELRTTY",
    "HIMNQU", "HLNNRZ",
];

const ROUND_SECS: u64 = 180;
const MIN_WORD_LEN: usize = 3;

/// Point value by word length.
fn word_score(word: &str) -> u32 {
    match word.chars().count() {
        0..=4 => 1,
        5 => 2,
        6 => 3,
        7 => 5,
        _ => 11,
    }
}

/// Rejection reasons. Display strings go to clients verbatim in
/// `boggle_reject`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("Round is over")]
    RoundOver,

    #[error("Time is up")]
    TimeUp,

    #[error("Words must be at least 3 letters")]
    TooShort,

    #[error("Letters only")]
    LettersOnly,

    #[error("Already submitted")]
    AlreadySubmitted,

    #[error("Not a valid word")]
    NotAWord,

    #[error("Cannot be formed on the board")]
    NotOnBoard,
}

/// Final per-seat scores and annotated word lists. Cached after the first
/// `end_round` so the call is idempotent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResults {
    pub scores: Vec<u32>,
    pub words: Vec<Vec<WordEntry>>,
}

/// A running boggle round.
pub struct BoggleGame {
    board: [char; 16],
    submissions: Vec<HashSet<String>>,
    started: Instant,
    round: Duration,
    over: bool,
    results: Option<RoundResults>,
}

impl BoggleGame {
    /// Rolls a fresh board for the given seat count.
    pub fn new(player_count: usize, rng: &mut impl Rng) -> Self {
        let mut order: Vec<usize> = (0..16).collect();
        order.shuffle(rng);

        let mut board = ['A'; 16];
        for (cell, &die) in order.iter().enumerate() {
            let faces: Vec<char> = DICE[die].chars().collect();
            board[cell] = *faces.choose(rng).expect("die has faces");
        }
        Self::with_board(board, player_count)
    }

    /// Starts a round on a fixed board (row-major). Used by tests.
    pub fn with_board(board: [char; 16], player_count: usize) -> Self {
        Self {
            board,
            submissions: vec![HashSet::new(); player_count],
            started: Instant::now(),
            round: Duration::from_secs(ROUND_SECS),
            over: false,
            results: None,
        }
    }

    /// Seconds remaining on the shared clock.
    pub fn time_left(&self) -> u64 {
        self.round
            .saturating_sub(self.started.elapsed())
            .as_secs()
    }

    pub fn is_game_over(&self) -> bool {
        self.over
    }

    /// Per-seat accepted word counts, safe to broadcast mid-round.
    pub fn submission_counts(&self) -> Vec<usize> {
        self.submissions.iter().map(HashSet::len).collect()
    }

    /// Validates and records one word for a seat. Returns the normalized
    /// (upper-cased) form on success.
    pub fn submit_word(
        &mut self,
        seat: usize,
        word: &str,
    ) -> Result<String, SubmitError> {
        if self.over {
            return Err(SubmitError::RoundOver);
        }
        if self.started.elapsed() >= self.round {
            return Err(SubmitError::TimeUp);
        }

        let word = word.trim().to_ascii_uppercase();
        if word.chars().count() < MIN_WORD_LEN {
            return Err(SubmitError::TooShort);
        }
        if !word.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(SubmitError::LettersOnly);
        }
        if self.submissions[seat].contains(&word) {
            return Err(SubmitError::AlreadySubmitted);
        }
        if !dictionary::is_word(&word) {
            return Err(SubmitError::NotAWord);
        }
        if !can_form(&self.board, &word) {
            return Err(SubmitError::NotOnBoard);
        }

        self.submissions[seat].insert(word.clone());
        Ok(word)
    }

    /// Ends the round and scores it. Idempotent: the first call computes
    /// and caches the results, later calls return the same values.
    pub fn end_round(&mut self) -> RoundResults {
        if let Some(results) = &self.results {
            return results.clone();
        }
        self.over = true;

        // Invert the per-seat sets: word -> how many seats found it.
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for set in &self.submissions {
            for word in set {
                *counts.entry(word.as_str()).or_default() += 1;
            }
        }

        let mut scores = Vec::with_capacity(self.submissions.len());
        let mut words = Vec::with_capacity(self.submissions.len());
        for set in &self.submissions {
            let mut entries: Vec<WordEntry> = set
                .iter()
                .map(|word| {
                    let unique = counts[word.as_str()] == 1;
                    WordEntry {
                        word: word.clone(),
                        unique,
                        points: if unique { word_score(word) } else { 0 },
                    }
                })
                .collect();
            entries.sort_by(|a, b| {
                b.unique.cmp(&a.unique).then(a.word.cmp(&b.word))
            });
            scores.push(entries.iter().map(|e| e.points).sum());
            words.push(entries);
        }

        let results = RoundResults { scores, words };
        self.results = Some(results.clone());
        results
    }

    /// The seat with the highest final score, lowest index on ties.
    /// `None` while the round is still running.
    pub fn winner(&self) -> Option<usize> {
        let results = self.results.as_ref()?;
        results
            .scores
            .iter()
            .enumerate()
            .max_by(|(ai, a), (bi, b)| a.cmp(b).then(bi.cmp(ai)))
            .map(|(seat, _)| seat)
    }

    /// Builds the `game_state` view; scores and word lists appear once
    /// the round has ended.
    pub fn view(&self) -> BoggleStateView {
        BoggleStateView {
            game_type: "boggle".to_string(),
            board: self.board.to_vec(),
            time_left: self.time_left(),
            submission_counts: self.submission_counts(),
            is_game_over: self.over,
            scores: self.results.as_ref().map(|r| r.scores.clone()),
            words: self.results.as_ref().map(|r| r.words.clone()),
            player_count: self.submissions.len(),
        }
    }
}

// ---------------------------------------------------------------------------
// Path search
// ---------------------------------------------------------------------------

/// Whether the word can be traced through face-adjacent cells without
/// reusing any cell. The face `Q` consumes the digraph `QU`.
fn can_form(board: &[char; 16], word: &str) -> bool {
    let chars: Vec<char> = word.chars().collect();
    (0..16).any(|start| dfs(board, &chars, 0, start, 0))
}

fn dfs(
    board: &[char; 16],
    word: &[char],
    pos: usize,
    cell: usize,
    visited: u16,
) -> bool {
    let face = board[cell];
    let consumed = if face == 'Q' {
        if word.get(pos) == Some(&'Q') && word.get(pos + 1) == Some(&'U') {
            2
        } else {
            return false;
        }
    } else if word.get(pos) == Some(&face) {
        1
    } else {
        return false;
    };

    let next = pos + consumed;
    if next == word.len() {
        return true;
    }

    let visited = visited | (1 << cell);
    let (row, col) = (cell as i32 / 4, cell as i32 % 4);
    for dr in -1..=1i32 {
        for dc in -1..=1i32 {
            if (dr, dc) == (0, 0) {
                continue;
            }
            let (nr, nc) = (row + dr, col + dc);
            if !(0..4).contains(&nr) || !(0..4).contains(&nc) {
                continue;
            }
            let neighbor = (nr * 4 + nc) as usize;
            if visited & (1 << neighbor) == 0
                && dfs(board, word, next, neighbor, visited)
            {
                return true;
            }
        }
    }
    false
}

// =========================================================================
// Tests
// =========================================================================
