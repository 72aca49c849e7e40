//! The bundled word list for boggle.
//!
//! A curated set compiled into the binary; lookups must stay O(1) because
//! they sit on the submit hot path. Swapping in a bigger list is just a
//! matter of replacing `assets/words.txt` (one uppercase word per line).

use std::collections::HashSet;

use once_cell::sync::Lazy;

static WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    include_str!("../assets/words.txt")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
});

/// Dictionary membership for an upper-case word.
pub fn is_word(word: &str) -> bool {
    WORDS.contains(word)
}
