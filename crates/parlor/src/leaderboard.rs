//! In-memory win counts per game family. Vanishes on restart by design.

use std::collections::HashMap;

/// One row of a leaderboard query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub wins: u32,
}

/// `{family -> {display name -> wins}}`.
pub struct Leaderboard {
    wins: HashMap<String, HashMap<String, u32>>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self {
            wins: HashMap::new(),
        }
    }

    pub fn record_win(&mut self, family: &str, name: &str) {
        *self
            .wins
            .entry(family.to_string())
            .or_default()
            .entry(name.to_string())
            .or_default() += 1;
    }

    /// Top `limit` names by wins descending, for one family or across all
    /// of them. Equal counts order alphabetically so results are stable.
    pub fn top(
        &self,
        family: Option<&str>,
        limit: usize,
    ) -> Vec<LeaderboardEntry> {
        let mut totals: HashMap<&str, u32> = HashMap::new();
        for (fam, names) in &self.wins {
            if family.is_some_and(|f| f != fam) {
                continue;
            }
            for (name, wins) in names {
                *totals.entry(name.as_str()).or_default() += wins;
            }
        }

        let mut entries: Vec<LeaderboardEntry> = totals
            .into_iter()
            .map(|(name, wins)| LeaderboardEntry {
                name: name.to_string(),
                wins,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.wins.cmp(&a.wins).then_with(|| a.name.cmp(&b.name))
        });
        entries.truncate(limit);
        entries
    }
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self::new()
    }
}
