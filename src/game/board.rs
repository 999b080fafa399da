//! Per-round result boards and cumulative totals

use std::collections::BTreeMap;

/// One player's distance entry for a round
#[derive(Debug, Clone, PartialEq)]
pub struct BoardEntry {
    pub nickname: String,
    pub distance_m: f64,
}

/// Per-round board: one entry per nickname, first-seen order preserved.
///
/// Entries arrive from polling and may repeat; the last write for a nickname
/// wins. Entries are never removed within a round.
#[derive(Debug, Clone, Default)]
pub struct RoundBoard {
    entries: Vec<BoardEntry>,
}

impl RoundBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a player's distance, replacing any previous entry for them
    pub fn record(&mut self, nickname: &str, distance_m: f64) {
        match self.entries.iter_mut().find(|e| e.nickname == nickname) {
            Some(entry) => entry.distance_m = distance_m,
            None => self.entries.push(BoardEntry {
                nickname: nickname.to_string(),
                distance_m,
            }),
        }
    }

    /// Record a distance only if the player has no entry yet.
    ///
    /// Used for the local timeout penalty: the server's reported value stays
    /// authoritative once present.
    pub fn record_if_absent(&mut self, nickname: &str, distance_m: f64) {
        if !self.contains(nickname) {
            self.record(nickname, distance_m);
        }
    }

    pub fn contains(&self, nickname: &str) -> bool {
        self.entries.iter().any(|e| e.nickname == nickname)
    }

    pub fn distance_for(&self, nickname: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.nickname == nickname)
            .map(|e| e.distance_m)
    }

    /// Number of distinct players with a result this round
    pub fn finisher_count(&self) -> usize {
        self.entries.len()
    }

    /// Entries in arrival order
    pub fn entries(&self) -> &[BoardEntry] {
        &self.entries
    }
}

/// A player's cumulative distance across completed rounds
#[derive(Debug, Clone, PartialEq)]
pub struct TotalEntry {
    pub nickname: String,
    pub total_m: f64,
}

/// All round boards for a match, keyed by round number
#[derive(Debug, Clone, Default)]
pub struct MatchBoards {
    rounds: BTreeMap<u32, RoundBoard>,
}

impl MatchBoards {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn round(&self, round_no: u32) -> Option<&RoundBoard> {
        self.rounds.get(&round_no)
    }

    pub fn round_mut(&mut self, round_no: u32) -> &mut RoundBoard {
        self.rounds.entry(round_no).or_default()
    }

    /// Cumulative totals over completed rounds, ascending (lower is better).
    ///
    /// A round counts as complete when its number is below the current round,
    /// or it is the current round and the reveal has happened. A round whose
    /// reveal is still pending never contributes.
    pub fn compute_totals(&self, current_round: u32, current_revealed: bool) -> Vec<TotalEntry> {
        let mut totals: Vec<TotalEntry> = Vec::new();
        for (&round_no, board) in &self.rounds {
            if round_no > current_round {
                continue;
            }
            if round_no == current_round && !current_revealed {
                continue;
            }
            for entry in board.entries() {
                match totals.iter_mut().find(|t| t.nickname == entry.nickname) {
                    Some(total) => total.total_m += entry.distance_m,
                    None => totals.push(TotalEntry {
                        nickname: entry.nickname.clone(),
                        total_m: entry.distance_m,
                    }),
                }
            }
        }
        totals.sort_by(|a, b| a.total_m.total_cmp(&b.total_m));
        totals
    }
}
