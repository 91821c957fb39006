use alloc::vec::Vec;
use core::cmp::Reverse;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::*;

pub const LEADERBOARD_SIZE: usize = 10;

/// Immutable record of a finished match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub match_id: MatchId,
    pub difficulty: Difficulty,
    pub size: Dimensions,
    pub mine_count: CellCount,
    /// Final seating with final scores.
    pub players: Vec<Player>,
    pub winner: Option<PlayerId>,
    pub winner_name: Option<PlayerName>,
    pub reason: EndReason,
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
    pub duration: DurationMs,
    pub moves: Vec<Move>,
    pub mines: Vec<Coord2>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardFilter {
    #[default]
    All,
    #[serde(untagged)]
    Only(Difficulty),
}

impl LeaderboardFilter {
    pub fn matches(self, difficulty: Difficulty) -> bool {
        match self {
            Self::All => true,
            Self::Only(only) => only == difficulty,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub winner: Option<PlayerName>,
    pub duration: DurationMs,
    pub difficulty: Difficulty,
    pub match_id: MatchId,
    pub ended_at: Timestamp,
}

/// Append-only archive of finished matches, keyed by match id.
#[derive(Clone, Debug, Default)]
pub struct HistoryStore {
    entries: HashMap<MatchId, HistoryEntry>,
    limit: Option<usize>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that evicts the oldest-ended entries beyond `limit`.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            entries: HashMap::new(),
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &MatchId) -> bool {
        self.entries.contains_key(id)
    }

    /// Archives `entry`. An id is recorded at most once; a second attempt
    /// is ignored and reported as `false`.
    pub fn record(&mut self, entry: HistoryEntry) -> bool {
        if self.entries.contains_key(&entry.match_id) {
            log::warn!("{}: already archived, keeping the first record", entry.match_id);
            return false;
        }

        log::debug!("{}: archived ({:?})", entry.match_id, entry.reason);
        self.entries.insert(entry.match_id.clone(), entry);
        self.evict();
        true
    }

    /// Every entry, most recently ended first.
    pub fn list(&self) -> Vec<HistoryEntry> {
        let mut entries: Vec<HistoryEntry> = self.entries.values().cloned().collect();
        entries.sort_by(|a, b| {
            b.ended_at
                .cmp(&a.ended_at)
                .then_with(|| a.match_id.cmp(&b.match_id))
        });
        entries
    }

    /// Fastest completed matches, shortest first.
    pub fn leaderboard(&self, filter: LeaderboardFilter, size: usize) -> Vec<LeaderboardEntry> {
        let mut completed: Vec<&HistoryEntry> = self
            .entries
            .values()
            .filter(|entry| entry.reason == EndReason::Completed)
            .filter(|entry| filter.matches(entry.difficulty))
            .collect();
        completed.sort_by(|a, b| {
            a.duration
                .cmp(&b.duration)
                .then_with(|| a.ended_at.cmp(&b.ended_at))
                .then_with(|| a.match_id.cmp(&b.match_id))
        });

        completed
            .into_iter()
            .take(size)
            .enumerate()
            .map(|(i, entry)| LeaderboardEntry {
                rank: i + 1,
                winner: entry.winner_name.clone(),
                duration: entry.duration,
                difficulty: entry.difficulty,
                match_id: entry.match_id.clone(),
                ended_at: entry.ended_at,
            })
            .collect()
    }

    pub fn get(&self, id: &MatchId) -> Option<&HistoryEntry> {
        self.entries.get(id)
    }

    fn evict(&mut self) {
        let Some(limit) = self.limit else {
            return;
        };
        while self.entries.len() > limit {
            let oldest = self
                .entries
                .values()
                .min_by_key(|entry| (entry.ended_at, Reverse(entry.match_id.clone())))
                .map(|entry| entry.match_id.clone());
            let Some(oldest) = oldest else {
                break;
            };
            log::debug!("{}: evicted from history", oldest);
            self.entries.remove(&oldest);
        }
    }
}
