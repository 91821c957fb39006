use std::path::Path;

use mineduel_core::{Difficulty, LEADERBOARD_SIZE, MAX_PLAYERS, MIN_PLAYERS};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

const MIN_ID_LENGTH: usize = 4;
const MAX_ID_LENGTH: usize = 16;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Used when a create request names no known difficulty.
    pub default_difficulty: Difficulty,
    /// Used when a create request gives no player limit.
    pub default_max_players: u8,
    pub match_id_length: usize,
    /// Keep at most this many finished matches; unbounded when absent.
    pub history_limit: Option<usize>,
    pub leaderboard_size: usize,
    /// Fixed seed for match ids and mine layouts.
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            default_difficulty: Difficulty::Medium,
            default_max_players: MAX_PLAYERS,
            match_id_length: 6,
            history_limit: None,
            leaderboard_size: LEADERBOARD_SIZE,
            seed: None,
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str::<Self>(text)?.normalized())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("Loading config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Clamps values into the ranges the registry supports.
    pub fn normalized(mut self) -> Self {
        self.default_max_players = self.default_max_players.clamp(MIN_PLAYERS, MAX_PLAYERS);
        self.match_id_length = self.match_id_length.clamp(MIN_ID_LENGTH, MAX_ID_LENGTH);
        self
    }

    pub fn difficulty_or_default(&self, requested: Option<&str>) -> Difficulty {
        requested
            .and_then(Difficulty::from_name)
            .unwrap_or(self.default_difficulty)
    }

    pub fn max_players_or_default(&self, requested: Option<u8>) -> u8 {
        requested
            .unwrap_or(self.default_max_players)
            .clamp(MIN_PLAYERS, MAX_PLAYERS)
    }
}
