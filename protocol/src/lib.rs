//! Wire messages exchanged between clients and the match server.
//!
//! Both directions are JSON objects tagged by a `type` field, with camelCase
//! keys. Board snapshots travel as [`MatchView`], which never exposes hidden
//! mines.

use serde::{Deserialize, Serialize};

pub use mineduel_core::{
    CellView, Coord, Difficulty, HistoryEntry, LeaderboardEntry, LeaderboardFilter, MatchId,
    MatchView,
};

/// Requests a connection can send.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    CreateMatch {
        player_name: String,
        /// Unknown or missing names fall back to the server default.
        #[serde(default)]
        difficulty: Option<String>,
        #[serde(default)]
        max_players: Option<u8>,
    },
    JoinMatch {
        match_id: MatchId,
        player_name: String,
    },
    StartMatch {
        match_id: MatchId,
    },
    RevealCell {
        match_id: MatchId,
        row: Coord,
        col: Coord,
    },
    ToggleFlag {
        match_id: MatchId,
        row: Coord,
        col: Coord,
    },
    LeaveMatch {
        match_id: MatchId,
    },
    GetHistory,
    GetLeaderboard {
        #[serde(default)]
        filter: LeaderboardFilter,
    },
    GetReplay {
        match_id: MatchId,
    },
}

/// A `Waiting` match as advertised in the lobby.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyMatch {
    pub match_id: MatchId,
    pub players: usize,
    pub max_players: u8,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbySnapshot {
    pub active_connections: usize,
    pub available_matches: Vec<LobbyMatch>,
}

/// Events the server pushes to connections.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    LobbyJoined,
    LobbyUpdate(LobbySnapshot),
    MatchCreated {
        match_id: MatchId,
        state: MatchView,
    },
    MatchJoined {
        match_id: MatchId,
        state: MatchView,
    },
    MatchUpdate {
        state: MatchView,
    },
    ActionError {
        reason: String,
    },
    HistoryList {
        entries: Vec<HistoryEntry>,
    },
    LeaderboardList {
        filter: LeaderboardFilter,
        entries: Vec<LeaderboardEntry>,
    },
    ReplayData {
        entry: HistoryEntry,
    },
}

impl ServerMessage {
    pub fn error(reason: impl ToString) -> Self {
        Self::ActionError {
            reason: reason.to_string(),
        }
    }
}

pub fn decode_client(text: &str) -> serde_json::Result<ClientMessage> {
    serde_json::from_str(text)
}

pub fn encode_server(message: &ServerMessage) -> serde_json::Result<String> {
    serde_json::to_string(message)
}
