use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::*;

/// Client-facing cell. Hidden cells never carry mine information.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellView {
    pub is_revealed: bool,
    pub is_flagged: bool,
    pub is_mine: bool,
    pub neighbor_mines: u8,
    pub revealed_by: Option<PlayerId>,
}

impl CellView {
    pub fn from_cell(cell: &Cell) -> Self {
        if !cell.is_revealed {
            return Self {
                is_flagged: cell.is_flagged,
                ..Self::default()
            };
        }

        Self {
            is_revealed: true,
            is_flagged: cell.is_flagged,
            is_mine: cell.is_mine,
            neighbor_mines: if cell.is_mine { 0 } else { cell.neighbor_mines },
            revealed_by: cell.revealed_by.clone(),
        }
    }
}

/// Sanitized rows of `board`, top to bottom.
pub fn board_view(board: &Board) -> Vec<Vec<CellView>> {
    let size = board.size();
    (0..size.rows)
        .map(|row| {
            (0..size.cols)
                .map(|col| CellView::from_cell(board.cell_at((row, col))))
                .collect()
        })
        .collect()
}

/// Snapshot of a match that is safe to send to any client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    pub match_id: MatchId,
    pub difficulty: Difficulty,
    pub max_players: u8,
    pub host: PlayerId,
    pub players: Vec<Player>,
    pub state: MatchState,
    pub current_player: usize,
    pub width: Coord,
    pub height: Coord,
    pub mine_count: CellCount,
    pub board: Vec<Vec<CellView>>,
    pub winner: Option<PlayerId>,
    pub end_reason: Option<EndReason>,
    /// Reserved; spectating is not supported.
    pub spectators: Vec<PlayerId>,
}

impl MatchView {
    pub fn from_match(game: &Match) -> Self {
        let board = game.board();
        Self {
            match_id: game.id().clone(),
            difficulty: game.difficulty(),
            max_players: game.max_players(),
            host: game.host().clone(),
            players: game.players().to_vec(),
            state: game.state(),
            current_player: game.current_player(),
            width: board.size().cols,
            height: board.size().rows,
            mine_count: board.mine_count(),
            board: board_view(board),
            winner: game.winner().cloned(),
            end_reason: game.end_reason(),
            spectators: Vec::new(),
        }
    }
}
