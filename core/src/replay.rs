use alloc::vec::Vec;

use crate::*;

/// Step-by-step reconstruction of a finished match from its move log.
///
/// Only reveal and flag moves are steps; the board after step `n` depends on
/// nothing but the archived layout and the first `n` steps, so rebuilding the
/// same prefix always yields the same board.
#[derive(Clone, Debug)]
pub struct Replay<'a> {
    entry: &'a HistoryEntry,
    layout: MineLayout,
    steps: Vec<&'a Move>,
}

impl<'a> Replay<'a> {
    pub fn new(entry: &'a HistoryEntry) -> Result<Self> {
        let layout = MineLayout::from_mine_coords(entry.size, &entry.mines)?;
        let steps = entry.moves.iter().filter(|m| m.is_board_action()).collect();
        Ok(Self {
            entry,
            layout,
            steps,
        })
    }

    pub fn entry(&self) -> &HistoryEntry {
        self.entry
    }

    /// Number of reveal/flag steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&Move> {
        self.steps.get(index).copied()
    }

    /// Board after the first `n` steps, `n` clamped to [`Self::len`].
    pub fn board_after(&self, n: usize) -> Board {
        let mut board = Board::with_layout(&self.layout);

        for step in self.steps.iter().take(n) {
            match step {
                Move::Reveal {
                    player, row, col, ..
                } => {
                    let coords = (*row, *col);
                    if !board.size().contains(coords) || !board.cell_at(coords).is_clickable() {
                        log::warn!(
                            "{}: replay skips unplayable reveal at {:?}",
                            self.entry.match_id,
                            coords
                        );
                        continue;
                    }
                    if board.reveal(coords, player) == RevealEffect::Mine {
                        board.reveal_all_mines();
                    }
                }
                Move::Flag { row, col, .. } => {
                    let coords = (*row, *col);
                    if !board.size().contains(coords) || board.toggle_flag(coords).is_err() {
                        log::warn!(
                            "{}: replay skips unplayable flag at {:?}",
                            self.entry.match_id,
                            coords
                        );
                    }
                }
                Move::GameStart { .. } | Move::GameEnd { .. } => {}
            }
        }

        board
    }

    /// Sanitized rows of the board after the first `n` steps.
    pub fn view_after(&self, n: usize) -> Vec<Vec<CellView>> {
        board_view(&self.board_after(n))
    }
}
