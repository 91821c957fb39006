use alloc::vec::Vec;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub is_mine: bool,
    pub is_revealed: bool,
    pub is_flagged: bool,
    /// Only meaningful for non-mine cells.
    pub neighbor_mines: u8,
    pub revealed_by: Option<PlayerId>,
}

impl Cell {
    pub const fn is_clickable(&self) -> bool {
        !self.is_revealed && !self.is_flagged
    }
}

/// What a single reveal did to the board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevealEffect {
    /// Safe cells opened, in the order the flood-fill reached them.
    Opened(Vec<Coord2>),
    Mine,
}

/// Player-owned grid of cells. Mines are laid exactly once, on the first
/// reveal, so that reveal can never hit one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    config: GameConfig,
    cells: Array2<Cell>,
    mines_placed: bool,
    revealed_count: CellCount,
}

impl Board {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            cells: Array2::default(config.size.as_coords().to_nd_index()),
            mines_placed: false,
            revealed_count: 0,
        }
    }

    /// Board with a known layout, as used for replays.
    pub fn with_layout(layout: &MineLayout) -> Self {
        let mut board = Self::new(layout.game_config());
        board.place_mines(layout);
        board
    }

    pub fn size(&self) -> Dimensions {
        self.config.size
    }

    pub fn mine_count(&self) -> CellCount {
        self.config.mines
    }

    pub fn mines_placed(&self) -> bool {
        self.mines_placed
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if self.size().contains(coords) {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn cell_at(&self, coords: Coord2) -> &Cell {
        &self.cells[coords.to_nd_index()]
    }

    /// Lays out mines unless they are already placed. Returns whether the
    /// layout was applied.
    pub fn place_mines(&mut self, layout: &MineLayout) -> bool {
        if self.mines_placed {
            log::debug!("Mines already placed, ignoring new layout");
            return false;
        }

        for coords in self.size().positions() {
            let cell = &mut self.cells[coords.to_nd_index()];
            cell.is_mine = layout.contains_mine(coords);
            cell.neighbor_mines = if cell.is_mine {
                0
            } else {
                layout.adjacent_mine_count(coords)
            };
        }
        self.config.mines = layout.mine_count();
        self.mines_placed = true;
        true
    }

    /// Generates and places mines anchored at `start`; a no-op once placed.
    pub fn ensure_mines(&mut self, seed: u64, start: Coord2) -> Result<()> {
        if self.mines_placed {
            return Ok(());
        }
        let layout = RandomMinefieldGenerator::new(seed, start).generate(self.config)?;
        self.place_mines(&layout);
        Ok(())
    }

    /// Reveals `coords` on behalf of `by`. A zero cell floods outwards
    /// through an explicit worklist; flagged cells stop the flood.
    pub fn reveal(&mut self, coords: Coord2, by: &PlayerId) -> RevealEffect {
        if self.cell_at(coords).is_mine {
            self.cells[coords.to_nd_index()].is_revealed = true;
            return RevealEffect::Mine;
        }

        let size = self.size();
        let mut opened = Vec::new();
        let mut to_visit = alloc::vec![coords];

        while let Some(visit_coords) = to_visit.pop() {
            let cell = &mut self.cells[visit_coords.to_nd_index()];
            if cell.is_revealed || cell.is_flagged || cell.is_mine {
                continue;
            }

            cell.is_revealed = true;
            cell.revealed_by = Some(by.clone());
            self.revealed_count += 1;
            opened.push(visit_coords);

            if cell.neighbor_mines == 0 {
                log::trace!("Flood-fill continues from {:?}", visit_coords);
                to_visit.extend(size.neighbors(visit_coords).filter(|&pos| {
                    let next = &self.cells[pos.to_nd_index()];
                    !next.is_revealed && !next.is_flagged
                }));
            }
        }

        RevealEffect::Opened(opened)
    }

    /// Exposes every mine, returning their positions in row-major order.
    pub fn reveal_all_mines(&mut self) -> Vec<Coord2> {
        let mines = self.mine_positions();
        for &pos in &mines {
            self.cells[pos.to_nd_index()].is_revealed = true;
        }
        mines
    }

    /// Flips the flag at `coords`, returning the new flag state.
    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<bool> {
        let cell = &mut self.cells[coords.to_nd_index()];
        if cell.is_revealed {
            return Err(GameError::AlreadyRevealed);
        }
        cell.is_flagged = !cell.is_flagged;
        Ok(cell.is_flagged)
    }

    /// True once every non-mine cell is revealed.
    pub fn is_cleared(&self) -> bool {
        self.mines_placed && self.cells.iter().all(|cell| cell.is_mine || cell.is_revealed)
    }

    pub fn mine_positions(&self) -> Vec<Coord2> {
        self.size()
            .positions()
            .filter(|&pos| self.cell_at(pos).is_mine)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn board(size: Dimensions, mines: &[Coord2]) -> Board {
        Board::with_layout(&MineLayout::from_mine_coords(size, mines).unwrap())
    }

    fn alice() -> PlayerId {
        PlayerId::new("alice")
    }

    #[test]
    fn flood_fill_opens_zero_region_and_its_border() {
        let mut board = board(Dimensions::new(3, 3), &[(2, 2)]);

        let RevealEffect::Opened(mut opened) = board.reveal((0, 0), &alice()) else {
            panic!("expected safe reveal");
        };
        opened.sort();

        assert_eq!(opened.len(), 8);
        assert!(!opened.contains(&(2, 2)));
        assert!(board.is_cleared());
        assert_eq!(board.cell_at((1, 1)).neighbor_mines, 1);
        assert_eq!(board.cell_at((1, 1)).revealed_by, Some(alice()));
    }

    #[test]
    fn flood_fill_stops_at_flags() {
        let mut board = board(Dimensions::new(1, 5), &[(0, 4)]);
        board.toggle_flag((0, 1)).unwrap();

        assert_eq!(board.reveal((0, 0), &alice()), RevealEffect::Opened(vec![(0, 0)]));
        assert!(!board.cell_at((0, 2)).is_revealed);
    }

    #[test]
    fn numbered_cell_opens_alone() {
        let mut board = board(Dimensions::new(3, 3), &[(0, 0)]);

        assert_eq!(board.reveal((1, 1), &alice()), RevealEffect::Opened(vec![(1, 1)]));
        assert_eq!(board.revealed_count(), 1);
    }

    #[test]
    fn flood_fill_closure_property() {
        let mut board = Board::new(Difficulty::Hard.config());
        board.ensure_mines(99, (8, 8)).unwrap();

        let RevealEffect::Opened(opened) = board.reveal((8, 8), &alice()) else {
            panic!("start zone must be safe");
        };

        // every opened cell is safe and touches an opened zero cell (or is the start)
        for &pos in &opened {
            assert!(!board.cell_at(pos).is_mine);
            if pos != (8, 8) {
                assert!(
                    board
                        .size()
                        .neighbors(pos)
                        .any(|n| opened.contains(&n) && board.cell_at(n).neighbor_mines == 0)
                );
            }
        }
    }

    #[test]
    fn mine_reveal_reports_mine() {
        let mut board = board(Dimensions::new(2, 2), &[(0, 0), (1, 1)]);

        assert_eq!(board.reveal((0, 0), &alice()), RevealEffect::Mine);
        assert_eq!(board.reveal_all_mines(), [(0, 0), (1, 1)]);
        assert!(board.cell_at((1, 1)).is_revealed);
        assert_eq!(board.cell_at((1, 1)).revealed_by, None);
    }

    #[test]
    fn mines_are_placed_once() {
        let mut board = Board::new(Difficulty::Easy.config());
        board.ensure_mines(1, (0, 0)).unwrap();
        let first = board.mine_positions();

        board.ensure_mines(2, (7, 7)).unwrap();
        let other = MineLayout::from_mine_coords(board.size(), &[(3, 3)]).unwrap();
        assert!(!board.place_mines(&other));

        assert_eq!(board.mine_positions(), first);
        assert_eq!(first.len(), 10);
    }

    #[test]
    fn flag_toggles_and_refuses_revealed_cells() {
        let mut board = board(Dimensions::new(2, 2), &[(0, 0)]);

        assert_eq!(board.toggle_flag((0, 0)), Ok(true));
        assert_eq!(board.toggle_flag((0, 0)), Ok(false));
        board.reveal((1, 1), &alice());
        assert_eq!(board.toggle_flag((1, 1)), Err(GameError::AlreadyRevealed));
    }

    #[test]
    fn unplaced_board_is_never_cleared() {
        assert!(!Board::new(Difficulty::Easy.config()).is_cleared());
    }
}
