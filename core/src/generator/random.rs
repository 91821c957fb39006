use super::*;

/// Uniformly random layout that keeps the first revealed cell and its
/// neighbours free of mines.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomMinefieldGenerator {
    seed: u64,
    start: Coord2,
}

impl RandomMinefieldGenerator {
    pub fn new(seed: u64, start: Coord2) -> Self {
        Self { seed, start }
    }
}

impl MinefieldGenerator for RandomMinefieldGenerator {
    fn generate(self, config: GameConfig) -> Result<MineLayout> {
        use rand::prelude::*;

        if !config.size.contains(self.start) {
            return Err(GameError::InvalidCoords);
        }

        let mut mines: Array2<bool> = Array2::default(config.size.as_coords().to_nd_index());

        // reserve the safe zone so placement skips it, undone below
        let mut reserved: CellCount = 0;
        for coords in safe_zone(config.size, self.start) {
            mines[coords.to_nd_index()] = true;
            reserved += 1;
        }

        let mut free_cells = config.total_cells() - reserved;
        if config.mines > free_cells {
            log::warn!(
                "Cannot keep start zone clear, requested {} mines but only {} cells are free",
                config.mines,
                free_cells
            );
            return Err(GameError::TooManyMines);
        }

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut mines_placed: CellCount = 0;
        if let Some(cells) = mines.as_slice_mut() {
            while mines_placed < config.mines {
                let mut place = rng.random_range(0..free_cells) as usize;
                for (i, cell) in cells.iter_mut().enumerate() {
                    if *cell {
                        place += 1;
                        continue;
                    }
                    if i == place {
                        *cell = true;
                        mines_placed += 1;
                        free_cells -= 1;
                        break;
                    }
                }
            }
        }

        for coords in safe_zone(config.size, self.start) {
            mines[coords.to_nd_index()] = false;
        }

        let layout = MineLayout::from_mine_mask(mines);
        if layout.mine_count() != config.mines {
            log::warn!(
                "Generated minefield count mismatch, actual: {}, requested: {}",
                layout.mine_count(),
                config.mines
            );
        }
        Ok(layout)
    }
}
