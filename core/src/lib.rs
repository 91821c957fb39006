#![no_std]

extern crate alloc;

use alloc::vec::Vec;
use core::fmt;
use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use board::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use history::*;
pub use player::*;
pub use replay::*;
pub use types::*;
pub use view::*;

mod board;
mod engine;
mod error;
mod generator;
mod history;
mod player;
mod replay;
mod types;
mod view;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Dimensions,
    pub mines: CellCount,
}

impl GameConfig {
    pub const fn new(size: Dimensions, mines: CellCount) -> Self {
        Self { size, mines }
    }

    pub const fn total_cells(&self) -> CellCount {
        self.size.total_cells()
    }
}

/// Fixed board presets a match can be created with.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Easy, Self::Medium, Self::Hard];

    pub const fn config(self) -> GameConfig {
        match self {
            Self::Easy => GameConfig::new(Dimensions::new(8, 8), 10),
            Self::Medium => GameConfig::new(Dimensions::new(12, 12), 25),
            Self::Hard => GameConfig::new(Dimensions::new(16, 16), 50),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|difficulty| difficulty.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MineLayout {
    mine_mask: Array2<bool>,
    mine_count: CellCount,
}

impl MineLayout {
    pub fn from_mine_mask(mine_mask: Array2<bool>) -> Self {
        let mine_count = mine_mask
            .iter()
            .filter(|&&is_mine| is_mine)
            .count()
            .try_into()
            .unwrap_or(CellCount::MAX);
        Self {
            mine_mask,
            mine_count,
        }
    }

    pub fn from_mine_coords(size: Dimensions, mine_coords: &[Coord2]) -> Result<Self> {
        let mut mine_mask: Array2<bool> = Array2::default(size.as_coords().to_nd_index());

        for &coords in mine_coords {
            if !size.contains(coords) {
                return Err(GameError::InvalidCoords);
            }
            mine_mask[coords.to_nd_index()] = true;
        }

        Ok(Self::from_mine_mask(mine_mask))
    }

    pub fn game_config(&self) -> GameConfig {
        GameConfig::new(self.size(), self.mine_count)
    }

    pub fn size(&self) -> Dimensions {
        Dimensions::of(&self.mine_mask)
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.size().total_cells() - self.mine_count
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self[coords]
    }

    pub fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        // at most 8 neighbours, always fits
        self.size()
            .neighbors(coords)
            .filter(|&pos| self[pos])
            .count() as u8
    }

    /// Mine positions in row-major order.
    pub fn mine_coords(&self) -> Vec<Coord2> {
        self.size()
            .positions()
            .filter(|&pos| self[pos])
            .collect()
    }
}

impl Index<Coord2> for MineLayout {
    type Output = bool;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.mine_mask[coords.to_nd_index()]
    }
}
