use crate::*;
pub use random::*;

mod random;

pub trait MinefieldGenerator {
    fn generate(self, config: GameConfig) -> Result<MineLayout>;
}

/// Cells that must stay mine-free around the first reveal: `start` and its
/// neighbours, clipped at the board edges.
pub fn safe_zone(size: Dimensions, start: Coord2) -> impl Iterator<Item = Coord2> {
    core::iter::once(start).chain(size.neighbors(start))
}
