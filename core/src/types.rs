use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Single grid axis, used for board width/height and for row/column positions.
pub type Coord = u8;

/// Count type used for mine counts, cell counts and scores.
pub type CellCount = u16;

/// Grid position as `(row, col)`.
pub type Coord2 = (Coord, Coord);

/// Milliseconds since the Unix epoch, supplied by the host.
pub type Timestamp = u64;

/// Milliseconds between two [`Timestamp`]s.
pub type DurationMs = u64;

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

/// Board dimensions, `rows` high and `cols` wide.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub rows: Coord,
    pub cols: Coord,
}

impl Dimensions {
    pub const fn new(rows: Coord, cols: Coord) -> Self {
        Self { rows, cols }
    }

    pub const fn total_cells(self) -> CellCount {
        mult(self.rows, self.cols)
    }

    pub const fn contains(self, (row, col): Coord2) -> bool {
        row < self.rows && col < self.cols
    }

    pub const fn as_coords(self) -> Coord2 {
        (self.rows, self.cols)
    }

    /// Neighbours of `center` that exist on this grid, no wraparound.
    pub fn neighbors(self, center: Coord2) -> NeighborIter {
        NeighborIter::new(center, self.as_coords())
    }

    /// Every position in row-major order.
    pub fn positions(self) -> impl Iterator<Item = Coord2> {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| (row, col)))
    }

    pub(crate) fn of<T>(grid: &Array2<T>) -> Self {
        let (rows, cols) = grid.dim();
        Self {
            rows: rows.try_into().unwrap_or(Coord::MAX),
            cols: cols.try_into().unwrap_or(Coord::MAX),
        }
    }
}

const DISPLACEMENTS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Applies `delta` to `coords`, returning a value only when it remains in bounds.
fn apply_delta(coords: Coord2, delta: (i8, i8), bounds: Coord2) -> Option<Coord2> {
    let (row, col) = coords;
    let (dr, dc) = delta;
    let (max_row, max_col) = bounds;

    let next_row = row.checked_add_signed(dr)?;
    if next_row >= max_row {
        return None;
    }

    let next_col = col.checked_add_signed(dc)?;
    if next_col >= max_col {
        return None;
    }

    Some((next_row, next_col))
}

#[derive(Debug)]
pub struct NeighborIter {
    center: Coord2,
    bounds: Coord2,
    index: u8,
}

impl NeighborIter {
    fn new(center: Coord2, bounds: Coord2) -> Self {
        Self {
            center,
            bounds,
            index: 0,
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let delta = *DISPLACEMENTS.get(usize::from(self.index))?;
            self.index += 1;

            if let Some(next_item) = apply_delta(self.center, delta, self.bounds) {
                return Some(next_item);
            }
        }
    }
}
