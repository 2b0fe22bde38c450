//! 2D grid of cell codes.

use calipso_core::{CellCode, Position};
use serde::{Deserialize, Serialize};

/// A fixed-size grid of cell codes, stored row-major
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<CellCode>,
}

impl Grid {
    /// Create a grid with every cell set to 0
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0)
    }

    pub fn filled(width: usize, height: usize, code: CellCode) -> Self {
        Self {
            width,
            height,
            cells: vec![code; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn same_shape(&self, other: &Grid) -> bool {
        self.dims() == other.dims()
    }

    /// Get the code at `(x, y)`; panics when out of range, like slice indexing
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> CellCode {
        self.cells[self.index(x, y)]
    }

    /// Set the code at `(x, y)`; panics when out of range
    #[inline]
    pub fn put(&mut self, x: usize, y: usize, code: CellCode) {
        let index = self.index(x, y);
        self.cells[index] = code;
    }

    /// Get code at position (with toroidal wrapping)
    pub fn get(&self, pos: Position) -> CellCode {
        let wrapped = pos.wrap(self.width, self.height);
        self.at(wrapped.x as usize, wrapped.y as usize)
    }

    /// Whether any Moore neighbor (radius 1, wrapped) holds `code`
    pub fn any_neighbor(&self, pos: Position, code: CellCode) -> bool {
        (-1..=1)
            .flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .any(|(dx, dy)| self.get(pos.add(dx, dy)) == code)
    }

    /// Number of cells holding `code`
    pub fn count(&self, code: CellCode) -> usize {
        self.cells.iter().filter(|&&c| c == code).count()
    }

    /// Overwrite every cell from a grid of the same shape
    pub fn copy_from(&mut self, other: &Grid) {
        debug_assert!(self.same_shape(other));
        self.cells.copy_from_slice(&other.cells);
    }

    pub fn row(&self, y: usize) -> &[CellCode] {
        let start = y * self.width;
        &self.cells[start..start + self.width]
    }

    pub fn as_slice(&self) -> &[CellCode] {
        &self.cells
    }

    pub fn as_mut_slice(&mut self) -> &mut [CellCode] {
        &mut self.cells
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        assert!(x < self.width && y < self.height, "cell ({x}, {y}) outside grid");
        y * self.width + x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(10, 4);
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 4);
        assert_eq!(grid.as_slice().len(), 40);
        assert_eq!(grid.count(0), 40);
    }

    #[test]
    fn test_toroidal_wrapping() {
        let mut grid = Grid::new(10, 10);
        grid.put(9, 9, 3);
        grid.put(0, 0, 2);

        assert_eq!(grid.get(Position::new(-1, -1)), 3);
        assert_eq!(grid.get(Position::new(10, 10)), 2);
        assert_eq!(grid.get(Position::new(-10, 9)), 3);
    }

    #[test]
    fn test_row_major_layout() {
        let mut grid = Grid::new(3, 2);
        grid.put(2, 1, 5);
        assert_eq!(grid.row(1), &[0, 0, 5]);
        assert_eq!(grid.as_slice()[5], 5);
        assert_eq!(grid.get(Position::new(2, 1)), 5);
    }

    #[test]
    fn test_any_neighbor() {
        let mut grid = Grid::new(5, 5);
        grid.put(4, 4, 2);
        assert!(grid.any_neighbor(Position::new(0, 0), 2));
        assert!(!grid.any_neighbor(Position::new(2, 2), 2));
        assert!(!grid.any_neighbor(Position::new(4, 4), 2));
    }

    #[test]
    fn test_copy_from() {
        let mut source = Grid::new(4, 4);
        source.put(1, 2, 9);
        let mut target = Grid::filled(4, 4, 1);
        target.copy_from(&source);
        assert_eq!(target, source);
        assert_eq!(target.count(9), 1);
        assert_eq!(target.count(0), 15);
    }

    proptest! {
        #[test]
        fn prop_wrapped_access_matches_modulo(
            w in 1usize..20,
            h in 1usize..20,
            x in -100i64..100,
            y in -100i64..100,
        ) {
            let wx = x.rem_euclid(w as i64) as usize;
            let wy = y.rem_euclid(h as i64) as usize;
            let mut grid = Grid::new(w, h);
            grid.put(wx, wy, 1);

            prop_assert_eq!(grid.get(Position::new(x, y)), 1);
            prop_assert_eq!(grid.count(1), 1);
        }
    }
}
