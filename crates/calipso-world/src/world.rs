//! Double-buffered world state.

use crate::grid::Grid;
use calipso_core::{Error, Result};

/// A pair of equally shaped grids swapped after every step
///
/// `current` is the read side of a step and `next` its write target. The step
/// function must assign every cell of `next` it is responsible for; cells it
/// leaves alone keep whatever the buffer held two steps ago.
#[derive(Debug, Clone)]
pub struct WorldState {
    current: Grid,
    next: Grid,
}

impl WorldState {
    pub fn new(current: Grid, next: Grid) -> Result<Self> {
        if !current.same_shape(&next) {
            return Err(Error::Config(format!(
                "double buffer shapes differ: {:?} vs {:?}",
                current.dims(),
                next.dims()
            )));
        }
        Ok(Self { current, next })
    }

    /// Build a world whose write buffer starts as a copy of `current`
    pub fn from_current(current: Grid) -> Self {
        let next = current.clone();
        Self { current, next }
    }

    pub fn current(&self) -> &Grid {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut Grid {
        &mut self.current
    }

    pub fn next(&self) -> &Grid {
        &self.next
    }

    pub fn dims(&self) -> (usize, usize) {
        self.current.dims()
    }

    /// Both buffers, read side first
    pub fn split(&mut self) -> (&Grid, &mut Grid) {
        (&self.current, &mut self.next)
    }

    /// Run `update` on `(current, next)` then swap
    pub fn step<F>(&mut self, update: F)
    where
        F: FnOnce(&Grid, &mut Grid),
    {
        update(&self.current, &mut self.next);
        self.swap();
    }

    /// Exchange buffer identities without copying cells
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_mismatched_shapes() {
        let result = WorldState::new(Grid::new(4, 4), Grid::new(4, 5));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_swap_is_own_inverse() {
        let mut world = WorldState::new(Grid::new(8, 8), Grid::new(8, 8)).unwrap();
        let current_ptr = world.current().as_slice().as_ptr();
        let next_ptr = world.next().as_slice().as_ptr();

        world.swap();
        assert_eq!(world.current().as_slice().as_ptr(), next_ptr);
        assert_eq!(world.next().as_slice().as_ptr(), current_ptr);

        world.swap();
        assert_eq!(world.current().as_slice().as_ptr(), current_ptr);
        assert_eq!(world.next().as_slice().as_ptr(), next_ptr);
    }

    #[test]
    fn test_step_writes_next_and_swaps() {
        let mut world = WorldState::from_current(Grid::new(3, 3));
        world.step(|current, next| {
            for (dst, src) in next.as_mut_slice().iter_mut().zip(current.as_slice()) {
                *dst = src + 1;
            }
        });
        assert_eq!(world.current().count(1), 9);
        assert_eq!(world.next().count(0), 9);
    }

    #[test]
    fn test_unassigned_cells_keep_stale_values() {
        let mut world = WorldState::new(Grid::filled(2, 1, 5), Grid::filled(2, 1, 9)).unwrap();
        world.step(|_, next| next.put(0, 0, 1));
        assert_eq!(world.current().row(0), &[1, 9]);
    }
}
