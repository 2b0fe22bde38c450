//! Traffic flow as elementary rule 184: a car advances one cell to the right
//! when the cell ahead is free. Rows wrap around and are independent lanes.

use calipso_core::{CellCode, Palette, Result, Rgb, RunConfig};
use calipso_world::{Grid, NoAgent, SimRng, Simulation, WorldState};
use rand::Rng;
use tracing::debug;

pub const EMPTY: CellCode = 0;
pub const CAR: CellCode = 1;

#[derive(Debug, Clone)]
pub struct Traffic {
    /// Fraction of cells holding a car at start
    pub density: f64,
    cars: usize,
    flow: f64,
}

impl Default for Traffic {
    fn default() -> Self {
        Self {
            density: 0.6,
            cars: 0,
            flow: 0.0,
        }
    }
}

impl Traffic {
    pub fn cars(&self) -> usize {
        self.cars
    }

    /// Share of cars that moved during the last step
    pub fn flow(&self) -> f64 {
        self.flow
    }
}

impl Simulation for Traffic {
    type Agent = NoAgent<Self>;

    fn init(&mut self, config: &RunConfig, rng: &mut SimRng) -> Result<WorldState> {
        let mut grid = Grid::new(config.grid_width, config.grid_height);
        for cell in grid.as_mut_slice() {
            if rng.gen::<f64>() < self.density {
                *cell = CAR;
            }
        }
        self.cars = grid.count(CAR);
        self.flow = 0.0;
        Ok(WorldState::from_current(grid))
    }

    fn step(&mut self, current: &Grid, next: &mut Grid, _rng: &mut SimRng) {
        let width = current.width();
        let mut moved = 0;

        for y in 0..current.height() {
            let lane = current.row(y);
            for x in 0..width {
                let behind = lane[(x + width - 1) % width];
                let ahead = lane[(x + 1) % width];
                let code = match lane[x] {
                    CAR if ahead == CAR => CAR,
                    CAR => {
                        moved += 1;
                        EMPTY
                    }
                    _ if behind == CAR => CAR,
                    _ => EMPTY,
                };
                next.put(x, y, code);
            }
        }

        self.flow = if self.cars > 0 {
            moved as f64 / self.cars as f64
        } else {
            0.0
        };
        debug!(cars = self.cars, moved, flow = self.flow, "Traffic step");
    }

    fn palette(&self) -> Palette {
        Palette::new()
            .with(EMPTY, Rgb::WHITE)
            .with(CAR, Rgb(255, 128, 128))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn lane(cells: &[CellCode]) -> Grid {
        let mut grid = Grid::new(cells.len(), 1);
        grid.as_mut_slice().copy_from_slice(cells);
        grid
    }

    fn step(sim: &mut Traffic, current: &Grid) -> Grid {
        let mut next = Grid::new(current.width(), current.height());
        sim.step(current, &mut next, &mut SimRng::seed_from_u64(0));
        next
    }

    #[test]
    fn test_free_car_moves_and_wraps() {
        let mut sim = Traffic {
            cars: 1,
            ..Default::default()
        };
        let next = step(&mut sim, &lane(&[0, 0, 0, 1]));
        assert_eq!(next.as_slice(), &[1, 0, 0, 0]);
        assert_eq!(sim.flow(), 1.0);
    }

    #[test]
    fn test_queue_releases_front_car_only() {
        let mut sim = Traffic {
            cars: 3,
            ..Default::default()
        };
        let next = step(&mut sim, &lane(&[1, 1, 1, 0, 0, 0]));
        assert_eq!(next.as_slice(), &[1, 1, 0, 1, 0, 0]);
        assert!((sim.flow() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_cars_are_conserved() {
        let config = RunConfig {
            grid_width: 80,
            grid_height: 3,
            ..Default::default()
        };
        let mut sim = Traffic::default();
        let mut rng = SimRng::seed_from_u64(9);
        let mut world = sim.init(&config, &mut rng).unwrap();
        let cars = world.current().count(CAR);
        assert_eq!(sim.cars(), cars);

        for _ in 0..50 {
            world.step(|current, next| sim.step(current, next, &mut rng));
            assert_eq!(world.current().count(CAR), cars);
        }
    }
}
