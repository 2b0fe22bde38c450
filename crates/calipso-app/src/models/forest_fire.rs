//! Forest fire: fire spreads to trees through the Moore neighborhood, burns
//! down to ash, and after a warm-up period trees regrow and ignite at random.

use calipso_core::{CellCode, Palette, Position, Result, Rgb, RunConfig};
use calipso_world::{Grid, NoAgent, SimRng, Simulation, WorldState};
use rand::Rng;
use tracing::debug;

pub const EMPTY: CellCode = 0;
pub const TREE: CellCode = 1;
pub const FIRE: CellCode = 2;
pub const ASH: CellCode = 3;

#[derive(Debug, Clone)]
pub struct ForestFire {
    /// Probability that a cell starts as a tree
    pub density: f64,
    /// Iteration after which spontaneous ignition and regrowth kick in
    pub warmup: u64,
    /// Chance per step that a tree catches fire on its own
    pub p_ignite: f64,
    /// Chance per step that an empty cell grows a tree
    pub p_grow: f64,
    iteration: u64,
    initial_trees: usize,
    tree_fraction: f64,
}

impl Default for ForestFire {
    fn default() -> Self {
        Self {
            density: 0.5,
            warmup: 70,
            p_ignite: 0.002,
            p_grow: 0.006,
            iteration: 1,
            initial_trees: 0,
            tree_fraction: 1.0,
        }
    }
}

impl ForestFire {
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Trees left, relative to the initial forest
    pub fn tree_fraction(&self) -> f64 {
        self.tree_fraction
    }

    fn burn(current: &Grid, x: usize, y: usize) -> CellCode {
        match current.at(x, y) {
            ASH => EMPTY,
            FIRE => ASH,
            TREE if current.any_neighbor(Position::new(x as i64, y as i64), FIRE) => FIRE,
            TREE => TREE,
            _ => EMPTY,
        }
    }
}

impl Simulation for ForestFire {
    type Agent = NoAgent<Self>;

    fn init(&mut self, config: &RunConfig, rng: &mut SimRng) -> Result<WorldState> {
        let (dx, dy) = (config.grid_width, config.grid_height);
        let mut grid = Grid::new(dx, dy);
        for cell in grid.as_mut_slice() {
            if rng.gen::<f64>() < self.density {
                *cell = TREE;
            }
        }
        grid.put(dx / 2, dy / 2, FIRE);

        self.iteration = 1;
        self.initial_trees = grid.count(TREE);
        self.tree_fraction = 1.0;

        WorldState::new(grid, Grid::new(dx, dy))
    }

    fn step(&mut self, current: &Grid, next: &mut Grid, rng: &mut SimRng) {
        let random_events = self.iteration > self.warmup;

        for y in 0..current.height() {
            for x in 0..current.width() {
                let mut code = Self::burn(current, x, y);
                if random_events {
                    let ignite = rng.gen::<f64>() < self.p_ignite;
                    let grow = rng.gen::<f64>() < self.p_grow;
                    if ignite && code == TREE {
                        code = FIRE;
                    }
                    if grow && code == EMPTY {
                        code = TREE;
                    }
                }
                next.put(x, y, code);
            }
        }

        self.tree_fraction = if self.initial_trees > 0 {
            next.count(TREE) as f64 / self.initial_trees as f64
        } else {
            0.0
        };
        debug!(iteration = self.iteration, tree_fraction = self.tree_fraction, "Forest step");
        self.iteration += 1;
    }

    fn palette(&self) -> Palette {
        Palette::new()
            .with(EMPTY, Rgb::WHITE)
            .with(TREE, Rgb(40, 200, 40))
            .with(FIRE, Rgb(255, 40, 40))
            .with(ASH, Rgb::BLACK)
    }
}
