//! Predators and prey wandering on a torus, leaving fading trails.
//!
//! Predators eat prey sharing their cell and starve after `famine` steps
//! without food. Both species reproduce with a small chance every
//! `reproduce_every` iterations.

use calipso_core::{CellCode, Direction, Palette, Result, Rgb, RunConfig};
use calipso_world::{Agent, AgentContext, Grid, SimRng, Simulation, WorldState};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

pub const EMPTY: CellCode = 0;
pub const TREE: CellCode = 1;
pub const FIRE: CellCode = 2;
pub const PREY_TRAIL: CellCode = 3;
pub const PREDATOR_TRAIL: CellCode = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Species {
    Prey,
    Predator,
}

impl Species {
    pub fn code(self) -> CellCode {
        match self {
            Species::Prey => 0,
            Species::Predator => 1,
        }
    }

    fn trail(self) -> CellCode {
        match self {
            Species::Prey => PREY_TRAIL,
            Species::Predator => PREDATOR_TRAIL,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Creature {
    pub species: Species,
    pub x: i64,
    pub y: i64,
    pub alive: bool,
    pub trail: bool,
    pub hunger: u32,
}

impl Creature {
    pub fn new(species: Species, x: i64, y: i64) -> Self {
        Self {
            species,
            x,
            y,
            alive: true,
            trail: true,
            hunger: 0,
        }
    }

    fn wander(&mut self, grid: &Grid, rng: &mut SimRng) {
        if let Some(direction) = Direction::all().choose(rng) {
            let (dx, dy) = direction.to_delta();
            self.x = (self.x + dx).rem_euclid(grid.width() as i64);
            self.y = (self.y + dy).rem_euclid(grid.height() as i64);
        }
    }

    fn die(&mut self) {
        self.alive = false;
        self.trail = false;
    }
}

impl Agent for Creature {
    type Sim = PredatorPrey;

    fn position(&self) -> (f64, f64) {
        (self.x as f64, self.y as f64)
    }

    fn is_active(&self) -> bool {
        self.alive
    }

    fn kind(&self) -> CellCode {
        self.species.code()
    }

    fn update(&mut self, ctx: &mut AgentContext<'_, Self>) {
        if !ctx.sim.counted {
            let census = |species: Species| {
                ctx.peers
                    .iter()
                    .chain(std::iter::once(&*self))
                    .filter(|c| c.alive && c.species == species)
                    .count()
            };
            ctx.sim.prey_count = census(Species::Prey);
            ctx.sim.predator_count = census(Species::Predator);
            ctx.sim.counted = true;
        }

        self.wander(ctx.grid, ctx.rng);
        if self.trail {
            ctx.grid.put(self.x as usize, self.y as usize, self.species.trail());
        }

        let params = ctx.sim.params.clone();

        if self.species == Species::Predator {
            let (x, y) = (self.x, self.y);
            let meal = ctx
                .peers
                .iter_mut()
                .find(|c| c.alive && c.species == Species::Prey && c.x == x && c.y == y);
            match meal {
                Some(prey) => {
                    prey.die();
                    self.hunger = 0;
                }
                None => self.hunger += 1,
            }

            if self.hunger >= params.famine {
                self.die();
                ctx.grid.put(self.x as usize, self.y as usize, EMPTY);
                return;
            }
        }

        let birth_chance = match self.species {
            Species::Prey => params.p_prey_birth,
            Species::Predator => params.p_predator_birth,
        };
        if ctx.sim.iteration % params.reproduce_every == 0 && ctx.rng.gen::<f64>() < birth_chance {
            ctx.peers.spawn(Creature::new(self.species, self.x, self.y));
            ctx.sim.births += 1;
        }
    }
}

#[derive(Debug, Clone)]
pub struct PredatorPreyParams {
    pub p_prey_birth: f64,
    pub p_predator_birth: f64,
    /// Steps a predator survives without eating
    pub famine: u32,
    pub reproduce_every: u64,
    /// Trails are wiped every this many iterations
    pub trail_every: u64,
    /// Initial population, one third of it predators
    pub population: usize,
}

impl Default for PredatorPreyParams {
    fn default() -> Self {
        Self {
            p_prey_birth: 0.009,
            p_predator_birth: 0.0033,
            famine: 600,
            reproduce_every: 5,
            trail_every: 10,
            population: 50,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PredatorPrey {
    pub params: PredatorPreyParams,
    iteration: u64,
    prey_count: usize,
    predator_count: usize,
    births: usize,
    counted: bool,
}

impl PredatorPrey {
    pub fn new(params: PredatorPreyParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Living prey and predators, as seen by the first agent of the last pass
    pub fn census(&self) -> (usize, usize) {
        (self.prey_count, self.predator_count)
    }

    pub fn births(&self) -> usize {
        self.births
    }
}

impl Simulation for PredatorPrey {
    type Agent = Creature;

    fn init(&mut self, config: &RunConfig, _rng: &mut SimRng) -> Result<WorldState> {
        self.iteration = 1;
        self.prey_count = 0;
        self.predator_count = 0;
        self.births = 0;
        self.counted = false;
        Ok(WorldState::from_current(Grid::new(config.grid_width, config.grid_height)))
    }

    fn step(&mut self, current: &Grid, next: &mut Grid, _rng: &mut SimRng) {
        self.counted = false;
        next.copy_from(current);

        if self.iteration % self.params.trail_every == 0 {
            for cell in next.as_mut_slice() {
                if *cell == PREY_TRAIL || *cell == PREDATOR_TRAIL {
                    *cell = EMPTY;
                }
            }
        }

        debug!(
            iteration = self.iteration,
            prey = self.prey_count,
            predators = self.predator_count,
            "Predator-prey step"
        );
        self.iteration += 1;
    }

    fn make_agents(&mut self, config: &RunConfig, rng: &mut SimRng) -> Vec<Creature> {
        let total = self.params.population;
        let prey = total - total / 3;
        let (dx, dy) = (config.grid_width as i64, config.grid_height as i64);

        (0..total)
            .map(|i| {
                let species = if i < prey {
                    Species::Prey
                } else {
                    Species::Predator
                };
                Creature::new(species, rng.gen_range(0..dx), rng.gen_range(0..dy))
            })
            .collect()
    }

    fn palette(&self) -> Palette {
        Palette::new()
            .with(EMPTY, Rgb::WHITE)
            .with(TREE, Rgb(40, 200, 40))
            .with(FIRE, Rgb(255, 40, 40))
            .with(PREY_TRAIL, Rgb(224, 224, 255))
            .with(PREDATOR_TRAIL, Rgb(255, 224, 224))
    }

    fn agent_palette(&self) -> Option<Palette> {
        Some(
            Palette::new()
                .with(Species::Prey.code(), Rgb(0, 0, 128))
                .with(Species::Predator.code(), Rgb(128, 0, 0)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calipso_world::AgentRegistry;
    use rand::SeedableRng;

    fn rng() -> SimRng {
        SimRng::seed_from_u64(3)
    }

    fn ready(params: PredatorPreyParams, size: usize) -> (PredatorPrey, Grid) {
        let config = RunConfig {
            grid_width: size,
            grid_height: size,
            ..Default::default()
        };
        let mut sim = PredatorPrey::new(params);
        let world = sim.init(&config, &mut rng()).unwrap();
        (sim, world.current().clone())
    }

    #[test]
    fn test_initial_population_split() {
        let config = RunConfig {
            grid_width: 20,
            grid_height: 10,
            ..Default::default()
        };
        let mut sim = PredatorPrey::default();
        let agents = sim.make_agents(&config, &mut rng());

        assert_eq!(agents.len(), 50);
        let predators = agents.iter().filter(|c| c.species == Species::Predator).count();
        assert_eq!(predators, 16);
        assert!(agents.iter().all(|c| (0..20).contains(&c.x) && (0..10).contains(&c.y)));
    }

    #[test]
    fn test_surrounded_predator_eats_one_prey() {
        let (mut sim, mut grid) = ready(PredatorPreyParams::default(), 3);
        let mut agents = vec![Creature::new(Species::Predator, 1, 1)];
        for (dx, dy) in Direction::all().iter().map(|d| d.to_delta()) {
            agents.push(Creature::new(Species::Prey, 1 + dx, 1 + dy));
        }
        let mut registry = AgentRegistry::from_agents(agents);

        let pass = registry.update_all(&mut grid, &mut sim, &mut rng(), 0);

        // The eaten prey is dead before its turn comes
        assert_eq!(pass.updated, 8);
        assert_eq!(sim.census(), (8, 1));
        let predator = registry.agents().next().unwrap();
        assert_eq!(predator.hunger, 0);
        let alive_prey = registry
            .agents()
            .filter(|c| c.species == Species::Prey && c.alive)
            .count();
        assert_eq!(alive_prey, 7);
    }

    #[test]
    fn test_starving_predator_dies_and_clears_cell() {
        let params = PredatorPreyParams {
            famine: 3,
            ..Default::default()
        };
        let (mut sim, mut grid) = ready(params, 5);
        let mut hungry = Creature::new(Species::Predator, 2, 2);
        hungry.hunger = 2;
        let mut registry = AgentRegistry::from_agents([hungry]);

        registry.update_all(&mut grid, &mut sim, &mut rng(), 0);

        let predator = registry.agents().next().unwrap();
        assert!(!predator.alive);
        assert!(!predator.trail);
        assert_eq!(grid.at(predator.x as usize, predator.y as usize), EMPTY);
        assert_eq!(grid.count(PREDATOR_TRAIL), 0);
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn test_reproduction_only_on_breeding_iterations() {
        let params = PredatorPreyParams {
            p_prey_birth: 1.0,
            ..Default::default()
        };
        let (mut sim, mut grid) = ready(params, 6);
        let mut registry = AgentRegistry::from_agents([Creature::new(Species::Prey, 0, 0)]);
        let mut next = grid.clone();

        for step in 0..5 {
            registry.update_all(&mut grid, &mut sim, &mut rng(), step);
            sim.step(&grid, &mut next, &mut rng());
            std::mem::swap(&mut grid, &mut next);
        }

        // Iteration 5 is the first breeding iteration
        assert_eq!(registry.len(), 2);
        assert_eq!(sim.births(), 1);
        assert!((1..=5).contains(&grid.count(PREY_TRAIL)));
    }

    #[test]
    fn test_trails_fade_periodically() {
        let (mut sim, mut grid) = ready(PredatorPreyParams::default(), 4);
        grid.put(0, 0, PREY_TRAIL);
        grid.put(1, 0, PREDATOR_TRAIL);
        grid.put(2, 0, TREE);
        let mut next = Grid::new(4, 4);

        sim.step(&grid, &mut next, &mut rng());
        assert_eq!(next.at(0, 0), PREY_TRAIL);

        sim.iteration = 10;
        sim.step(&grid, &mut next, &mut rng());
        assert_eq!(next.at(0, 0), EMPTY);
        assert_eq!(next.at(1, 0), EMPTY);
        assert_eq!(next.at(2, 0), TREE);
        assert_eq!(sim.iteration(), 11);
    }
}
