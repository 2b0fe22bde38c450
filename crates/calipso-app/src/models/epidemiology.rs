//! Sane, infected and recovered people wandering on an empty torus.
//!
//! The first updates of a run seed the outbreak. Infected people rest half of
//! the time, recover after `recovery_time` steps of illness and pass the
//! disease to sane people sharing their cell. Sane people step away from an
//! infected orthogonal neighbor. Everyone dies of old age after `max_life`
//! steps; a passer-by may bring the dead of its cell back to life.

use calipso_core::{CellCode, Direction, Palette, Result, Rgb, RunConfig};
use calipso_world::{Agent, AgentContext, Grid, SimRng, Simulation, WorldState};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

pub const EMPTY: CellCode = 0;

/// Neighbor offset to check, and the step taken away from it
const DODGES: [((i64, i64), (i64, i64)); 4] = [
    ((1, 0), (-1, 0)),
    ((-1, 0), (1, 0)),
    ((0, 1), (0, -1)),
    ((0, -1), (0, 1)),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Sane,
    Infected,
    Recovered,
}

impl Health {
    pub fn code(self) -> CellCode {
        match self {
            Health::Sane => 0,
            Health::Infected => 1,
            Health::Recovered => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Person {
    pub health: Health,
    pub x: i64,
    pub y: i64,
    pub alive: bool,
    pub age: u32,
    /// Steps spent infected
    pub sick_for: u32,
}

impl Person {
    pub fn new(x: i64, y: i64) -> Self {
        Self {
            health: Health::Sane,
            x,
            y,
            alive: true,
            age: 0,
            sick_for: 0,
        }
    }

    fn infect(&mut self) {
        self.health = Health::Infected;
        self.sick_for = 0;
    }

    fn wander(&mut self, grid: &Grid, rng: &mut SimRng) {
        if let Some(direction) = Direction::all().choose(rng) {
            let (dx, dy) = direction.to_delta();
            self.x = (self.x + dx).rem_euclid(grid.width() as i64);
            self.y = (self.y + dy).rem_euclid(grid.height() as i64);
        }
    }
}

impl Agent for Person {
    type Sim = Epidemiology;

    fn position(&self) -> (f64, f64) {
        (self.x as f64, self.y as f64)
    }

    fn is_active(&self) -> bool {
        self.alive
    }

    fn kind(&self) -> CellCode {
        self.health.code()
    }

    fn update(&mut self, ctx: &mut AgentContext<'_, Self>) {
        if !ctx.sim.counted {
            let census = |health: Health| {
                ctx.peers
                    .iter()
                    .chain(std::iter::once(&*self))
                    .filter(|p| p.alive && p.health == health)
                    .count()
            };
            ctx.sim.sane = census(Health::Sane);
            ctx.sim.infected = census(Health::Infected);
            ctx.sim.recovered = census(Health::Recovered);
            ctx.sim.counted = true;
        }

        let params = ctx.sim.params;

        if ctx.sim.seeded < params.initial_infected {
            self.infect();
            ctx.sim.seeded += 1;
        }

        if self.health == Health::Infected && ctx.rng.gen::<f64>() < params.p_rest {
            return;
        }

        self.wander(ctx.grid, ctx.rng);
        let (width, height) = (ctx.grid.width() as i64, ctx.grid.height() as i64);

        if ctx.rng.gen::<f64>() < params.p_birth
            && ctx.grid.at(self.x as usize, self.y as usize) == EMPTY
        {
            let (x, y) = (self.x, self.y);
            let mut revived = 0;
            for other in ctx
                .peers
                .iter_mut()
                .filter(|p| !p.alive && p.health == Health::Sane && p.x == x && p.y == y)
            {
                other.alive = true;
                other.age = 0;
                revived += 1;
            }
            if revived > 0 {
                self.age = 0;
                ctx.sim.births += revived;
            }
        }

        let infected_at = |x: i64, y: i64| {
            let (x, y) = (x.rem_euclid(width), y.rem_euclid(height));
            ctx.peers
                .iter()
                .any(|p| p.alive && p.health == Health::Infected && p.x == x && p.y == y)
        };

        if self.health == Health::Sane {
            let away = DODGES
                .iter()
                .find(|((dx, dy), _)| infected_at(self.x + dx, self.y + dy))
                .map(|&(_, step)| step);
            if let Some((dx, dy)) = away {
                self.x = (self.x + dx).rem_euclid(width);
                self.y = (self.y + dy).rem_euclid(height);
            }
        }

        if self.health == Health::Sane && infected_at(self.x, self.y) {
            self.infect();
        }

        if self.health == Health::Infected {
            self.sick_for += 1;
            if self.sick_for > params.recovery_time {
                self.health = Health::Recovered;
            }
        }

        if self.health == Health::Sane && ctx.rng.gen::<f64>() < params.p_spontaneous {
            self.infect();
        }

        self.age += 1;
        if self.age > params.max_life {
            self.alive = false;
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EpidemiologyParams {
    /// Chance per move of reviving the dead sharing the new cell
    pub p_birth: f64,
    /// Chance per step of a sane person falling ill on their own
    pub p_spontaneous: f64,
    /// Chance per step of an infected person staying put
    pub p_rest: f64,
    pub max_life: u32,
    pub recovery_time: u32,
    /// People infected by the first updates of a run
    pub initial_infected: usize,
    pub population: usize,
}

impl Default for EpidemiologyParams {
    fn default() -> Self {
        Self {
            p_birth: 0.05,
            p_spontaneous: 0.001,
            p_rest: 0.5,
            max_life: 150,
            recovery_time: 100,
            initial_infected: 11,
            population: 500,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Epidemiology {
    pub params: EpidemiologyParams,
    iteration: u64,
    seeded: usize,
    sane: usize,
    infected: usize,
    recovered: usize,
    births: usize,
    counted: bool,
}

impl Epidemiology {
    pub fn new(params: EpidemiologyParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    /// Living sane, infected and recovered people at the start of the last pass
    pub fn census(&self) -> (usize, usize, usize) {
        (self.sane, self.infected, self.recovered)
    }

    pub fn births(&self) -> usize {
        self.births
    }
}

impl Simulation for Epidemiology {
    type Agent = Person;

    fn init(&mut self, config: &RunConfig, _rng: &mut SimRng) -> Result<WorldState> {
        *self = Self::new(self.params);
        Ok(WorldState::from_current(Grid::new(config.grid_width, config.grid_height)))
    }

    fn step(&mut self, current: &Grid, next: &mut Grid, _rng: &mut SimRng) {
        self.counted = false;
        next.copy_from(current);

        debug!(
            iteration = self.iteration,
            sane = self.sane,
            infected = self.infected,
            recovered = self.recovered,
            births = self.births,
            "Epidemiology step"
        );
        self.iteration += 1;
    }

    fn make_agents(&mut self, config: &RunConfig, rng: &mut SimRng) -> Vec<Person> {
        let (dx, dy) = (config.grid_width as i64, config.grid_height as i64);
        (0..self.params.population)
            .map(|_| Person::new(rng.gen_range(0..dx), rng.gen_range(0..dy)))
            .collect()
    }

    fn palette(&self) -> Palette {
        Palette::new().with(EMPTY, Rgb::WHITE)
    }

    fn agent_palette(&self) -> Option<Palette> {
        Some(
            Palette::new()
                .with(Health::Sane.code(), Rgb(0, 200, 0))
                .with(Health::Infected.code(), Rgb(200, 0, 0))
                .with(Health::Recovered.code(), Rgb(100, 100, 0)),
        )
    }

    fn status(&self) -> Option<String> {
        Some(format!(
            "Sane: {} | Infected: {} | Recovered: {}",
            self.sane, self.infected, self.recovered
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calipso_world::AgentRegistry;
    use rand::SeedableRng;

    fn rng() -> SimRng {
        SimRng::seed_from_u64(5)
    }

    /// No chance events, and the outbreak already seeded
    fn calm() -> EpidemiologyParams {
        EpidemiologyParams {
            p_birth: 0.0,
            p_spontaneous: 0.0,
            p_rest: 0.0,
            ..Default::default()
        }
    }

    fn ready(params: EpidemiologyParams, width: usize, height: usize) -> (Epidemiology, Grid) {
        let config = RunConfig {
            grid_width: width,
            grid_height: height,
            ..Default::default()
        };
        let mut sim = Epidemiology::new(params);
        let world = sim.init(&config, &mut rng()).unwrap();
        sim.seeded = params.initial_infected;
        (sim, world.current().clone())
    }

    fn sick(x: i64, y: i64) -> Person {
        let mut person = Person::new(x, y);
        person.infect();
        person
    }

    #[test]
    fn test_population_starts_sane() {
        let config = RunConfig {
            grid_width: 30,
            grid_height: 20,
            ..Default::default()
        };
        let mut sim = Epidemiology::default();
        let people = sim.make_agents(&config, &mut rng());

        assert_eq!(people.len(), 500);
        assert!(people.iter().all(|p| p.alive && p.health == Health::Sane));
        assert!(people.iter().all(|p| (0..30).contains(&p.x) && (0..20).contains(&p.y)));
    }

    #[test]
    fn test_first_updates_seed_the_outbreak() {
        let (mut sim, mut grid) = ready(calm(), 60, 3);
        sim.seeded = 0;
        // Four cells apart, so nobody meets during one pass
        let mut registry = AgentRegistry::from_agents((0..15).map(|i| Person::new(i * 4, 1)));

        registry.update_all(&mut grid, &mut sim, &mut rng(), 0);

        assert_eq!(sim.census(), (15, 0, 0));
        let infected: Vec<_> = registry
            .agents()
            .map(|p| p.health == Health::Infected)
            .collect();
        assert_eq!(infected.iter().filter(|&&ill| ill).count(), 11);
        assert!(infected[..11].iter().all(|&ill| ill));
    }

    #[test]
    fn test_contagion_on_shared_cell() {
        let (mut sim, mut grid) = ready(calm(), 1, 1);
        let mut immune = Person::new(0, 0);
        immune.health = Health::Recovered;
        let mut registry = AgentRegistry::from_agents([Person::new(0, 0), sick(0, 0), immune]);

        registry.update_all(&mut grid, &mut sim, &mut rng(), 0);

        let health: Vec<_> = registry.agents().map(|p| p.health).collect();
        assert_eq!(
            health,
            vec![Health::Infected, Health::Infected, Health::Recovered]
        );
    }

    #[test]
    fn test_recovery_and_death_of_old_age() {
        let params = calm();
        let (mut sim, mut grid) = ready(params, 5, 5);
        let mut patient = sick(0, 0);
        patient.sick_for = params.recovery_time;
        let mut elder = Person::new(3, 3);
        elder.age = params.max_life;
        let mut registry = AgentRegistry::from_agents([patient, elder]);

        registry.update_all(&mut grid, &mut sim, &mut rng(), 0);

        let people: Vec<_> = registry.agents().collect();
        assert_eq!(people[0].health, Health::Recovered);
        assert!(!people[1].alive);
        assert_eq!(registry.active_count(), 1);

        let pass = registry.update_all(&mut grid, &mut sim, &mut rng(), 1);
        assert_eq!(pass.updated, 1);
    }

    #[test]
    fn test_sane_person_steps_away_from_infected_neighbor() {
        // The sick person at 0 never moves; a walk from 2 to 1 is undone
        let params = EpidemiologyParams {
            p_rest: 1.0,
            ..calm()
        };
        for seed in 0..20 {
            let (mut sim, mut grid) = ready(params, 9, 1);
            let mut registry = AgentRegistry::from_agents([Person::new(2, 0), sick(0, 0)]);

            registry.update_all(&mut grid, &mut sim, &mut SimRng::seed_from_u64(seed), 0);

            let people: Vec<_> = registry.agents().collect();
            assert_eq!(people[1].x, 0);
            assert!((2..=3).contains(&people[0].x), "seed {seed}: x = {}", people[0].x);
            assert_eq!(people[0].health, Health::Sane);
        }
    }

    #[test]
    fn test_passer_by_revives_the_dead() {
        let params = EpidemiologyParams {
            p_birth: 1.0,
            ..calm()
        };
        let (mut sim, mut grid) = ready(params, 1, 1);
        let mut dead = Person::new(0, 0);
        dead.alive = false;
        dead.age = params.max_life + 1;
        let mut walker = Person::new(0, 0);
        walker.age = 40;
        let mut registry = AgentRegistry::from_agents([dead, walker]);

        registry.update_all(&mut grid, &mut sim, &mut rng(), 0);

        let people: Vec<_> = registry.agents().collect();
        assert!(people[0].alive);
        assert_eq!(people[0].age, 0);
        assert_eq!(people[1].age, 1);
        assert_eq!(sim.births(), 1);
    }

    #[test]
    fn test_status_reports_census() {
        let (mut sim, mut grid) = ready(calm(), 40, 40);
        let mut immune = Person::new(30, 30);
        immune.health = Health::Recovered;
        let mut registry = AgentRegistry::from_agents([
            Person::new(0, 0),
            Person::new(10, 10),
            sick(20, 20),
            immune,
        ]);

        registry.update_all(&mut grid, &mut sim, &mut rng(), 0);

        assert_eq!(sim.census(), (2, 1, 1));
        assert_eq!(
            sim.status().as_deref(),
            Some("Sane: 2 | Infected: 1 | Recovered: 1")
        );

        let mut next = Grid::new(40, 40);
        sim.step(&grid, &mut next, &mut rng());
        assert!(!sim.counted);
        assert_eq!(sim.iteration, 1);
        assert_eq!(next, grid);
    }
}
