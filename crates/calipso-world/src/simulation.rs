//! Contract between the engine and a simulation plugin.

use crate::agent::Agent;
use crate::grid::Grid;
use crate::world::WorldState;
use calipso_core::{Palette, Result, RunConfig};
use rand_chacha::ChaCha8Rng;

/// Seeded random source shared by the simulation and its agents
pub type SimRng = ChaCha8Rng;

/// A cellular automaton with an optional agent population.
///
/// The implementing type is also the shared mutable context: agents receive
/// `&mut Self` through [`crate::AgentContext::sim`], and `step` runs with
/// `&mut self`, so run-wide counters and flags live on the simulation value.
pub trait Simulation: Sized {
    type Agent: Agent<Sim = Self>;

    /// Build the initial world for the configured grid dimensions
    fn init(&mut self, config: &RunConfig, rng: &mut SimRng) -> Result<WorldState>;

    /// Fill `next` completely from `current`
    fn step(&mut self, current: &Grid, next: &mut Grid, rng: &mut SimRng);

    /// Initial agent population
    fn make_agents(&mut self, config: &RunConfig, rng: &mut SimRng) -> Vec<Self::Agent> {
        let _ = (config, rng);
        Vec::new()
    }

    /// Colors for every cell code the simulation may write
    fn palette(&self) -> Palette;

    /// Marker colors keyed by [`Agent::kind`]
    fn agent_palette(&self) -> Option<Palette> {
        None
    }

    /// Extra text for the status line, refreshed on every rendered frame
    fn status(&self) -> Option<String> {
        None
    }
}
