//! Reference simulations shipped with the binary.

pub mod epidemiology;
pub mod forest_fire;
pub mod predator_prey;
pub mod traffic;

use calipso_core::{Result, RunConfig};
use calipso_runtime::{Engine, Platform, RunSummary};
use calipso_world::Simulation;
use clap::ValueEnum;

pub use epidemiology::Epidemiology;
pub use forest_fire::ForestFire;
pub use predator_prey::PredatorPrey;
pub use traffic::Traffic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelKind {
    ForestFire,
    Traffic,
    PredatorPrey,
    Epidemiology,
}

impl ModelKind {
    /// Grid, title and pacing each model is meant to be shown with
    pub fn default_config(self) -> RunConfig {
        let base = RunConfig::default();
        match self {
            ModelKind::ForestFire => RunConfig {
                grid_width: 100,
                grid_height: 100,
                title: "Forest Fire CA".to_string(),
                verbose: true,
                ..base
            },
            ModelKind::Traffic => RunConfig {
                grid_width: 80,
                grid_height: 1,
                title: "Traffic Jam CA".to_string(),
                target_fps: 5,
                verbose: true,
                ..base
            },
            ModelKind::PredatorPrey => RunConfig {
                grid_width: 80,
                grid_height: 80,
                title: "Predator-Prey".to_string(),
                ..base
            },
            ModelKind::Epidemiology => RunConfig {
                grid_width: 80,
                grid_height: 80,
                title: "Sane-Infected-Recovered".to_string(),
                target_fps: 10,
                ..base
            },
        }
    }

    /// Build the engine for this model and run it to completion
    pub fn run<P: Platform>(self, config: RunConfig, platform: P, compact: bool) -> Result<RunSummary> {
        match self {
            ModelKind::ForestFire => drive(config, ForestFire::default(), platform, compact),
            ModelKind::Traffic => drive(config, Traffic::default(), platform, compact),
            ModelKind::PredatorPrey => drive(config, PredatorPrey::default(), platform, compact),
            ModelKind::Epidemiology => drive(config, Epidemiology::default(), platform, compact),
        }
    }
}

fn drive<S: Simulation, P: Platform>(
    config: RunConfig,
    sim: S,
    platform: P,
    compact: bool,
) -> Result<RunSummary> {
    let mut engine = Engine::new(config, sim, platform)?.with_compaction(compact);
    engine.run()
}
