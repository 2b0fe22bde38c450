//! World state for cellular-automaton and agent simulations.
//!
//! This crate owns the double-buffered cell grid, the agent registry and the
//! contract a simulation plugs into the engine with.

pub mod grid;
pub mod world;
pub mod agent;
pub mod simulation;

pub use grid::Grid;
pub use world::WorldState;
pub use agent::{Agent, AgentContext, AgentRegistry, NoAgent, PassStats, Peers};
pub use simulation::{SimRng, Simulation};
