//! Interactive main loop for cellular-automaton and agent simulations.
//!
//! The [`Engine`] interleaves simulation steps with rendering at a throttled
//! rate and talks to the host window system through the [`Platform`] trait.

pub mod input;
pub mod platform;
pub mod clock;
pub mod engine;

pub use input::{Command, HeldKeys, InputEvent, InputFrame, Key, KeyPress};
pub use platform::{HeadlessPlatform, Platform, StatusLine};
pub use clock::{FramePacer, RateMeter, RenderThrottle, SimulationClock};
pub use engine::{Engine, RunSummary, StopReason};
