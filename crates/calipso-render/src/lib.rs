//! Rasterization of the cell grid and agent overlay.
//!
//! - [`ColorIndex`] turns cell codes into colors with one table lookup
//! - [`Camera`] tracks focus and zoom over the grid
//! - [`Frame`] is the pixel buffer handed to the host platform
//! - [`ViewportRenderer`] draws the visible part of the grid plus agent markers

pub mod color;
pub mod camera;
pub mod frame;
pub mod viewport;

pub use color::{ColorIndex, DEFAULT_AGENT_COLOR};
pub use camera::{Camera, ViewGeometry};
pub use frame::Frame;
pub use viewport::{RenderStats, ViewportRenderer};
