//! Configuration types for a simulation run.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Steps-per-render periods cycled with the throttle key
pub const DEFAULT_RENDER_PERIODS: [u64; 3] = [1, 60, 600];

/// Run configuration, immutable once the main loop starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Width of the cell grid
    pub grid_width: usize,
    /// Height of the cell grid
    pub grid_height: usize,
    /// Width of the viewport in pixels
    pub viewport_width: usize,
    /// Height of the viewport in pixels
    pub viewport_height: usize,
    /// Window title
    pub title: String,
    /// Target rendered frames per second (0 disables pacing)
    pub target_fps: u32,
    /// Log every tenth step at info level
    pub verbose: bool,
    /// Stop after this many steps (unbounded when unset)
    pub max_steps: Option<u64>,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Ordered render throttle periods, in steps per rendered frame
    pub render_periods: Vec<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            grid_width: 800,
            grid_height: 800,
            viewport_width: 800,
            viewport_height: 800,
            title: "no name".to_string(),
            target_fps: 60,
            verbose: false,
            max_steps: None,
            seed: 0,
            render_periods: DEFAULT_RENDER_PERIODS.to_vec(),
        }
    }
}

impl RunConfig {
    /// Load a configuration from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: RunConfig = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Check the configuration before the run starts
    pub fn validate(&self) -> Result<()> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(Error::Config(format!(
                "grid dimensions must be positive, got {}x{}",
                self.grid_width, self.grid_height
            )));
        }

        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(Error::Config(format!(
                "viewport dimensions must be positive, got {}x{}",
                self.viewport_width, self.viewport_height
            )));
        }

        if self.render_periods.is_empty() {
            return Err(Error::Config("render period set is empty".to_string()));
        }

        if self.render_periods.contains(&0) {
            return Err(Error::Config("render periods must be at least 1".to_string()));
        }

        Ok(())
    }
}
