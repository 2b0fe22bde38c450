//! Draws the visible part of the grid and the agent markers into a frame.

use crate::camera::Camera;
use crate::color::{ColorIndex, DEFAULT_AGENT_COLOR};
use crate::frame::Frame;
use calipso_core::{Palette, Rgb};
use calipso_world::{Agent, Grid};
use tracing::trace;

/// Counters from one render pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub cells_sampled: usize,
    pub markers_drawn: usize,
    pub markers_skipped: usize,
}

pub struct ViewportRenderer {
    cells: ColorIndex,
    markers: ColorIndex,
    background: Rgb,
}

impl ViewportRenderer {
    pub fn new(palette: &Palette, agent_palette: Option<&Palette>) -> Self {
        let markers = match agent_palette {
            Some(palette) => ColorIndex::build_with_fallback(palette, DEFAULT_AGENT_COLOR),
            None => ColorIndex::build_with_fallback(&Palette::new(), DEFAULT_AGENT_COLOR),
        };

        Self {
            cells: ColorIndex::build(palette),
            markers,
            background: Rgb::BLACK,
        }
    }

    /// Clear `frame`, rasterize the camera's view of `grid` and overlay agents
    pub fn render<'a, A, I>(&self, frame: &mut Frame, grid: &Grid, camera: &Camera, agents: I) -> RenderStats
    where
        A: Agent + 'a,
        I: IntoIterator<Item = &'a A>,
    {
        let mut stats = RenderStats::default();
        frame.clear(self.background);

        let geometry = camera.geometry();
        let (sx, sy) = geometry.stride();

        let mut pixels = Vec::new();
        let mut sub_h = 0;
        for y in geometry.cells_y.clone().step_by(sy) {
            let row = grid.row(y);
            self.cells
                .gather(geometry.cells_x.clone().step_by(sx).map(|x| row[x]), &mut pixels);
            sub_h += 1;
        }
        let sub_w = geometry.cells_x.clone().step_by(sx).len();
        stats.cells_sampled = pixels.len();

        if let Some(block) = Frame::from_pixels(sub_w, sub_h, pixels) {
            let (target_w, target_h) = geometry.target;
            frame.blit_scaled(&block, target_w, target_h, geometry.offset.0, geometry.offset.1);
        }

        let radius = ((geometry.cell_size / 2.0) as i64).max(1);
        let (dx, dy) = (grid.width() as f64, grid.height() as f64);

        for agent in agents {
            if !agent.is_active() {
                continue;
            }
            let (ax, ay) = agent.position();
            if !(ax >= 0.0 && ax < dx && ay >= 0.0 && ay < dy) {
                stats.markers_skipped += 1;
                continue;
            }

            let (px, py) = geometry.grid_to_pixel((ax, ay));
            if px < 0 || py < 0 || px >= frame.width() as i64 || py >= frame.height() as i64 {
                continue;
            }
            frame.fill_circle(px, py, radius, self.markers.lookup(agent.kind()));
            stats.markers_drawn += 1;
        }

        trace!(
            cells = stats.cells_sampled,
            markers = stats.markers_drawn,
            skipped = stats.markers_skipped,
            letterboxed = geometry.letterboxed,
            "Rendered viewport"
        );

        stats
    }
}
