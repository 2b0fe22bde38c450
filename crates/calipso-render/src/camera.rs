//! Camera over a fixed-size grid: focus point, zoom and viewport mapping.

use calipso_core::RunConfig;
use std::ops::Range;

/// Geometric zoom factor applied per zoom event
pub const ZOOM_STEP: f64 = 1.1;
/// Zoom at which the whole grid fits the viewport
pub const MIN_ZOOM: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    grid: (usize, usize),
    viewport: (usize, usize),
    focus: (f64, f64),
    zoom: f64,
    pan_span_base: f64,
}

/// Where the grid lands on screen for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct ViewGeometry {
    /// Pixels per cell
    pub cell_size: f64,
    /// Cells visible on each axis before clamping to the grid
    pub visible: (f64, f64),
    /// Clamped top-left corner of the visible window, in cells
    pub window_origin: (f64, f64),
    /// Grid coordinate drawn at `offset`
    pub origin: (f64, f64),
    /// Cell columns to rasterize
    pub cells_x: Range<usize>,
    /// Cell rows to rasterize
    pub cells_y: Range<usize>,
    /// Pixel size of the rasterized block, at least 1x1
    pub target: (usize, usize),
    /// Pixel position of the block's top-left corner
    pub offset: (i64, i64),
    /// Whole grid fits and is centered
    pub letterboxed: bool,
}

impl ViewGeometry {
    /// Map a grid point to the pixel at the center of its cell
    pub fn grid_to_pixel(&self, point: (f64, f64)) -> (i64, i64) {
        let half = self.cell_size / 2.0;
        (
            self.offset.0 + ((point.0 - self.origin.0) * self.cell_size + half) as i64,
            self.offset.1 + ((point.1 - self.origin.1) * self.cell_size + half) as i64,
        )
    }

    /// Clamped visible window as `(x0, y0, width, height)` in cells
    pub fn visible_rect(&self, grid: (usize, usize)) -> (f64, f64, f64, f64) {
        (
            self.window_origin.0,
            self.window_origin.1,
            self.visible.0.min(grid.0 as f64),
            self.visible.1.min(grid.1 as f64),
        )
    }

    /// Stride used to subsample cells when more than one maps to a pixel
    pub fn stride(&self) -> (usize, usize) {
        if self.cell_size >= 1.0 {
            return (1, 1);
        }
        let span_x = self.cells_x.len() as f64;
        let span_y = self.cells_y.len() as f64;
        (
            ((span_x / self.target.0 as f64).round() as usize).max(1),
            ((span_y / self.target.1 as f64).round() as usize).max(1),
        )
    }
}

/// Cells visible on each axis for a viewport and zoom
pub fn visible_extent(grid: (usize, usize), viewport: (usize, usize), zoom: f64) -> (f64, f64) {
    let cell_size = cell_size(grid, viewport, zoom);
    (viewport.0 as f64 / cell_size, viewport.1 as f64 / cell_size)
}

fn base_cell_size(grid: (usize, usize), viewport: (usize, usize)) -> f64 {
    (viewport.0 as f64 / grid.0 as f64).min(viewport.1 as f64 / grid.1 as f64)
}

fn cell_size(grid: (usize, usize), viewport: (usize, usize), zoom: f64) -> f64 {
    base_cell_size(grid, viewport) * zoom
}

/// Clamp one focus coordinate so the window `[focus - extent/2, focus + extent/2]`
/// stays inside `[0, dim]`; a window at least as wide as the grid centers it.
pub fn clamp_axis(focus: f64, extent: f64, dim: usize) -> f64 {
    let dim = dim as f64;
    if extent >= dim {
        return (dim - 1.0) / 2.0;
    }
    let half = extent / 2.0;
    focus.clamp(half, dim - half)
}

impl Camera {
    pub fn new(grid: (usize, usize), viewport: (usize, usize)) -> Self {
        let mut camera = Self {
            grid,
            viewport,
            focus: (0.0, 0.0),
            zoom: MIN_ZOOM,
            pan_span_base: grid.0.max(grid.1) as f64 / 10.0,
        };
        camera.reset();
        camera
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(
            (config.grid_width, config.grid_height),
            (config.viewport_width, config.viewport_height),
        )
    }

    pub fn focus(&self) -> (f64, f64) {
        self.focus
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn grid(&self) -> (usize, usize) {
        self.grid
    }

    pub fn viewport(&self) -> (usize, usize) {
        self.viewport
    }

    pub fn cell_size(&self) -> f64 {
        cell_size(self.grid, self.viewport, self.zoom)
    }

    pub fn visible_extent(&self) -> (f64, f64) {
        visible_extent(self.grid, self.viewport, self.zoom)
    }

    /// Grid distance moved per pan tick; constant on screen across zoom levels
    pub fn pan_span(&self) -> f64 {
        self.pan_span_base / self.zoom
    }

    pub fn set_focus(&mut self, x: f64, y: f64) {
        self.focus = (x, y);
    }

    /// Back to zoom 1 centered on the grid
    pub fn reset(&mut self) {
        self.zoom = MIN_ZOOM;
        self.focus = (
            (self.grid.0 as f64 - 1.0) / 2.0,
            (self.grid.1 as f64 - 1.0) / 2.0,
        );
    }

    /// Largest zoom that still shows at least one whole cell on the short axis
    pub fn max_zoom(&self) -> f64 {
        let short_side = self.viewport.0.min(self.viewport.1) as f64;
        (short_side / base_cell_size(self.grid, self.viewport)).max(MIN_ZOOM)
    }

    /// Zoom in, never past [`Camera::max_zoom`]
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(self.max_zoom());
    }

    /// Zoom out, never past the whole grid being visible
    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM);
    }

    /// Move the focus by whole pan ticks on each axis, staying on the grid
    pub fn pan(&mut self, ticks_x: i32, ticks_y: i32) {
        let span = self.pan_span();
        let max_x = self.grid.0 as f64 - 1.0;
        let max_y = self.grid.1 as f64 - 1.0;
        self.focus.0 = (self.focus.0 + ticks_x as f64 * span).clamp(0.0, max_x.max(0.0));
        self.focus.1 = (self.focus.1 + ticks_y as f64 * span).clamp(0.0, max_y.max(0.0));
    }

    /// Keep the visible window inside the grid
    pub fn clamp(&mut self) {
        let (vis_w, vis_h) = self.visible_extent();
        self.focus = (
            clamp_axis(self.focus.0, vis_w, self.grid.0),
            clamp_axis(self.focus.1, vis_h, self.grid.1),
        );
    }

    /// Compute the cell range and pixel placement for the current focus and zoom
    pub fn geometry(&self) -> ViewGeometry {
        let (dx, dy) = (self.grid.0 as f64, self.grid.1 as f64);
        let (win_w, win_h) = (self.viewport.0 as f64, self.viewport.1 as f64);
        let cell_size = self.cell_size();
        let (vis_w, vis_h) = self.visible_extent();

        let x0 = (self.focus.0 - vis_w / 2.0).min(dx - vis_w).max(0.0);
        let y0 = (self.focus.1 - vis_h / 2.0).min(dy - vis_h).max(0.0);

        let arena_w = dx * cell_size;
        let arena_h = dy * cell_size;

        let (cells_x, cells_y, offset, origin, letterboxed) = if arena_w <= win_w && arena_h <= win_h {
            let offset = (
                ((win_w - arena_w) / 2.0) as i64,
                ((win_h - arena_h) / 2.0) as i64,
            );
            (0..self.grid.0, 0..self.grid.1, offset, (0.0, 0.0), true)
        } else {
            // One cell of slack on the high end hides rounding gaps
            let ix0 = x0.floor() as usize;
            let iy0 = y0.floor() as usize;
            let ix1 = (((x0 + vis_w).ceil() as usize) + 1).min(self.grid.0);
            let iy1 = (((y0 + vis_h).ceil() as usize) + 1).min(self.grid.1);
            (
                ix0..ix1.max(ix0),
                iy0..iy1.max(iy0),
                (0, 0),
                (ix0 as f64, iy0 as f64),
                false,
            )
        };

        let target = (
            ((cells_x.len() as f64 * cell_size) as usize).max(1),
            ((cells_y.len() as f64 * cell_size) as usize).max(1),
        );

        ViewGeometry {
            cell_size,
            visible: (vis_w, vis_h),
            window_origin: if letterboxed { (0.0, 0.0) } else { (x0, y0) },
            origin,
            cells_x,
            cells_y,
            target,
            offset,
            letterboxed,
        }
    }
}
