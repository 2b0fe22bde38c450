//! RGB pixel buffer with the few drawing primitives the renderer needs.

use calipso_core::Rgb;

/// Row-major RGB raster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, Rgb::BLACK)
    }

    pub fn filled(width: usize, height: usize, color: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    /// Wrap an existing pixel buffer; `None` when the length does not match
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Rgb>) -> Option<Self> {
        (pixels.len() == width * height).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn row(&self, y: usize) -> &[Rgb] {
        let start = y * self.width;
        &self.pixels[start..start + self.width]
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Rgb> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    /// Set a pixel; coordinates off the frame are ignored
    pub fn set(&mut self, x: i64, y: i64, color: Rgb) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = color;
        }
    }

    pub fn clear(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    /// Nearest-neighbor resize
    pub fn scaled(&self, width: usize, height: usize) -> Frame {
        if width == self.width && height == self.height {
            return self.clone();
        }
        if self.width == 0 || self.height == 0 {
            return Frame::new(width, height);
        }

        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            let src_y = y * self.height / height;
            let src_row = self.row(src_y);
            pixels.extend((0..width).map(|x| src_row[x * self.width / width]));
        }

        Frame {
            width,
            height,
            pixels,
        }
    }

    /// Nearest-neighbor scale `source` to `width`x`height` and draw it with its
    /// top-left corner at `(x, y)`.
    ///
    /// Only destination pixels inside this frame are visited, so the cost is
    /// bounded by the frame size however large the scaled block is.
    pub fn blit_scaled(&mut self, source: &Frame, width: usize, height: usize, x: i64, y: i64) {
        if source.width == 0 || source.height == 0 || width == 0 || height == 0 {
            return;
        }
        let x_start = x.max(0);
        let y_start = y.max(0);
        let x_end = x.saturating_add(extent(width)).min(self.width as i64);
        let y_end = y.saturating_add(extent(height)).min(self.height as i64);
        if x_start >= x_end || y_start >= y_end {
            return;
        }

        for dst_y in y_start..y_end {
            let src_row = source.row(nearest(dst_y - y, source.height, height));
            let dst_row = dst_y as usize * self.width;
            for dst_x in x_start..x_end {
                self.pixels[dst_row + dst_x as usize] = src_row[nearest(dst_x - x, source.width, width)];
            }
        }
    }

    /// Filled disc, clipped to the frame
    pub fn fill_circle(&mut self, cx: i64, cy: i64, radius: i64, color: Rgb) {
        if radius < 0 {
            return;
        }
        let r2 = radius.saturating_mul(radius);
        let x0 = cx.saturating_sub(radius).max(0);
        let y0 = cy.saturating_sub(radius).max(0);
        let x1 = cx.saturating_add(radius).min(self.width as i64 - 1);
        let y1 = cy.saturating_add(radius).min(self.height as i64 - 1);

        for y in y0..=y1 {
            let dy = y.saturating_sub(cy);
            for x in x0..=x1 {
                let dx = x.saturating_sub(cx);
                if dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy)) <= r2 {
                    self.set(x, y, color);
                }
            }
        }
    }
}

fn extent(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

/// Source index sampled by destination index `dst` when `src_len` maps onto `dst_len`
fn nearest(dst: i64, src_len: usize, dst_len: usize) -> usize {
    (dst as u128 * src_len as u128 / dst_len as u128) as usize
}
