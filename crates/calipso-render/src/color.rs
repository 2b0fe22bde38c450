//! Dense color lookup table for cell codes.

use calipso_core::{CellCode, Palette, Rgb};

/// Marker color for agents whose kind has no palette entry
pub const DEFAULT_AGENT_COLOR: Rgb = Rgb(255, 128, 0);

/// Flat table indexed by cell code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorIndex {
    table: Vec<Rgb>,
    fallback: Rgb,
}

impl ColorIndex {
    /// Build a table with `max(code) + 1` entries; gaps are black
    pub fn build(palette: &Palette) -> Self {
        Self::build_with_fallback(palette, Rgb::BLACK)
    }

    pub fn build_with_fallback(palette: &Palette, fallback: Rgb) -> Self {
        let len = palette.max_code().map_or(0, |max| max as usize + 1);
        let mut table = vec![fallback; len];
        for (code, color) in palette.iter() {
            table[code as usize] = color;
        }
        Self { table, fallback }
    }

    /// Color of `code`, or the fallback for codes past the table
    #[inline]
    pub fn lookup(&self, code: CellCode) -> Rgb {
        self.table.get(code as usize).copied().unwrap_or(self.fallback)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Gather colors for a run of codes into `out`
    pub fn gather(&self, codes: impl IntoIterator<Item = CellCode>, out: &mut Vec<Rgb>) {
        out.extend(codes.into_iter().map(|code| self.lookup(code)));
    }
}
