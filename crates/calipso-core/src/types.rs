//! Core type definitions shared by the world, the renderer and the runtime.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Cell state code stored in a grid
pub type CellCode = u8;

/// Stable identifier of an agent, assigned in insertion order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// RGB color triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self(r, g, b)
    }
}

/// User-supplied mapping from cell codes to colors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    entries: BTreeMap<CellCode, Rgb>,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, code: CellCode, color: Rgb) -> Self {
        self.insert(code, color);
        self
    }

    pub fn insert(&mut self, code: CellCode, color: Rgb) {
        self.entries.insert(code, color);
    }

    pub fn contains(&self, code: CellCode) -> bool {
        self.entries.contains_key(&code)
    }

    pub fn max_code(&self) -> Option<CellCode> {
        self.entries.keys().next_back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellCode, Rgb)> + '_ {
        self.entries.iter().map(|(&code, &color)| (code, color))
    }
}

impl FromIterator<(CellCode, Rgb)> for Palette {
    fn from_iter<I: IntoIterator<Item = (CellCode, Rgb)>>(iter: I) -> Self {
        let mut palette = Palette::new();
        for (code, color) in iter {
            palette.insert(code, color);
        }
        palette
    }
}

/// Integer position on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Apply toroidal wrapping for given grid dimensions
    pub fn wrap(&self, width: usize, height: usize) -> Self {
        let (w, h) = (width as i64, height as i64);
        Self {
            x: self.x.rem_euclid(w),
            y: self.y.rem_euclid(h),
        }
    }
}

/// Direction for single-cell moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Direction {
    pub fn to_delta(&self) -> (i64, i64) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::NorthEast => (1, -1),
            Direction::NorthWest => (-1, -1),
            Direction::SouthEast => (1, 1),
            Direction::SouthWest => (-1, 1),
        }
    }

    pub fn all() -> [Direction; 8] {
        [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
            Direction::NorthEast,
            Direction::NorthWest,
            Direction::SouthEast,
            Direction::SouthWest,
        ]
    }
}
