//! Core type definitions for the simulation.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle for an entity registered on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 2D cell position on the board. `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn step(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.to_delta();
        self.add(dx, dy)
    }

    /// Whether the position lies inside a `width` x `height` rectangle at the origin
    pub fn within(&self, width: i32, height: i32) -> bool {
        self.x >= 0 && self.y >= 0 && self.x < width && self.y < height
    }
}

/// Direction for movement
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
    pub fn to_delta(&self) -> (i32, i32) {
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

    /// Soil diffusion order: vertical, horizontal, then the diagonals.
    pub fn all() -> [Direction; 8] {
        [
            Direction::South,
            Direction::North,
            Direction::East,
            Direction::West,
            Direction::NorthWest,
            Direction::SouthWest,
            Direction::SouthEast,
            Direction::NorthEast,
        ]
    }

    pub fn cardinal() -> [Direction; 4] {
        [
            Direction::South,
            Direction::West,
            Direction::East,
            Direction::North,
        ]
    }
}

/// 8-bit RGBA colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(0xff, 0xff, 0xff);
    pub const WATER: Rgba = Rgba::rgb(0x00, 0x00, 0xff);
    pub const SAND: Rgba = Rgba::rgb(0xc2, 0xb2, 0x80);
    pub const SKY: Rgba = Rgba::rgb(0x87, 0xce, 0xfa);
    pub const SUN: Rgba = Rgba::rgb(0xff, 0xde, 0x00);
    pub const PLANT: Rgba = Rgba::rgb(0x00, 0xff, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    /// Scale the colour channels by `numerator / denominator`, keeping alpha.
    ///
    /// `numerator` is clamped to `denominator` so the result never brightens.
    pub fn scaled(&self, numerator: u32, denominator: u32) -> Self {
        if denominator == 0 {
            return *self;
        }
        let numerator = numerator.min(denominator);
        let scale = |c: u8| (c as u64 * numerator as u64 / denominator as u64) as u8;
        Self {
            r: scale(self.r),
            g: scale(self.g),
            b: scale(self.b),
            a: self.a,
        }
    }
}

/// Roll a `1/n` chance. Rates of one or less always succeed.
pub fn one_in<R: Rng + ?Sized>(rng: &mut R, n: i64) -> bool {
    n <= 1 || rng.gen_range(0..n) == 0
}
