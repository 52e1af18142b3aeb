//! Soil block with a per-cell moisture grid.
//!
//! Moisture arrives one unit at a time through [`Soil::absorb`], spreads to
//! neighbouring cells down the wetness gradient and evaporates, more slowly
//! the deeper the row. Cells may hold one unit above [`MAX_WETNESS`]; an
//! oversaturated cell sheds moisture even against the gradient, off the
//! edge of the block if it has to.

use crate::board::Board;
use crate::entity::{BoardOccupant, TickContext, Tickable};
use crate::render::{DrawCommand, Drawable, Layer};
use crate::shape::Shape;
use eco_core::{one_in, DiffusionMode, Direction, EntityId, Error, Position, Result, Rgba};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

pub const MAX_WETNESS: u32 = 3;

// darkest shade divisor: MAX_WETNESS + MAX_WETNESS / 2
const SHADE_STEPS: u32 = MAX_WETNESS + MAX_WETNESS / 2;

#[derive(Debug, Clone)]
pub struct Soil {
    shape: Shape,
    // column-major, same layout as the shape mask
    wetness: Vec<u32>,
    absorb_rate: i64,
    evaporate_rate: i64,
    diffusion: DiffusionMode,
    palette: [Rgba; MAX_WETNESS as usize + 1],
}

impl Soil {
    pub fn new(
        origin: Position,
        width: i32,
        height: i32,
        absorb_rate: i64,
        evaporate_rate: i64,
        diffusion: DiffusionMode,
    ) -> Self {
        let shape = Shape::filled(origin, width, height, Rgba::SAND);
        let mut palette = [Rgba::SAND; MAX_WETNESS as usize + 1];
        for (wetness, color) in palette.iter_mut().enumerate() {
            *color = Rgba::SAND.scaled(SHADE_STEPS - wetness as u32, SHADE_STEPS);
        }

        Self {
            wetness: vec![0; (shape.width() * shape.height()) as usize],
            shape,
            absorb_rate,
            evaporate_rate,
            diffusion,
            palette,
        }
    }

    pub fn from_config(config: &eco_core::SoilConfig) -> Self {
        Self::new(
            Position::new(config.x, config.y),
            config.width,
            config.height,
            config.absorb_rate,
            config.evaporate_rate,
            config.diffusion,
        )
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn width(&self) -> i32 {
        self.shape.width()
    }

    pub fn height(&self) -> i32 {
        self.shape.height()
    }

    /// Try to soak up one unit of water arriving at a board position.
    ///
    /// Succeeds with a `1/absorb_rate` chance while the cell holds less than
    /// `MAX_WETNESS + 1`.
    pub fn absorb(&mut self, board_pos: Position, rng: &mut ChaCha8Rng) -> bool {
        let Ok(index) = self.local_index(board_pos) else {
            return false;
        };
        if self.wetness[index] < MAX_WETNESS + 1 && one_in(rng, self.absorb_rate) {
            self.wetness[index] += 1;
            return true;
        }
        false
    }

    pub fn is_wet(&self, board_pos: Position) -> Result<bool> {
        Ok(self.wetness[self.local_index(board_pos)?] > 0)
    }

    /// Take one unit of moisture out of a cell. `Ok(false)` if it was dry.
    pub fn remove_water(&mut self, board_pos: Position) -> Result<bool> {
        let index = self.local_index(board_pos)?;
        if self.wetness[index] > 0 {
            self.wetness[index] -= 1;
            return Ok(true);
        }
        Ok(false)
    }

    /// Stop drawing a cell so the roots growing through it show.
    /// The board still resolves the cell to this soil.
    pub fn dig_partial(&mut self, board_pos: Position) -> Result<()> {
        self.local_index(board_pos)?;
        let local = self.shape.to_local(board_pos);
        self.shape.mask.set(local, false);
        Ok(())
    }

    pub fn wetness_at(&self, board_pos: Position) -> Result<u32> {
        Ok(self.wetness[self.local_index(board_pos)?])
    }

    pub fn set_wetness(&mut self, board_pos: Position, wetness: u32) -> Result<()> {
        let index = self.local_index(board_pos)?;
        self.wetness[index] = wetness;
        Ok(())
    }

    pub fn total_wetness(&self) -> u64 {
        self.wetness.iter().map(|&w| w as u64).sum()
    }

    /// Draw colour for a wetness level; oversaturation shades like `MAX_WETNESS`
    pub fn color_for(&self, wetness: u32) -> Rgba {
        self.palette[wetness.min(MAX_WETNESS) as usize]
    }

    fn local_index(&self, board_pos: Position) -> Result<usize> {
        let local = self.shape.to_local(board_pos);
        if !local.within(self.width(), self.height()) {
            return Err(Error::OutOfBounds {
                x: board_pos.x,
                y: board_pos.y,
                local_x: local.x,
                local_y: local.y,
            });
        }
        Ok((local.x * self.height() + local.y) as usize)
    }

    fn index(&self, x: i32, y: i32) -> usize {
        (x * self.height() + y) as usize
    }

    fn evaporation_odds(&self, y: i32) -> i64 {
        (y as i64 / 2 + 1).saturating_mul(self.evaporate_rate)
    }

    fn evaporates(wetness: u32, y: i32) -> bool {
        wetness == 1 || (wetness > 1 && y == 0)
    }

    /// In-place pass, column by column
    fn diffuse_sequential(&mut self, rng: &mut ChaCha8Rng) {
        let (width, height) = (self.width(), self.height());
        for x in 0..width {
            for y in 0..height {
                let here = self.index(x, y);
                if Self::evaporates(self.wetness[here], y) && one_in(rng, self.evaporation_odds(y)) {
                    self.wetness[here] -= 1;
                }
                if self.wetness[here] <= 1 {
                    continue;
                }
                for dir in Direction::all() {
                    if !one_in(rng, self.absorb_rate) {
                        continue;
                    }
                    let other = Position::new(x, y).step(dir);
                    let wetness = self.wetness[here];
                    if other.within(width, height) {
                        let there = self.index(other.x, other.y);
                        if wetness > self.wetness[there] + 1 || wetness > MAX_WETNESS {
                            self.wetness[there] += 1;
                            self.wetness[here] -= 1;
                        }
                    } else if wetness > MAX_WETNESS {
                        // drain off the edge
                        self.wetness[here] -= 1;
                    }
                }
            }
        }
    }

    /// Double-buffered pass: every band reads the same snapshot and writes
    /// its own delta buffer, so bands never race on a shared cell.
    fn diffuse_banded(&mut self, bands: usize, rng: &mut ChaCha8Rng) {
        let (width, height) = (self.width(), self.height());
        let bands = bands.clamp(1, width.max(1) as usize);
        let seeds: Vec<u64> = (0..bands).map(|_| rng.gen()).collect();
        let snapshot = &self.wetness;
        let this = &*self;

        let deltas: Vec<Vec<i64>> = seeds
            .into_par_iter()
            .enumerate()
            .map(|(band, seed)| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let mut delta = vec![0i64; snapshot.len()];
                let start = band as i32 * width / bands as i32;
                let end = (band as i32 + 1) * width / bands as i32;
                for x in start..end {
                    for y in 0..height {
                        let here = this.index(x, y);
                        let mut wetness = snapshot[here];
                        if Self::evaporates(wetness, y) && one_in(&mut rng, this.evaporation_odds(y)) {
                            wetness -= 1;
                        }
                        if wetness > 1 {
                            for dir in Direction::all() {
                                if !one_in(&mut rng, this.absorb_rate) {
                                    continue;
                                }
                                let other = Position::new(x, y).step(dir);
                                if other.within(width, height) {
                                    let there = this.index(other.x, other.y);
                                    if wetness > snapshot[there] + 1 || wetness > MAX_WETNESS {
                                        delta[there] += 1;
                                        wetness -= 1;
                                    }
                                } else if wetness > MAX_WETNESS {
                                    wetness -= 1;
                                }
                            }
                        }
                        delta[here] += wetness as i64 - snapshot[here] as i64;
                    }
                }
                delta
            })
            .collect();

        for delta in deltas {
            for (cell, change) in self.wetness.iter_mut().zip(delta) {
                *cell = (*cell as i64 + change).max(0) as u32;
            }
        }
    }
}

impl Tickable for Soil {
    fn update(&mut self, ctx: &mut TickContext<'_>) -> Result<()> {
        match self.diffusion {
            DiffusionMode::Sequential => self.diffuse_sequential(ctx.rng),
            DiffusionMode::Banded { bands } => self.diffuse_banded(bands, ctx.rng),
        }
        Ok(())
    }
}

impl BoardOccupant for Soil {
    fn add_to_board(&mut self, id: EntityId, board: &mut Board) -> Result<()> {
        self.shape.claim(id, board);
        Ok(())
    }
}

impl Drawable for Soil {
    fn layer(&self) -> Layer {
        Layer::Terrain
    }

    fn draw(&self, scale: i32, out: &mut Vec<DrawCommand>) {
        for pos in self.shape.board_cells() {
            let local = self.shape.to_local(pos);
            let wetness = self.wetness[self.index(local.x, local.y)];
            out.push(DrawCommand::cell(self.layer(), pos.x, pos.y, scale, self.color_for(wetness)));
        }
    }
}
