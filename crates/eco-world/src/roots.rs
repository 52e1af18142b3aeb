//! Root network: an append-only tree that grows through wet soil and
//! carries water up to the plant.
//!
//! The tree lives in an arena. Node 0 is the anchor; children are indices
//! into the same vector, so the tree can be dumped and diffed as plain data.

use crate::board::Board;
use crate::entity::{BoardOccupant, TickContext, Tickable};
use crate::render::{DrawCommand, Drawable, Layer};
use crate::shape::Shape;
use eco_core::{one_in, Direction, EntityId, Error, Position, Result, Rgba};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const MAX_ROOT_WETNESS: u32 = 3;

const ANCHOR: usize = 0;

/// One node of the root tree, positioned relative to the roots' origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootCell {
    pub offset: Position,
    pub wetness: u32,
    pub children: Vec<usize>,
}

impl RootCell {
    fn new(offset: Position) -> Self {
        Self {
            offset,
            wetness: 0,
            children: Vec::new(),
        }
    }
}

/// Roots draw over the soil without occupying board cells
#[derive(Debug, Clone)]
pub struct Roots {
    shape: Shape,
    nodes: Vec<RootCell>,
    grow_rate: i64,
    absorb_interval: u64,
    ticks: u64,
}

impl Roots {
    pub fn new(
        origin: Position,
        width: i32,
        height: i32,
        anchor: Position,
        grow_rate: i64,
        absorb_interval: u64,
    ) -> Self {
        let mut shape = Shape::new(origin, width, height, Rgba::WHITE);
        shape.mask.set(anchor, true);
        Self {
            shape,
            nodes: vec![RootCell::new(anchor)],
            grow_rate,
            absorb_interval: absorb_interval.max(1),
            ticks: 0,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The arena, anchor first
    pub fn nodes(&self) -> &[RootCell] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The tree as JSON, for dumping and diffing
    pub fn dump(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.nodes)?)
    }

    /// Whether a new root cell may be placed at a local offset.
    ///
    /// The cell must be inside the footprint, not already a root, touch at
    /// most one existing root, and sit on wet soil.
    pub fn can_add_root(&self, local: Position, board: &Board) -> bool {
        if !self.shape.mask.contains(local) || self.shape.mask.get(local) {
            return false;
        }
        let neighbours = Direction::all()
            .iter()
            .filter(|&&dir| self.shape.mask.get(local.step(dir)))
            .count();
        if neighbours > 1 {
            return false;
        }

        let board_pos = self.shape.to_board(local);
        match board.soil_at(board_pos) {
            Some(soil) => soil.is_wet(board_pos).unwrap_or(false),
            None => false,
        }
    }

    /// Claim a cell for a new root, digging the soil under it
    fn add_root(&mut self, local: Position, board: &mut Board) -> bool {
        if !self.can_add_root(local, board) {
            return false;
        }
        let board_pos = self.shape.to_board(local);
        if let Some(soil) = board.soil_at_mut(board_pos) {
            if soil.dig_partial(board_pos).is_err() {
                return false;
            }
        }
        self.shape.mask.set(local, true);
        true
    }

    /// Depth-first growth; at most one node is created per call
    fn grow(&mut self, idx: usize, board: &mut Board, rng: &mut ChaCha8Rng) -> bool {
        // deep growth first
        for i in 0..self.nodes[idx].children.len() {
            let child = self.nodes[idx].children[i];
            if self.grow(child, board, rng) {
                return true;
            }
        }

        if !one_in(rng, self.grow_rate) {
            return false;
        }
        let directions = Direction::all();
        let dir = directions[rng.gen_range(0..directions.len())];
        let target = self.nodes[idx].offset.step(dir);
        if !self.add_root(target, board) {
            return false;
        }

        let child = self.nodes.len();
        self.nodes.push(RootCell::new(target));
        self.nodes[idx].children.push(child);
        debug!(
            event = "root_sprouted",
            parent = idx,
            node = child,
            x = target.x,
            y = target.y,
            "Root cell sprouted"
        );
        true
    }

    /// Post-order pull of water towards a node; passes up at most one unit.
    ///
    /// The unit passed up is decided before the children are drained, so a
    /// node never forwards water it only just received.
    fn pull_water(&mut self, idx: usize) -> u32 {
        let mut passed_up = 0;
        if self.nodes[idx].wetness > 0 {
            self.nodes[idx].wetness -= 1;
            passed_up = 1;
        }

        // may overshoot the cap; absorption reconciles it later
        if self.nodes[idx].wetness < MAX_ROOT_WETNESS {
            let mut from_children = 0;
            for i in 0..self.nodes[idx].children.len() {
                let child = self.nodes[idx].children[i];
                from_children += self.pull_water(child);
            }
            self.nodes[idx].wetness += from_children;
        }

        passed_up
    }

    /// Draw one unit of water from the whole tree through the anchor
    pub fn suck_water(&mut self) -> u32 {
        self.pull_water(ANCHOR)
    }

    /// Every node below capacity takes one unit from the soil under it or,
    /// failing that, from the first wet neighbouring cell.
    fn absorb_from_soil(&mut self, idx: usize, board: &mut Board) -> Result<()> {
        for i in 0..self.nodes[idx].children.len() {
            let child = self.nodes[idx].children[i];
            self.absorb_from_soil(child, board)?;
        }

        if self.nodes[idx].wetness >= MAX_ROOT_WETNESS {
            return Ok(());
        }

        let offset = self.nodes[idx].offset;
        let board_pos = self.shape.to_board(offset);
        let Some(soil) = board.soil_at_mut(board_pos) else {
            return Err(Error::InvariantViolation(format!(
                "root cell at ({}, {}) is not over soil",
                board_pos.x, board_pos.y
            )));
        };
        match soil.remove_water(board_pos) {
            Ok(true) => {
                self.nodes[idx].wetness += 1;
                return Ok(());
            }
            Ok(false) => {}
            Err(e) if e.is_out_of_bounds() => return Ok(()),
            Err(e) => return Err(e),
        }

        for dx in -1..=1 {
            for dy in -1..=1 {
                let local = offset.add(dx, dy);
                if !self.shape.mask.contains(local) {
                    continue;
                }
                let board_pos = self.shape.to_board(local);
                let Some(soil) = board.soil_at_mut(board_pos) else {
                    continue;
                };
                match soil.remove_water(board_pos) {
                    Ok(true) => {
                        self.nodes[idx].wetness += 1;
                        return Ok(());
                    }
                    Ok(false) => {}
                    Err(e) if e.is_out_of_bounds() => return Ok(()),
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(())
    }

    pub fn total_wetness(&self) -> u64 {
        self.nodes.iter().map(|n| n.wetness as u64).sum()
    }
}

impl Tickable for Roots {
    fn update(&mut self, ctx: &mut TickContext<'_>) -> Result<()> {
        self.grow(ANCHOR, ctx.board, ctx.rng);

        self.ticks += 1;
        if self.ticks % self.absorb_interval == 0 {
            self.absorb_from_soil(ANCHOR, ctx.board)?;
        }
        Ok(())
    }
}

impl BoardOccupant for Roots {
    /// Roots take no cells, but every root cell must sit on soil
    fn add_to_board(&mut self, _id: EntityId, board: &mut Board) -> Result<()> {
        for node in &self.nodes {
            let board_pos = self.shape.to_board(node.offset);
            if board.soil_at(board_pos).is_none() {
                return Err(Error::InvariantViolation(format!(
                    "roots placed at ({}, {}) where there is no soil",
                    board_pos.x, board_pos.y
                )));
            }
        }
        Ok(())
    }
}

impl Drawable for Roots {
    fn layer(&self) -> Layer {
        Layer::Overlay
    }

    fn draw(&self, scale: i32, out: &mut Vec<DrawCommand>) {
        for node in &self.nodes {
            let pos = self.shape.to_board(node.offset);
            let color = if node.wetness == 0 { Rgba::WHITE } else { Rgba::WATER };
            out.push(DrawCommand::cell(self.layer(), pos.x, pos.y, scale, color));
        }
    }
}
