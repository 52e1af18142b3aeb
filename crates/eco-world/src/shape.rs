//! Rectangular cell masks anchored on the board.

use crate::board::Board;
use crate::render::{DrawCommand, Layer};
use eco_core::{EntityId, Position, Rgba};
use serde::{Deserialize, Serialize};

/// A `width` x `height` grid of booleans, stored column by column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellMask {
    width: i32,
    height: i32,
    cells: Vec<bool>,
}

impl CellMask {
    pub fn new(width: i32, height: i32, fill: bool) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            cells: vec![fill; (width * height) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, local: Position) -> bool {
        local.within(self.width, self.height)
    }

    /// Mask bit at a local position; false outside the mask
    pub fn get(&self, local: Position) -> bool {
        self.contains(local) && self.cells[self.index(local)]
    }

    /// Set a mask bit. Returns false when `local` is outside the mask.
    pub fn set(&mut self, local: Position, value: bool) -> bool {
        if !self.contains(local) {
            return false;
        }
        let index = self.index(local);
        self.cells[index] = value;
        true
    }

    /// Append a column on the right
    pub fn push_column(&mut self, fill: bool) {
        self.cells
            .extend(std::iter::repeat(fill).take(self.height as usize));
        self.width += 1;
    }

    /// Append one cell to the bottom of every column
    pub fn push_row(&mut self, fill: bool) {
        let old_height = self.height as usize;
        let mut cells = Vec::with_capacity(self.width as usize * (old_height + 1));
        for x in 0..self.width as usize {
            cells.extend_from_slice(&self.cells[x * old_height..(x + 1) * old_height]);
            cells.push(fill);
        }
        self.cells = cells;
        self.height += 1;
    }

    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Local positions of every set bit, column by column
    pub fn iter_set(&self) -> impl Iterator<Item = Position> + '_ {
        let height = self.height.max(1);
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &set)| set)
            .map(move |(i, _)| Position::new(i as i32 / height, i as i32 % height))
    }

    fn index(&self, local: Position) -> usize {
        (local.x * self.height + local.y) as usize
    }
}

/// A mask anchored at a board position with a display colour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shape {
    pub origin: Position,
    pub mask: CellMask,
    pub color: Rgba,
}

impl Shape {
    /// An empty shape
    pub fn new(origin: Position, width: i32, height: i32, color: Rgba) -> Self {
        Self {
            origin,
            mask: CellMask::new(width, height, false),
            color,
        }
    }

    /// A shape with every cell set
    pub fn filled(origin: Position, width: i32, height: i32, color: Rgba) -> Self {
        Self {
            origin,
            mask: CellMask::new(width, height, true),
            color,
        }
    }

    /// A filled shape with its four corner cells cut away
    pub fn rounded(origin: Position, width: i32, height: i32, color: Rgba) -> Self {
        let mut shape = Self::filled(origin, width, height, color);
        for x in [0, width - 1] {
            for y in [0, height - 1] {
                shape.mask.set(Position::new(x, y), false);
            }
        }
        shape
    }

    pub fn width(&self) -> i32 {
        self.mask.width()
    }

    pub fn height(&self) -> i32 {
        self.mask.height()
    }

    pub fn to_local(&self, board_pos: Position) -> Position {
        Position::new(board_pos.x - self.origin.x, board_pos.y - self.origin.y)
    }

    pub fn to_board(&self, local: Position) -> Position {
        self.origin.add(local.x, local.y)
    }

    /// Board positions of every set cell
    pub fn board_cells(&self) -> impl Iterator<Item = Position> + '_ {
        self.mask.iter_set().map(move |local| self.to_board(local))
    }

    /// Write `id` into every empty on-board cell covered by the mask
    pub fn claim(&self, id: EntityId, board: &mut Board) {
        for pos in self.board_cells() {
            if board.in_bounds(pos) && board.entity_at(pos).is_none() {
                board.set_entity(Some(id), pos);
            }
        }
    }

    /// Clear every cell still referencing `id`
    pub fn release(&self, id: EntityId, board: &mut Board) {
        for pos in self.board_cells() {
            if board.in_bounds(pos) && board.entity_at(pos) == Some(id) {
                board.set_entity(None, pos);
            }
        }
    }

    pub fn draw(&self, layer: Layer, scale: i32, out: &mut Vec<DrawCommand>) {
        for pos in self.board_cells() {
            out.push(DrawCommand::cell(layer, pos.x, pos.y, scale, self.color));
        }
    }
}
