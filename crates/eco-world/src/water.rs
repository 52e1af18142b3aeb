//! Water units and the density-conserving flow automaton.

use crate::board::Board;
use crate::entity::{BoardOccupant, Entity, TickContext, Tickable};
use crate::render::{DrawCommand, Drawable, Layer};
use eco_core::{Direction, EntityId, Position, Result, Rgba};
use rand::Rng;
use tracing::trace;

/// A unit of fluid occupying one board cell.
///
/// `density` is the mass held in the cell. Splits, pushes and merges move
/// mass between units without creating or destroying it; only soil
/// absorption removes it.
#[derive(Debug, Clone)]
pub struct Water {
    pos: Position,
    density: i32,
    settled: u32,
}

/// What a flow target turned out to be
enum Target {
    Empty,
    Water { id: EntityId, pushable: bool },
    Soil,
    Blocked,
}

impl Water {
    pub fn new(pos: Position, density: i32) -> Self {
        Self {
            pos,
            density,
            settled: 0,
        }
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    pub fn density(&self) -> i32 {
        self.density
    }

    /// Consecutive ticks this unit has spent without flowing anywhere
    pub fn settled(&self) -> u32 {
        self.settled
    }

    /// True iff no empty on-board cell is reachable in any cardinal direction
    pub fn under_pressure(&self, board: &Board) -> bool {
        !Direction::cardinal()
            .iter()
            .any(|&dir| can_flow(board, self.pos.step(dir), false))
    }

    fn classify(board: &Board, target: Position, force: bool) -> Target {
        if !board.in_bounds(target) {
            return Target::Blocked;
        }
        let Some(id) = board.entity_at(target) else {
            return Target::Empty;
        };
        match board.get(id) {
            Some(Entity::Water(other)) => Target::Water {
                id,
                pushable: force && other.density == 1 && !other.under_pressure(board),
            },
            Some(Entity::Soil(_)) => Target::Soil,
            _ => Target::Blocked,
        }
    }

    /// Try to move one unit of mass into `target`
    fn flow_to(&mut self, ctx: &mut TickContext<'_>, target: Position, force: bool) -> Result<bool> {
        match Self::classify(ctx.board, target, force) {
            Target::Empty => {
                if self.density == 1 {
                    ctx.board.move_entity(self.pos, target);
                    self.pos = target;
                } else {
                    ctx.board
                        .add_entity(Entity::Water(Water::new(target, 1)))?;
                    self.density -= 1;
                }
                Ok(true)
            }
            Target::Water { id, pushable: true } => {
                if let Some(other) = ctx.board.get_mut(id).and_then(Entity::as_water_mut) {
                    other.density += 1;
                }
                self.lose_unit(ctx);
                Ok(true)
            }
            Target::Soil => {
                let absorbed = match ctx.board.soil_at_mut(target) {
                    Some(soil) => soil.absorb(target, ctx.rng),
                    None => false,
                };
                if absorbed {
                    self.lose_unit(ctx);
                }
                Ok(absorbed)
            }
            Target::Water { pushable: false, .. } | Target::Blocked => Ok(false),
        }
    }

    fn lose_unit(&mut self, ctx: &mut TickContext<'_>) {
        self.density -= 1;
        if self.density == 0 {
            ctx.board.set_entity(None, self.pos);
            ctx.board.remove_entity(ctx.id);
            trace!(water = %ctx.id, x = self.pos.x, y = self.pos.y, "water drained away");
        }
    }

    fn step(&mut self, ctx: &mut TickContext<'_>) -> Result<bool> {
        if self.flow_to(ctx, self.pos.add(0, 1), true)? {
            return Ok(true);
        }

        let first = if ctx.rng.gen_bool(0.5) { -1 } else { 1 };
        let mut moved = false;
        for dx in [first, -first] {
            let flowed = self.flow_to(ctx, self.pos.add(dx, 0), false)?;
            moved |= flowed;
            if flowed && self.density <= 1 {
                return Ok(true);
            }
        }

        if self.density > 1 {
            // enough mass to spare a unit: escape upwards, then push sideways
            for target in [self.pos.add(0, -1), self.pos.add(-first, 0), self.pos.add(first, 0)] {
                let flowed = self.flow_to(ctx, target, true)?;
                moved |= flowed;
                if flowed && self.density <= 1 {
                    return Ok(true);
                }
            }
        }

        Ok(moved)
    }
}

/// Dry run of a flow attempt: reports feasibility without mutating anything
fn can_flow(board: &Board, target: Position, force: bool) -> bool {
    matches!(
        Water::classify(board, target, force),
        Target::Empty | Target::Water { pushable: true, .. }
    )
}

impl Tickable for Water {
    fn update(&mut self, ctx: &mut TickContext<'_>) -> Result<()> {
        if self.density <= 0 {
            return Ok(());
        }
        if self.step(ctx)? {
            self.settled = 0;
        } else {
            self.settled += 1;
        }
        Ok(())
    }
}

impl BoardOccupant for Water {
    fn add_to_board(&mut self, id: EntityId, board: &mut Board) -> Result<()> {
        board.set_entity(Some(id), self.pos);
        Ok(())
    }
}

impl Drawable for Water {
    fn layer(&self) -> Layer {
        Layer::Overlay
    }

    fn draw(&self, scale: i32, out: &mut Vec<DrawCommand>) {
        out.push(DrawCommand::cell(self.layer(), self.pos.x, self.pos.y, scale, Rgba::WATER));
    }
}
