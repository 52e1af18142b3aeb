//! The plant: a green block that spends water drawn up through the roots.

use crate::board::Board;
use crate::entity::{BoardOccupant, TickContext, Tickable};
use crate::render::{DrawCommand, Drawable, Layer};
use crate::shape::Shape;
use eco_core::{EntityId, Error, PlantConfig, Position, Result, Rgba};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Plant {
    shape: Shape,
    roots: EntityId,
    water: u32,
    speed: u64,
    water_cost_per_cell: u32,
    ticks: u64,
}

impl Plant {
    /// A 1x1 plant at `pos` fed by the given roots entity
    pub fn new(pos: Position, roots: EntityId, speed: u64, water_cost_per_cell: u32) -> Self {
        Self {
            shape: Shape::filled(pos, 1, 1, Rgba::PLANT),
            roots,
            water: 0,
            speed: speed.max(1),
            water_cost_per_cell,
            ticks: 0,
        }
    }

    pub fn from_config(config: &PlantConfig, roots: EntityId) -> Self {
        Self::new(
            Position::new(config.x, config.y),
            roots,
            config.speed,
            config.water_cost_per_cell,
        )
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Water held in reserve for the next growth step
    pub fn water(&self) -> u32 {
        self.water
    }

    pub fn cell_count(&self) -> usize {
        self.shape.mask.count()
    }

    fn pull_from_roots(&mut self, board: &mut Board) -> Result<()> {
        let Some(roots) = board.get_mut(self.roots).and_then(|e| e.as_roots_mut()) else {
            return Err(Error::InvariantViolation(format!(
                "plant is fed by {} which is not a live roots entity",
                self.roots
            )));
        };
        self.water += roots.suck_water();
        Ok(())
    }

    /// One column or one row of growth, if the reserve covers it
    fn grow(&mut self) {
        let width = self.shape.width();
        let height = self.shape.height();

        if width < height / 3 {
            let cost = (height as u32).saturating_mul(self.water_cost_per_cell);
            if self.water < cost {
                return;
            }
            self.water -= cost;
            self.shape.mask.push_column(true);
            // keep the stem centred
            if self.shape.width() % 2 == 1 {
                self.shape.origin.x -= 1;
            }
        } else {
            let cost = (width as u32).saturating_mul(self.water_cost_per_cell);
            if self.water < cost {
                return;
            }
            self.water -= cost;
            self.shape.mask.push_row(true);
            self.shape.origin.y -= 1;
        }

        debug!(
            event = "plant_grew",
            width = self.shape.width(),
            height = self.shape.height(),
            water = self.water,
            "Plant grew"
        );
    }
}

impl Tickable for Plant {
    fn update(&mut self, ctx: &mut TickContext<'_>) -> Result<()> {
        self.ticks += 1;
        if self.ticks % self.speed == 0 {
            self.pull_from_roots(ctx.board)?;
        }
        self.grow();
        Ok(())
    }
}

/// The plant is drawn over the board but never blocks water
impl BoardOccupant for Plant {
    fn add_to_board(&mut self, _id: EntityId, _board: &mut Board) -> Result<()> {
        Ok(())
    }
}

impl Drawable for Plant {
    fn layer(&self) -> Layer {
        Layer::Terrain
    }

    fn draw(&self, scale: i32, out: &mut Vec<DrawCommand>) {
        self.shape.draw(self.layer(), scale, out);
    }
}
