//! Rain clouds: solid blocks that drop unit water from their lower edge.

use crate::board::Board;
use crate::entity::{BoardOccupant, Entity, TickContext, Tickable};
use crate::render::{DrawCommand, Drawable, Layer};
use crate::shape::Shape;
use crate::water::Water;
use eco_core::{CloudConfig, EntityId, Position, Result, Rgba};
use rand::Rng;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct Cloud {
    shape: Shape,
    /// Ticks between drops while raining
    rate: u64,
    ticks: u64,
    raining: bool,
}

impl Cloud {
    pub fn new(origin: Position, width: i32, height: i32, rate: u64) -> Self {
        Self {
            shape: Shape::rounded(origin, width, height, Rgba::WHITE),
            rate: rate.max(1),
            ticks: 0,
            raining: false,
        }
    }

    pub fn from_config(config: &CloudConfig) -> Self {
        let mut cloud = Self::new(
            Position::new(config.x, config.y),
            config.width,
            config.height,
            config.rate,
        );
        cloud.raining = config.raining;
        cloud
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn is_raining(&self) -> bool {
        self.raining
    }

    pub fn set_status(&mut self, raining: bool, rate: u64) {
        self.raining = raining;
        self.rate = rate.max(1);
    }

    /// Slide one column to the right, carrying the claimed cells along
    pub fn shift_right(&mut self, id: EntityId, board: &mut Board) {
        self.shape.release(id, board);
        self.shape.origin.x += 1;
        self.shape.claim(id, board);
    }

    /// Give back every board cell this cloud still holds
    pub fn release(&self, id: EntityId, board: &mut Board) {
        self.shape.release(id, board);
    }

    fn drop_water(&self, ctx: &mut TickContext<'_>) -> Result<()> {
        // corners are rounded off, so drops come from strictly inside the edges
        let width = self.shape.width();
        if width < 3 {
            return Ok(());
        }
        let x = self.shape.origin.x + 1 + ctx.rng.gen_range(0..width - 2);
        let target = Position::new(x, self.shape.origin.y + self.shape.height());

        if !ctx.board.in_bounds(target) || ctx.board.entity_at(target).is_some() {
            trace!(cloud = %ctx.id, x = target.x, y = target.y, "drop blocked");
            return Ok(());
        }
        ctx.board.add_entity(Entity::Water(Water::new(target, 1)))?;
        Ok(())
    }
}

impl Tickable for Cloud {
    fn update(&mut self, ctx: &mut TickContext<'_>) -> Result<()> {
        if !self.raining {
            return Ok(());
        }
        if self.ticks % self.rate == 0 {
            self.drop_water(ctx)?;
        }
        self.ticks += 1;
        Ok(())
    }
}

impl BoardOccupant for Cloud {
    fn add_to_board(&mut self, id: EntityId, board: &mut Board) -> Result<()> {
        self.shape.claim(id, board);
        Ok(())
    }
}

impl Drawable for Cloud {
    fn layer(&self) -> Layer {
        Layer::Terrain
    }

    fn draw(&self, scale: i32, out: &mut Vec<DrawCommand>) {
        self.shape.draw(self.layer(), scale, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn update(board: &mut Board, rng: &mut ChaCha8Rng, id: EntityId) {
        let mut entity = board.check_out(id).unwrap();
        let mut ctx = TickContext {
            id,
            tick: 0,
            board: &mut *board,
            rng: &mut *rng,
        };
        entity.update(&mut ctx).unwrap();
        board.check_in(id, entity);
    }

    fn waters(board: &Board) -> Vec<Position> {
        board
            .iter()
            .filter_map(|(_, e)| e.as_water())
            .map(Water::position)
            .collect()
    }

    fn clear_water(board: &mut Board) -> usize {
        let drops: Vec<_> = board
            .iter()
            .filter_map(|(id, e)| e.as_water().map(|w| (id, w.position())))
            .collect();
        for &(id, pos) in &drops {
            board.set_entity(None, pos);
            board.remove_entity(id);
        }
        drops.len()
    }

    #[test]
    fn test_claims_rounded_cells() {
        let mut board = Board::new(10, 10);
        let id = board
            .add_entity(Entity::Cloud(Cloud::new(Position::new(2, 2), 4, 3, 1)))
            .unwrap();
        assert_eq!(board.entity_at(Position::new(2, 2)), None);
        assert_eq!(board.entity_at(Position::new(3, 2)), Some(id));
        assert_eq!(board.entity_at(Position::new(2, 3)), Some(id));
    }

    #[test]
    fn test_dry_cloud_drops_nothing() {
        let mut board = Board::new(10, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let id = board
            .add_entity(Entity::Cloud(Cloud::new(Position::new(2, 2), 4, 3, 1)))
            .unwrap();
        for _ in 0..5 {
            update(&mut board, &mut rng, id);
        }
        assert!(waters(&board).is_empty());
    }

    #[test]
    fn test_rain_spawns_below_inner_columns() {
        let mut board = Board::new(10, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut cloud = Cloud::new(Position::new(2, 2), 5, 2, 1);
        cloud.set_status(true, 1);
        let id = board.add_entity(Entity::Cloud(cloud)).unwrap();

        update(&mut board, &mut rng, id);

        let drops = waters(&board);
        assert_eq!(drops.len(), 1);
        assert_eq!(drops[0].y, 4);
        assert!((3..=5).contains(&drops[0].x));
    }

    #[test]
    fn test_rain_respects_rate() {
        let mut board = Board::new(10, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut cloud = Cloud::new(Position::new(2, 2), 5, 2, 1);
        cloud.set_status(true, 3);
        let id = board.add_entity(Entity::Cloud(cloud)).unwrap();

        // drops on ticks 0 and 3 of its own counter
        let mut dropped = 0;
        for _ in 0..4 {
            update(&mut board, &mut rng, id);
            dropped += clear_water(&mut board);
        }
        assert_eq!(dropped, 2);
    }

    #[test]
    fn test_drop_onto_occupied_cell_is_skipped() {
        let mut board = Board::new(10, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for x in 0..10 {
            board.set_entity(Some(EntityId(500)), Position::new(x, 4));
        }
        let mut cloud = Cloud::new(Position::new(2, 2), 5, 2, 1);
        cloud.set_status(true, 1);
        let id = board.add_entity(Entity::Cloud(cloud)).unwrap();

        update(&mut board, &mut rng, id);
        assert!(waters(&board).is_empty());
        assert_eq!(board.entity_at(Position::new(3, 4)), Some(EntityId(500)));
    }

    #[test]
    fn test_drop_off_board_is_skipped() {
        let mut board = Board::new(10, 4);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut cloud = Cloud::new(Position::new(2, 2), 5, 2, 1);
        cloud.set_status(true, 1);
        let id = board.add_entity(Entity::Cloud(cloud)).unwrap();

        update(&mut board, &mut rng, id);
        assert!(waters(&board).is_empty());
    }

    #[test]
    fn test_shift_right_moves_claims() {
        let mut board = Board::new(10, 10);
        let id = board
            .add_entity(Entity::Cloud(Cloud::new(Position::new(2, 2), 4, 3, 1)))
            .unwrap();
        let mut cloud = board.check_out(id).unwrap();
        cloud.as_cloud_mut().unwrap().shift_right(id, &mut board);
        board.check_in(id, cloud);

        assert_eq!(board.entity_at(Position::new(3, 2)), None);
        assert_eq!(board.entity_at(Position::new(4, 2)), Some(id));
        assert_eq!(board.entity_at(Position::new(6, 3)), Some(id));
        assert_eq!(board.entity_at(Position::new(2, 3)), None);

        let cloud = board.get(id).unwrap().as_cloud().unwrap().clone();
        cloud.release(id, &mut board);
        assert!((0..10).all(|x| (0..10).all(|y| board.entity_at(Position::new(x, y)).is_none())));
    }
}
