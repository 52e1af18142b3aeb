//! Spatial occupancy grid and the live entity registry.

use crate::entity::{BoardOccupant, Entity};
use crate::soil::Soil;
use eco_core::{EntityId, Position, Result};
use std::collections::HashMap;

/// A `width` x `height` grid where each cell references at most one entity,
/// plus the insertion-ordered registry that owns every live entity.
///
/// The grid holds non-owning [`EntityId`]s. Removing an entity from the
/// registry does not touch the grid: the owner clears its cells first.
#[derive(Debug)]
pub struct Board {
    width: i32,
    height: i32,
    cells: Vec<Option<EntityId>>,
    registry: Vec<EntityId>,
    // `None` while the entity is checked out for its own update
    store: HashMap<EntityId, Option<Entity>>,
    next_id: u64,
}

impl Board {
    pub fn new(width: i32, height: i32) -> Self {
        let size = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            cells: vec![None; size],
            registry: Vec::new(),
            store: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.within(self.width, self.height)
    }

    /// Register an entity and let it claim its initial cells.
    ///
    /// If the entity rejects the board (e.g. roots outside soil) it is not
    /// registered and the error is returned.
    pub fn add_entity(&mut self, mut entity: Entity) -> Result<EntityId> {
        let id = EntityId(self.next_id);
        self.next_id += 1;

        entity.add_to_board(id, self)?;
        self.registry.push(id);
        self.store.insert(id, Some(entity));
        Ok(id)
    }

    /// Remove an entity from the registry. Its grid cells must already be cleared.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        if let Some(idx) = self.registry.iter().position(|&e| e == id) {
            self.registry.remove(idx);
        }
        self.store.remove(&id).flatten()
    }

    /// Point-in-time copy of the registry in insertion order
    pub fn entities(&self) -> Vec<EntityId> {
        self.registry.clone()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.store.contains_key(&id)
    }

    /// Put `id` (or nothing) at `pos`. Out-of-range positions panic.
    pub fn set_entity(&mut self, id: Option<EntityId>, pos: Position) {
        let index = self.pos_to_index(pos);
        self.cells[index] = id;
    }

    /// Entity referenced by the cell at `pos`. Out-of-range positions panic.
    pub fn entity_at(&self, pos: Position) -> Option<EntityId> {
        self.cells[self.pos_to_index(pos)]
    }

    /// Move whatever occupies `from` to `to`, leaving `from` empty.
    pub fn move_entity(&mut self, from: Position, to: Position) {
        let from_index = self.pos_to_index(from);
        let to_index = self.pos_to_index(to);
        self.cells[to_index] = self.cells[from_index].take();
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.store.get(&id).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.store.get_mut(&id).and_then(Option::as_mut)
    }

    /// Entity occupying `pos`, if any and not currently checked out
    pub fn occupant(&self, pos: Position) -> Option<&Entity> {
        if !self.in_bounds(pos) {
            return None;
        }
        self.entity_at(pos).and_then(|id| self.get(id))
    }

    pub fn soil_at(&self, pos: Position) -> Option<&Soil> {
        self.occupant(pos).and_then(Entity::as_soil)
    }

    pub fn soil_at_mut(&mut self, pos: Position) -> Option<&mut Soil> {
        if !self.in_bounds(pos) {
            return None;
        }
        let id = self.entity_at(pos)?;
        self.get_mut(id).and_then(Entity::as_soil_mut)
    }

    /// Take an entity out of the store so it can mutate the board while updating
    pub(crate) fn check_out(&mut self, id: EntityId) -> Option<Entity> {
        self.store.get_mut(&id).and_then(Option::take)
    }

    /// Return a checked-out entity. Dropped if it was removed in the meantime.
    pub(crate) fn check_in(&mut self, id: EntityId, entity: Entity) {
        if let Some(slot) = self.store.get_mut(&id) {
            *slot = Some(entity);
        }
    }

    /// Registered entities in insertion order, skipping any checked out
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.registry
            .iter()
            .filter_map(move |&id| self.get(id).map(|entity| (id, entity)))
    }

    fn pos_to_index(&self, pos: Position) -> usize {
        assert!(
            self.in_bounds(pos),
            "board position ({}, {}) outside {}x{}",
            pos.x,
            pos.y,
            self.width,
            self.height
        );
        (pos.y * self.width + pos.x) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sun::Sun;
    use crate::water::Water;

    fn water(x: i32, y: i32) -> Entity {
        Entity::Water(Water::new(Position::new(x, y), 1))
    }

    #[test]
    fn test_board_creation() {
        let board = Board::new(10, 7);
        assert_eq!(board.size(), (10, 7));
        assert_eq!(board.cells.len(), 70);
        assert!(board.is_empty());
    }

    #[test]
    fn test_add_entity_claims_cell() {
        let mut board = Board::new(5, 5);
        let id = board.add_entity(water(2, 3)).unwrap();
        assert_eq!(board.entity_at(Position::new(2, 3)), Some(id));
        assert!(board.get(id).unwrap().as_water().is_some());
        assert_eq!(board.entities(), vec![id]);
    }

    #[test]
    fn test_move_entity() {
        let mut board = Board::new(5, 5);
        let id = board.add_entity(water(1, 1)).unwrap();
        board.move_entity(Position::new(1, 1), Position::new(1, 2));
        assert_eq!(board.entity_at(Position::new(1, 1)), None);
        assert_eq!(board.entity_at(Position::new(1, 2)), Some(id));
    }

    #[test]
    fn test_remove_leaves_cells_to_caller() {
        let mut board = Board::new(5, 5);
        let id = board.add_entity(water(0, 0)).unwrap();
        board.set_entity(None, Position::new(0, 0));
        assert!(board.remove_entity(id).is_some());
        assert!(!board.contains(id));
        assert!(board.is_empty());
        assert_eq!(board.entity_at(Position::new(0, 0)), None);
    }

    #[test]
    fn test_snapshot_isolation() {
        let mut board = Board::new(8, 8);
        let a = board.add_entity(water(0, 0)).unwrap();
        let b = board.add_entity(water(1, 0)).unwrap();
        let c = board.add_entity(water(2, 0)).unwrap();

        let snapshot = board.entities();

        board.set_entity(None, Position::new(1, 0));
        board.remove_entity(b);
        board.add_entity(water(3, 0)).unwrap();
        board.add_entity(water(4, 0)).unwrap();

        let seen: Vec<EntityId> = snapshot.into_iter().collect();
        assert_eq!(seen, vec![a, b, c]);
        assert_eq!(board.len(), 4);
    }

    #[test]
    fn test_checked_out_entity_is_invisible() {
        let mut board = Board::new(4, 4);
        let id = board.add_entity(water(1, 1)).unwrap();
        let entity = board.check_out(id).unwrap();
        assert!(board.get(id).is_none());
        assert!(board.occupant(Position::new(1, 1)).is_none());
        assert_eq!(board.iter().count(), 0);
        board.check_in(id, entity);
        assert!(board.get(id).is_some());
    }

    #[test]
    fn test_check_in_after_removal_drops_entity() {
        let mut board = Board::new(4, 4);
        let id = board.add_entity(water(1, 1)).unwrap();
        let entity = board.check_out(id).unwrap();
        board.set_entity(None, Position::new(1, 1));
        board.remove_entity(id);
        board.check_in(id, entity);
        assert!(!board.contains(id));
        assert!(board.is_empty());
    }

    #[test]
    fn test_non_solid_entity_claims_nothing() {
        let mut board = Board::new(6, 6);
        board
            .add_entity(Entity::Sun(Sun::new(Position::new(1, 1), 3)))
            .unwrap();
        assert!(board.cells.iter().all(Option::is_none));
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_access_panics() {
        let board = Board::new(3, 3);
        board.entity_at(Position::new(3, 0));
    }
}
