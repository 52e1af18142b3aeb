//! The entity union and the capabilities every simulation object provides.

use crate::board::Board;
use crate::cloud::Cloud;
use crate::plant::Plant;
use crate::render::{DrawCommand, Drawable, Layer};
use crate::roots::Roots;
use crate::soil::Soil;
use crate::sun::Sun;
use crate::water::Water;
use crate::weather::Weather;
use eco_core::{EntityId, Result};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Everything an entity may touch while it advances one tick
pub struct TickContext<'a> {
    /// The entity being updated
    pub id: EntityId,
    pub tick: u64,
    pub board: &'a mut Board,
    pub rng: &'a mut ChaCha8Rng,
}

/// Advances one tick
pub trait Tickable {
    fn update(&mut self, ctx: &mut TickContext<'_>) -> Result<()>;
}

/// Called exactly once when the entity is registered, to claim its cells
pub trait BoardOccupant {
    fn add_to_board(&mut self, id: EntityId, board: &mut Board) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Water,
    Soil,
    Roots,
    Plant,
    Cloud,
    Sun,
    Weather,
}

/// Every kind of simulation object the board can hold
#[derive(Debug)]
pub enum Entity {
    Water(Water),
    Soil(Soil),
    Roots(Roots),
    Plant(Plant),
    Cloud(Cloud),
    Sun(Sun),
    Weather(Weather),
}

macro_rules! accessors {
    ($($variant:ident => $get:ident, $get_mut:ident;)*) => {
        impl Entity {
            $(
                pub fn $get(&self) -> Option<&$variant> {
                    match self {
                        Entity::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }

                pub fn $get_mut(&mut self) -> Option<&mut $variant> {
                    match self {
                        Entity::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            )*
        }
    };
}

accessors! {
    Water => as_water, as_water_mut;
    Soil => as_soil, as_soil_mut;
    Roots => as_roots, as_roots_mut;
    Plant => as_plant, as_plant_mut;
    Cloud => as_cloud, as_cloud_mut;
    Sun => as_sun, as_sun_mut;
    Weather => as_weather, as_weather_mut;
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Water(_) => EntityKind::Water,
            Entity::Soil(_) => EntityKind::Soil,
            Entity::Roots(_) => EntityKind::Roots,
            Entity::Plant(_) => EntityKind::Plant,
            Entity::Cloud(_) => EntityKind::Cloud,
            Entity::Sun(_) => EntityKind::Sun,
            Entity::Weather(_) => EntityKind::Weather,
        }
    }
}

impl Tickable for Entity {
    fn update(&mut self, ctx: &mut TickContext<'_>) -> Result<()> {
        match self {
            Entity::Water(water) => water.update(ctx),
            Entity::Soil(soil) => soil.update(ctx),
            Entity::Roots(roots) => roots.update(ctx),
            Entity::Plant(plant) => plant.update(ctx),
            Entity::Cloud(cloud) => cloud.update(ctx),
            Entity::Weather(weather) => weather.update(ctx),
            Entity::Sun(_) => Ok(()),
        }
    }
}

impl BoardOccupant for Entity {
    fn add_to_board(&mut self, id: EntityId, board: &mut Board) -> Result<()> {
        match self {
            Entity::Water(water) => water.add_to_board(id, board),
            Entity::Soil(soil) => soil.add_to_board(id, board),
            Entity::Roots(roots) => roots.add_to_board(id, board),
            Entity::Cloud(cloud) => cloud.add_to_board(id, board),
            Entity::Plant(plant) => plant.add_to_board(id, board),
            Entity::Weather(weather) => weather.add_to_board(id, board),
            // drawn only
            Entity::Sun(_) => Ok(()),
        }
    }
}

impl Drawable for Entity {
    fn layer(&self) -> Layer {
        match self {
            Entity::Water(water) => water.layer(),
            Entity::Soil(soil) => soil.layer(),
            Entity::Roots(roots) => roots.layer(),
            Entity::Plant(plant) => plant.layer(),
            Entity::Cloud(cloud) => cloud.layer(),
            Entity::Sun(sun) => sun.layer(),
            Entity::Weather(weather) => weather.layer(),
        }
    }

    fn draw(&self, scale: i32, out: &mut Vec<DrawCommand>) {
        match self {
            Entity::Water(water) => water.draw(scale, out),
            Entity::Soil(soil) => soil.draw(scale, out),
            Entity::Roots(roots) => roots.draw(scale, out),
            Entity::Plant(plant) => plant.draw(scale, out),
            Entity::Cloud(cloud) => cloud.draw(scale, out),
            Entity::Sun(sun) => sun.draw(scale, out),
            Entity::Weather(weather) => weather.draw(scale, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eco_core::Position;

    #[test]
    fn test_accessors_match_kind() {
        let entity = Entity::Water(Water::new(Position::new(0, 0), 3));
        assert_eq!(entity.kind(), EntityKind::Water);
        assert!(entity.as_water().is_some());
        assert!(entity.as_soil().is_none());
        assert!(entity.as_roots().is_none());
    }

    #[test]
    fn test_dispatch_layer() {
        let entity = Entity::Sun(Sun::new(Position::new(0, 0), 2));
        assert_eq!(entity.layer(), Layer::Celestial);
    }
}
