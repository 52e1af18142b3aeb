//! Ecosystem simulation engine.
//!
//! A grid board where falling water soaks into soil, roots grow through the
//! wet ground and feed a plant, and a weather system drifts rain clouds
//! across the sky.

pub mod board;
pub mod cloud;
pub mod entity;
pub mod plant;
pub mod render;
pub mod roots;
pub mod shape;
pub mod simulation;
pub mod soil;
pub mod sun;
pub mod water;
pub mod weather;

pub use board::Board;
pub use cloud::Cloud;
pub use entity::{BoardOccupant, Entity, EntityKind, TickContext, Tickable};
pub use plant::Plant;
pub use render::{DrawCommand, Drawable, Layer};
pub use roots::{RootCell, Roots};
pub use shape::{CellMask, Shape};
pub use simulation::{Simulation, SimulationSummary};
pub use soil::Soil;
pub use sun::Sun;
pub use water::Water;
pub use weather::Weather;
