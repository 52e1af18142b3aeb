//! Draw intents handed to the rendering collaborator.

use eco_core::Rgba;
use serde::{Deserialize, Serialize};

/// Draw ordering. Lower layers are drawn first; order inside a layer is unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Layer {
    Sky = 0,
    Celestial = 1,
    Terrain = 2,
    Overlay = 3,
}

/// A filled rectangle in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawCommand {
    pub layer: Layer,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub color: Rgba,
}

impl DrawCommand {
    /// One board cell at `(x, y)` scaled to `scale` pixels
    pub fn cell(layer: Layer, x: i32, y: i32, scale: i32, color: Rgba) -> Self {
        Self {
            layer,
            x: x * scale,
            y: y * scale,
            width: scale,
            height: scale,
            color,
        }
    }
}

/// Something that can describe how it looks
pub trait Drawable {
    fn layer(&self) -> Layer;

    fn draw(&self, scale: i32, out: &mut Vec<DrawCommand>);
}
