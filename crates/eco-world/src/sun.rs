//! The sun: a rounded yellow disc behind the clouds.

use crate::render::{DrawCommand, Drawable, Layer};
use crate::shape::Shape;
use eco_core::{Position, Rgba};

/// Backdrop decoration that hides behind heavy cloud cover
#[derive(Debug, Clone)]
pub struct Sun {
    shape: Shape,
    hidden: bool,
}

impl Sun {
    pub fn new(origin: Position, size: i32) -> Self {
        Self {
            shape: Shape::rounded(origin, size, size, Rgba::SUN),
            hidden: false,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }
}

impl Drawable for Sun {
    fn layer(&self) -> Layer {
        Layer::Celestial
    }

    fn draw(&self, scale: i32, out: &mut Vec<DrawCommand>) {
        if !self.hidden {
            self.shape.draw(self.layer(), scale, out);
        }
    }
}
