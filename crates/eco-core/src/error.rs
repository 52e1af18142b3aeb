//! Error types for the simulation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A board coordinate fell outside an entity's footprint once converted
    /// to local coordinates.
    #[error("cell ({x},{y}) (local ({local_x},{local_y})) is outside the footprint")]
    OutOfBounds {
        x: i32,
        y: i32,
        local_x: i32,
        local_y: i32,
    },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl Error {
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, Error::OutOfBounds { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
