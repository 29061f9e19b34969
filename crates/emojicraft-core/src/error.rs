//! Error types for the game engine.

use crate::Position;
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

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Position out of bounds: ({}, {})", .0.x, .0.y)]
    OutOfBounds(Position),

    #[error("Cell already occupied: ({}, {})", .0.x, .0.y)]
    Occupied(Position),

    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// True for errors that mean "nothing was there", as opposed to a real failure
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(Error::NotFound("save".to_string()).is_not_found());

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(Error::from(io).is_not_found());

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!Error::from(io).is_not_found());
        assert!(!Error::Validation("bad".to_string()).is_not_found());
    }

    #[test]
    fn test_out_of_bounds_message() {
        let err = Error::OutOfBounds(Position::new(-1, 12));
        assert_eq!(err.to_string(), "Position out of bounds: (-1, 12)");
    }
}
