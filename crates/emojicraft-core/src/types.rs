//! Core type definitions for the game world.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a spawned item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 2D cell position on the grid. `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn step(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.to_delta();
        self.add(dx, dy)
    }

    /// The cell directly underneath
    pub fn below(&self) -> Self {
        self.add(0, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Direction for a player-initiated move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn to_delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    /// Accepts the full names as well as the WASD keys, ignoring case
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "w" => Ok(Direction::Up),
            "down" | "s" => Ok(Direction::Down),
            "left" | "a" => Ok(Direction::Left),
            "right" | "d" => Ok(Direction::Right),
            _ => Err(Error::Validation(format!("invalid direction: {:?}", s))),
        }
    }
}

/// Sign of an item's score delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn flipped(self) -> Self {
        match self {
            Polarity::Positive => Polarity::Negative,
            Polarity::Negative => Polarity::Positive,
        }
    }

    pub fn of(delta: i64) -> Self {
        if delta < 0 {
            Polarity::Negative
        } else {
            Polarity::Positive
        }
    }
}

/// Symbol used for an empty cell in rendered grids and snapshots
pub const BLANK: &str = " ";

/// Persisted view of a world. The grid keeps only symbols, so restoring it turns every
/// occupied cell into an obstacle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldSnapshot {
    pub player_x: i32,
    pub player_y: i32,
    pub score: i64,
    pub grid: Vec<Vec<String>>,
    pub time_remaining: u32,
    /// Unix timestamp of the save, 0 for snapshots written without one
    #[serde(default)]
    pub saved_at: i64,
}

impl WorldSnapshot {
    /// Occupied cells of the saved grid, in row-major order
    pub fn occupied_cells(&self) -> impl Iterator<Item = Position> + '_ {
        self.grid.iter().enumerate().flat_map(|(y, row)| {
            row.iter().enumerate().filter_map(move |(x, symbol)| {
                if symbol.is_empty() || symbol == BLANK {
                    None
                } else {
                    Some(Position::new(x as i32, y as i32))
                }
            })
        })
    }
}
