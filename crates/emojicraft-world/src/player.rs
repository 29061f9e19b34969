//! Player state.

use emojicraft_core::{Direction, Position};
use serde::{Deserialize, Serialize};

/// How the player is drawn. Never consulted by game logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pose {
    Standing,
    Jumping,
    Crouching,
    WalkingLeft,
    WalkingRight,
    Falling,
}

impl Pose {
    pub fn symbol(&self) -> &'static str {
        match self {
            Pose::Standing => "🧍🏻‍♂️",
            Pose::Jumping => "🤸🏻‍♂️",
            Pose::Crouching => "🧎🏻‍♂️‍➡️",
            Pose::WalkingLeft => "🚶🏻‍♂️",
            Pose::WalkingRight => "🚶🏻‍♂️‍➡️",
            Pose::Falling => "🧍‍♂️",
        }
    }
}

impl From<Direction> for Pose {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => Pose::Jumping,
            Direction::Down => Pose::Crouching,
            Direction::Left => Pose::WalkingLeft,
            Direction::Right => Pose::WalkingRight,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub position: Position,
    pub pose: Pose,
}

impl Player {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            pose: Pose::Standing,
        }
    }

    pub fn move_to(&mut self, position: Position, pose: Pose) {
        self.position = position;
        self.pose = pose;
    }

    pub fn reset(&mut self, spawn: Position) {
        self.move_to(spawn, Pose::Standing);
    }
}
