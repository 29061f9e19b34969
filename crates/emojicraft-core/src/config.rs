//! Configuration types for the game and the server.

use crate::{Error, Position, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Number of wall rows at the bottom of the grid
pub const GROUND_ROWS: i32 = 2;

/// World and round parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Width of the world grid
    pub width: i32,
    /// Height of the world grid, ground rows included
    pub height: i32,
    /// Player start cell, used on round start and whenever the player is found out of bounds
    pub spawn_x: i32,
    pub spawn_y: i32,
    /// How long an uncollected item lives (milliseconds)
    pub item_lifetime_ms: u64,
    /// Physics tick interval (milliseconds)
    pub physics_interval_ms: u64,
    /// Length of a round (seconds)
    pub round_duration_secs: u32,
    /// Seed for item placement; entropy when unset
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 24,
            height: 10,
            spawn_x: 2,
            spawn_y: 5,
            item_lifetime_ms: 4000,
            physics_interval_ms: 200,
            round_duration_secs: 180,
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn spawn(&self) -> Position {
        Position::new(self.spawn_x, self.spawn_y)
    }

    /// Rows the player may occupy: everything above the ground
    pub fn playable_height(&self) -> i32 {
        self.height - GROUND_ROWS
    }

    pub fn item_lifetime(&self) -> Duration {
        Duration::from_millis(self.item_lifetime_ms)
    }

    pub fn physics_interval(&self) -> Duration {
        Duration::from_millis(self.physics_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width < 1 || self.playable_height() < 1 {
            return Err(Error::Validation(format!(
                "grid {}x{} leaves no playable cells",
                self.width, self.height
            )));
        }

        let spawn = self.spawn();
        if spawn.x < 0 || spawn.x >= self.width || spawn.y < 0 || spawn.y >= self.playable_height() {
            return Err(Error::Validation(format!(
                "spawn point {} is outside the playable area",
                spawn
            )));
        }

        if self.physics_interval_ms == 0 {
            return Err(Error::Validation(
                "physics interval must be positive".to_string(),
            ));
        }

        if self.round_duration_secs == 0 {
            return Err(Error::Validation(
                "round duration must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Where and how often world snapshots are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Primary save file (JSON)
    pub json_path: String,
    /// Secondary save file (bincode)
    pub binary_path: String,
    /// Checkpoint interval (seconds), 0 disables periodic saves
    pub checkpoint_interval_secs: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            json_path: "game_state.json".to_string(),
            binary_path: "game_state.bin".to_string(),
            checkpoint_interval_secs: 60,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: String,
    /// Server port
    pub port: u16,
    /// OpenTelemetry endpoint
    pub otel_endpoint: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 4567,
            otel_endpoint: None,
        }
    }
}

/// Everything read from the settings file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub game: GameConfig,
    pub persistence: PersistenceConfig,
    pub server: ServerConfig,
}

impl Settings {
    /// Read settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(format!("settings file {}", path.display()))
            } else {
                Error::Io(e)
            }
        })?;
        let settings: Settings = serde_json::from_str(&contents)?;
        settings.game.validate()?;
        Ok(settings)
    }

    /// Settings from an earlier `load` of `path`, or defaults when that failed.
    /// Call once logging is up so the fallback warning is not lost.
    pub fn or_default(path: impl AsRef<Path>, loaded: Result<Self>) -> Self {
        let path = path.as_ref();
        match loaded {
            Ok(settings) => {
                info!(path = %path.display(), "Loaded settings");
                settings
            }
            Err(e) if e.is_not_found() => {
                info!(path = %path.display(), "No settings file, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid settings file, using defaults");
                Self::default()
            }
        }
    }
}
