//! Snapshot persistence: a primary JSON store with a bincode fallback.

use crate::world::World;
use emojicraft_core::{Error, GameConfig, PersistenceConfig, Result, WorldSnapshot};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What the engine needs from storage
pub trait PersistenceGateway: Send + Sync {
    fn save(&self, snapshot: &WorldSnapshot) -> Result<()>;
    fn load(&self) -> Result<WorldSnapshot>;
}

/// Write to a sibling temp file first, then rename over the target
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_existing(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(format!("no save at {}", path.display()))
        } else {
            Error::Io(e)
        }
    })
}

/// Pretty-printed JSON save file
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PersistenceGateway for JsonStore {
    fn save(&self, snapshot: &WorldSnapshot) -> Result<()> {
        let json = serde_json::to_vec_pretty(snapshot)?;
        write_atomic(&self.path, &json)?;
        debug!(path = %self.path.display(), "Wrote JSON snapshot");
        Ok(())
    }

    fn load(&self) -> Result<WorldSnapshot> {
        let bytes = read_existing(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Compact binary save file
pub struct BincodeStore {
    path: PathBuf,
}

impl BincodeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PersistenceGateway for BincodeStore {
    fn save(&self, snapshot: &WorldSnapshot) -> Result<()> {
        let bytes = bincode::serialize(snapshot)?;
        write_atomic(&self.path, &bytes)?;
        debug!(path = %self.path.display(), "Wrote binary snapshot");
        Ok(())
    }

    fn load(&self) -> Result<WorldSnapshot> {
        let bytes = read_existing(&self.path)?;
        Ok(bincode::deserialize(&bytes)?)
    }
}

/// Ordered list of stores. Saves go to all of them; loads return the first that works.
pub struct FallbackGateway {
    stores: Vec<Box<dyn PersistenceGateway>>,
}

impl FallbackGateway {
    pub fn new(stores: Vec<Box<dyn PersistenceGateway>>) -> Self {
        Self { stores }
    }

    /// JSON first, bincode second
    pub fn from_config(config: &PersistenceConfig) -> Self {
        Self::new(vec![
            Box::new(JsonStore::new(&config.json_path)),
            Box::new(BincodeStore::new(&config.binary_path)),
        ])
    }
}

impl PersistenceGateway for FallbackGateway {
    fn save(&self, snapshot: &WorldSnapshot) -> Result<()> {
        let mut first_error = None;

        for (index, store) in self.stores.iter().enumerate() {
            if let Err(e) = store.save(snapshot) {
                warn!(store = index, error = %e, "Snapshot save failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn load(&self) -> Result<WorldSnapshot> {
        let mut last_error = None;

        for (index, store) in self.stores.iter().enumerate() {
            match store.load() {
                Ok(snapshot) => {
                    info!(store = index, "Loaded snapshot");
                    return Ok(snapshot);
                }
                Err(e) if e.is_not_found() => {
                    debug!(store = index, "No snapshot in store");
                }
                Err(e) => {
                    warn!(store = index, error = %e, "Snapshot load failed, trying next store");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::NotFound("no saved snapshot".to_string())))
    }
}

/// Restore the saved world, or start a fresh one when nothing usable is on disk
pub fn load_world(config: GameConfig, gateway: &dyn PersistenceGateway) -> World {
    match gateway.load() {
        Ok(snapshot) => World::from_snapshot(config, &snapshot),
        Err(e) if e.is_not_found() => {
            info!("No saved game, starting a new round");
            World::new(config)
        }
        Err(e) => {
            warn!(error = %e, "Could not restore saved game, starting a new round");
            World::new(config)
        }
    }
}
