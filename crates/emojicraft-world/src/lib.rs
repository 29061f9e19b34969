//! Shared game world for EmojiCraft.
//!
//! A single `World` sits behind one `RwLock`. Player moves, the physics loop and the
//! round timer all mutate it under the write lock; readers render whole views under
//! the read lock.

pub mod collision;
pub mod engine;
pub mod gate;
pub mod grid;
pub mod items;
pub mod persistence;
pub mod physics;
pub mod player;
pub mod timer;
pub mod world;

pub use engine::{GameEngine, StartOutcome};
pub use gate::ManualMovementGate;
pub use grid::{Item, MapComponent, WorldGrid};
pub use items::ItemLifecycleManager;
pub use persistence::{load_world, BincodeStore, FallbackGateway, JsonStore, PersistenceGateway};
pub use physics::PhysicsTicker;
pub use timer::TimerController;
pub use world::{MoveOutcome, TickReport, World, WorldView};
