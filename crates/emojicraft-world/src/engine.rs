//! The game engine: shared world plus its background tasks.

use crate::gate::ManualMovementGate;
use crate::physics::{run_tick, PhysicsTicker};
use crate::timer::TimerController;
use crate::world::{MoveOutcome, TickReport, World, WorldView};
use emojicraft_core::{Direction, GameConfig, WorldSnapshot};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StartOutcome {
    Started,
    AlreadyActive,
}

/// Owns the world lock and the tasks that mutate it.
///
/// Round lifecycle calls (`start_round`, `restart_round`, `shutdown`) are serialized
/// through the timer slot; player moves and ticks only contend on the world lock.
pub struct GameEngine {
    config: GameConfig,
    world: Arc<RwLock<World>>,
    gate: Arc<ManualMovementGate>,
    physics: Mutex<PhysicsTicker>,
    timer: Mutex<Option<TimerController>>,
}

impl GameEngine {
    pub fn new(config: GameConfig, world: World) -> Self {
        let physics = PhysicsTicker::new(config.physics_interval());
        Self {
            config,
            world: Arc::new(RwLock::new(world)),
            gate: Arc::new(ManualMovementGate::new()),
            physics: Mutex::new(physics),
            timer: Mutex::new(None),
        }
    }

    /// Start the physics loop, and the countdown if the loaded round is still running.
    /// Must be called from within a tokio runtime.
    #[instrument(skip(self))]
    pub fn launch(&self) {
        let mut timer = self.timer.lock();
        self.physics.lock().start(self.world.clone(), self.gate.clone());

        let (active, epoch) = {
            let world = self.world.read();
            (world.is_active(), world.epoch())
        };
        if active && timer.is_none() {
            *timer = Some(TimerController::start(self.world.clone(), epoch));
        }

        info!(active, epoch, "Engine launched");
    }

    pub fn query_world(&self) -> WorldView {
        self.world.read().view()
    }

    /// Move the player one cell. Gravity stays off until the move has been applied.
    #[instrument(skip(self))]
    pub fn move_player(&self, direction: Direction) -> MoveOutcome {
        let _gate = self.gate.close();
        let outcome = self.world.write().move_player(direction, Instant::now());
        debug!(x = outcome.x, y = outcome.y, score = outcome.score, "Player moved");
        outcome
    }

    /// Begin a new round on the current board. `None` or zero uses the configured length.
    #[instrument(skip(self))]
    pub fn start_round(&self, duration_secs: Option<u32>) -> StartOutcome {
        let mut timer = self.timer.lock();

        let duration = match duration_secs {
            Some(secs) if secs > 0 => secs,
            _ => self.config.round_duration_secs,
        };

        let epoch = {
            let mut world = self.world.write();
            if world.is_active() {
                debug!("Round already running");
                return StartOutcome::AlreadyActive;
            }
            world.begin_round(duration, Instant::now())
        };

        if let Some(old) = timer.take() {
            old.cancel();
        }
        *timer = Some(TimerController::start(self.world.clone(), epoch));
        self.physics.lock().start(self.world.clone(), self.gate.clone());

        info!(epoch, duration, "Round started");
        StartOutcome::Started
    }

    /// Throw the current round away and start over from a clean board
    #[instrument(skip(self))]
    pub fn restart_round(&self) {
        let mut timer = self.timer.lock();
        if let Some(old) = timer.take() {
            old.cancel();
        }

        let mut physics = self.physics.lock();
        physics.stop();

        let epoch = {
            let mut world = self.world.write();
            world.reset(Instant::now());
            world.epoch()
        };

        *timer = Some(TimerController::start(self.world.clone(), epoch));
        physics.start(self.world.clone(), self.gate.clone());

        info!(epoch, "Round restarted");
    }

    /// One physics tick, run synchronously
    pub fn physics_step(&self) -> TickReport {
        run_tick(&self.world, &self.gate)
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        self.world.read().snapshot()
    }

    /// Stop every background task, end the round and hand back the final state
    #[instrument(skip(self))]
    pub fn shutdown(&self) -> WorldSnapshot {
        let mut timer = self.timer.lock();
        if let Some(old) = timer.take() {
            old.cancel();
        }
        self.physics.lock().stop();

        let mut world = self.world.write();
        world.deactivate();
        let snapshot = world.snapshot();

        info!(score = snapshot.score, time_remaining = snapshot.time_remaining, "Engine shut down");
        snapshot
    }
}
