//! One-second round countdown.

use crate::world::World;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const SECOND: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    /// Still running with this many seconds left
    Running(u32),
    /// The round just ran out, or had already ended
    Finished,
    /// A newer round owns the world; this timer must not touch it
    Stale,
}

impl World {
    /// Advance the countdown of round `epoch` by one second
    pub fn countdown(&mut self, epoch: u64) -> Countdown {
        if self.epoch != epoch {
            return Countdown::Stale;
        }
        if !self.active {
            return Countdown::Finished;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.active = false;
            info!(epoch, score = self.score, "Time is up, round over");
            return Countdown::Finished;
        }

        Countdown::Running(self.remaining_secs)
    }

    /// End round `epoch` early. Ignored when a newer round has started.
    pub fn cancel_round(&mut self, epoch: u64) -> bool {
        if self.epoch != epoch {
            return false;
        }
        self.active = false;
        true
    }
}

/// Background countdown bound to one round epoch
pub struct TimerController {
    epoch: u64,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl TimerController {
    /// Spawn the countdown for round `epoch` on the current tokio runtime
    pub fn start(world: Arc<RwLock<World>>, epoch: u64) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut seconds = interval_at(Instant::now() + SECOND, SECOND);

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        if world.write().cancel_round(epoch) {
                            info!(epoch, "Round timer cancelled");
                        }
                        break;
                    }
                    _ = seconds.tick() => {
                        match world.write().countdown(epoch) {
                            Countdown::Running(remaining) => {
                                debug!(epoch, remaining, "Time remaining");
                            }
                            Countdown::Finished => break,
                            Countdown::Stale => {
                                debug!(epoch, "Timer outlived its round");
                                break;
                            }
                        }
                    }
                }
            }
        });

        info!(epoch, "Round timer started");
        Self {
            epoch,
            cancel,
            handle,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}
