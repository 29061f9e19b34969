//! Fixed-interval physics loop: gravity plus the item sweep.

use crate::gate::ManualMovementGate;
use crate::world::{TickReport, World};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Run a single tick against the shared world. Gravity is skipped while the gate is
/// closed; the sweep always runs, after gravity.
pub fn run_tick(world: &RwLock<World>, gate: &ManualMovementGate) -> TickReport {
    let mut world = world.write();
    let gravity = gate.is_open();
    if !gravity {
        trace!("Gravity skipped, manual move in progress");
    }
    world.tick(gravity, Instant::now())
}

enum TickerState {
    Stopped,
    Running {
        cancel: CancellationToken,
        handle: JoinHandle<()>,
    },
}

pub struct PhysicsTicker {
    period: Duration,
    state: TickerState,
}

impl PhysicsTicker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            state: TickerState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        match &self.state {
            TickerState::Stopped => false,
            TickerState::Running { cancel, handle } => !cancel.is_cancelled() && !handle.is_finished(),
        }
    }

    /// Spawn the tick loop on the current tokio runtime. No-op when already running.
    pub fn start(&mut self, world: Arc<RwLock<World>>, gate: Arc<ManualMovementGate>) {
        if self.is_running() {
            return;
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let period = self.period;

        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticks.tick() => {
                        let report = run_tick(&world, &gate);
                        if report.collected || report.expired > 0 {
                            debug!(
                                fell = report.fell,
                                collected = report.collected,
                                delta = report.delta,
                                expired = report.expired,
                                "Physics tick"
                            );
                        }
                    }
                }
            }

            debug!("Physics loop exited");
        });

        info!(period_ms = period.as_millis() as u64, "Physics ticker started");
        self.state = TickerState::Running { cancel, handle };
    }

    /// Ask the loop to finish. A tick already in progress completes first.
    pub fn stop(&mut self) {
        if let TickerState::Running { cancel, .. } = std::mem::replace(&mut self.state, TickerState::Stopped) {
            cancel.cancel();
            info!("Physics ticker stopped");
        }
    }
}

impl Drop for PhysicsTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
