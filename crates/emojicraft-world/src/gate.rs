//! Signal that keeps gravity out of the way while a player move is in flight.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Closed while at least one manual move is in progress
#[derive(Debug, Default)]
pub struct ManualMovementGate {
    in_flight: AtomicUsize,
}

impl ManualMovementGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) == 0
    }

    /// Close the gate until the returned guard is dropped
    pub fn close(&self) -> GateGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        GateGuard { gate: self }
    }
}

/// Reopens the gate on drop, whichever way the move handler exits
#[must_use = "the gate reopens as soon as the guard is dropped"]
pub struct GateGuard<'a> {
    gate: &'a ManualMovementGate,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}
