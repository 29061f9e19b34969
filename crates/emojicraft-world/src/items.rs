//! Item spawning and expiry.

use crate::grid::{Item, MapComponent, WorldGrid};
use emojicraft_core::{ItemId, Polarity, Position};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

pub const POSITIVE_ITEMS: [(&str, i64); 5] = [
    ("🙂", 5),
    ("😄", 10),
    ("😁", 20),
    ("😍", 25),
    ("🤑", 50),
];

pub const NEGATIVE_ITEMS: [(&str, i64); 5] = [
    ("💩", -5),
    ("👺", -15),
    ("👽", -20),
    ("👻", -25),
    ("☠️", -50),
];

struct Tracked {
    position: Position,
    created_at: Instant,
}

/// Spawns items with alternating polarity and expires the ones nobody picked up
pub struct ItemLifecycleManager {
    tracked: HashMap<ItemId, Tracked>,
    next_polarity: Polarity,
    lifetime: Duration,
    rng: ChaCha8Rng,
}

impl ItemLifecycleManager {
    pub fn new(lifetime: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Self {
            tracked: HashMap::new(),
            next_polarity: Polarity::Positive,
            lifetime,
            rng,
        }
    }

    pub fn next_polarity(&self) -> Polarity {
        self.next_polarity
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_tracked(&self, id: ItemId) -> bool {
        self.tracked.contains_key(&id)
    }

    /// Place a new item on a random free playable cell. Returns `None` when the
    /// playable area has no free cell left.
    pub fn spawn(&mut self, grid: &mut WorldGrid, player: Position, now: Instant) -> Option<Item> {
        if grid.free_cells(player) == 0 {
            debug!("No free cell for a new item");
            return None;
        }

        let position = loop {
            let candidate = Position::new(
                self.rng.gen_range(0..grid.width),
                self.rng.gen_range(0..grid.playable_height()),
            );
            if candidate != player && grid.is_cell_empty(candidate) {
                break candidate;
            }
            trace!(x = candidate.x, y = candidate.y, "Spawn cell taken, retrying");
        };

        let table = match self.next_polarity {
            Polarity::Positive => &POSITIVE_ITEMS,
            Polarity::Negative => &NEGATIVE_ITEMS,
        };
        let (symbol, delta) = table[self.rng.gen_range(0..table.len())];
        self.next_polarity = self.next_polarity.flipped();

        let item = Item {
            id: ItemId::new(),
            position,
            symbol: symbol.to_string(),
            delta,
            created_at: now,
        };

        if let Err(e) = grid.add_component(MapComponent::Item(item.clone())) {
            // Free cell was just checked under the same borrow
            debug!(error = %e, "Failed to place item");
            return None;
        }

        self.tracked.insert(
            item.id,
            Tracked {
                position,
                created_at: now,
            },
        );

        debug!(
            item_id = %item.id,
            symbol = %item.symbol,
            delta = item.delta,
            x = position.x,
            y = position.y,
            "Item spawned"
        );

        Some(item)
    }

    /// Remove items older than the lifetime. When `active`, each expired item gets
    /// exactly one replacement. Returns how many items expired.
    pub fn sweep(&mut self, grid: &mut WorldGrid, player: Position, now: Instant, active: bool) -> usize {
        let expired: Vec<ItemId> = self
            .tracked
            .iter()
            .filter(|(_, t)| now.saturating_duration_since(t.created_at) > self.lifetime)
            .map(|(id, _)| *id)
            .collect();

        for id in &expired {
            if let Some(tracked) = self.tracked.remove(id) {
                if let Some(item) = grid.remove_item(*id, tracked.position) {
                    debug!(item_id = %id, symbol = %item.symbol, "Item expired");
                }
            }
        }

        if active {
            for _ in 0..expired.len() {
                self.spawn(grid, player, now);
            }
        }

        expired.len()
    }

    /// Stop tracking an item that left the grid some other way (collected)
    pub fn forget(&mut self, id: ItemId) {
        self.tracked.remove(&id);
    }

    pub fn clear(&mut self) {
        self.tracked.clear();
    }
}
