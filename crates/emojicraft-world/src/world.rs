//! Shared world state: grid, player, score and round timing.

use crate::grid::WorldGrid;
use crate::items::ItemLifecycleManager;
use crate::player::{Player, Pose};
use emojicraft_core::{Direction, GameConfig, Position, WorldSnapshot};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Everything a client needs to draw the world, read in one go
#[derive(Debug, Clone, Serialize)]
pub struct WorldView {
    pub grid: Vec<Vec<String>>,
    pub score: i64,
    #[serde(rename = "recentScoreGained")]
    pub recent_delta: i64,
    pub collected: bool,
    #[serde(rename = "gameActive")]
    pub active: bool,
    #[serde(rename = "timeRemaining")]
    pub remaining_secs: u32,
}

/// Result of a player-initiated move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    #[serde(rename = "playerX")]
    pub x: i32,
    #[serde(rename = "playerY")]
    pub y: i32,
    pub score: i64,
    #[serde(rename = "itemCollected")]
    pub collected: bool,
}

/// What one physics tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub fell: bool,
    pub collected: bool,
    pub delta: i64,
    pub expired: usize,
}

pub struct World {
    pub(crate) config: GameConfig,
    pub(crate) grid: WorldGrid,
    pub(crate) items: ItemLifecycleManager,
    pub(crate) player: Player,
    pub(crate) score: i64,
    pub(crate) recent_delta: i64,
    pub(crate) collected: bool,
    pub(crate) remaining_secs: u32,
    pub(crate) active: bool,
    pub(crate) epoch: u64,
}

impl World {
    /// A fresh, active round: ground, player at spawn and one item
    pub fn new(config: GameConfig) -> Self {
        let mut world = Self::empty(config);
        world.reset(Instant::now());
        world
    }

    fn empty(config: GameConfig) -> Self {
        let grid = WorldGrid::new(config.width, config.height);
        let items = ItemLifecycleManager::new(config.item_lifetime(), config.seed);
        let player = Player::new(config.spawn());
        let remaining_secs = config.round_duration_secs;

        Self {
            config,
            grid,
            items,
            player,
            score: 0,
            recent_delta: 0,
            collected: false,
            remaining_secs,
            active: false,
            epoch: 0,
        }
    }

    /// Rebuild a world from a saved snapshot. Every occupied saved cell comes back as a
    /// wall, except the player's own cell and the spawn cell.
    pub fn from_snapshot(config: GameConfig, snapshot: &WorldSnapshot) -> Self {
        let spawn = config.spawn();
        let mut world = Self::empty(config);
        let saved_player = Position::new(snapshot.player_x, snapshot.player_y);

        for pos in snapshot.occupied_cells() {
            if pos == saved_player || pos == spawn {
                continue;
            }
            if let Err(e) = world.grid.add_component(crate::grid::MapComponent::wall(pos)) {
                debug!(error = %e, "Skipping saved cell");
            }
        }
        world.grid.seed_ground();

        world.player.position = saved_player;
        world.ensure_player_in_bounds();
        world.score = snapshot.score;
        world.remaining_secs = snapshot.time_remaining;
        world.active = snapshot.time_remaining > 0;
        world.epoch = 1;

        if world.active {
            world.ensure_pending_item(Instant::now());
        }

        info!(
            player_x = world.player.position.x,
            player_y = world.player.position.y,
            score = world.score,
            time_remaining = world.remaining_secs,
            active = world.active,
            "World restored from snapshot"
        );

        world
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn grid(&self) -> &WorldGrid {
        &self.grid
    }

    /// Mutable grid access, mostly for setting up scenarios
    pub fn grid_mut(&mut self) -> &mut WorldGrid {
        &mut self.grid
    }

    pub fn items(&self) -> &ItemLifecycleManager {
        &self.items
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn recent_delta(&self) -> i64 {
        self.recent_delta
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Put the player back on the spawn cell if it ended up outside the playable area
    /// or inside a wall
    pub fn ensure_player_in_bounds(&mut self) -> bool {
        let pos = self.player.position;
        if self.grid.is_playable(pos) && !self.grid.is_wall(pos) {
            return false;
        }
        warn!(x = pos.x, y = pos.y, "Player out of bounds, resetting to spawn");
        self.player.reset(self.config.spawn());
        true
    }

    /// Spawn an item unless one is already pending
    pub fn ensure_pending_item(&mut self, now: Instant) {
        if self.grid.item_count() == 0 {
            self.items.spawn(&mut self.grid, self.player.position, now);
        }
    }

    /// Full reset for a new round: clears everything, reseeds ground, spawns the
    /// first item and activates the round. Bumps the epoch.
    pub fn reset(&mut self, now: Instant) {
        self.grid.clear();
        self.items.clear();
        self.grid.seed_ground();
        self.player.reset(self.config.spawn());
        self.score = 0;
        self.recent_delta = 0;
        self.collected = false;
        self.remaining_secs = self.config.round_duration_secs;
        self.active = true;
        self.epoch += 1;
        self.items.spawn(&mut self.grid, self.player.position, now);

        info!(epoch = self.epoch, "World reset");
    }

    /// Start a round on the current board without clearing score or walls
    pub fn begin_round(&mut self, duration_secs: u32, now: Instant) -> u64 {
        self.player.reset(self.config.spawn());
        self.grid.seed_ground();
        self.remaining_secs = duration_secs;
        self.active = true;
        self.epoch += 1;
        self.ensure_pending_item(now);
        self.epoch
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Move the player one cell. Leaving the playable area or walking into a wall is a
    /// logged no-op, as is any move while the round is over.
    pub fn move_player(&mut self, direction: Direction, now: Instant) -> MoveOutcome {
        self.collected = false;

        if !self.active {
            debug!(?direction, "Move ignored, round is not active");
            return self.move_outcome();
        }

        let target = self.player.position.step(direction);
        if !self.grid.is_playable(target) || self.grid.is_wall(target) {
            info!(
                ?direction,
                x = target.x,
                y = target.y,
                "Move blocked"
            );
            return self.move_outcome();
        }

        self.player.move_to(target, direction.into());
        self.check_collision(now);
        self.ensure_player_in_bounds();

        self.move_outcome()
    }

    fn move_outcome(&self) -> MoveOutcome {
        MoveOutcome {
            x: self.player.position.x,
            y: self.player.position.y,
            score: self.score,
            collected: self.collected,
        }
    }

    /// Pull the player one cell down if the cell below is playable and not a wall.
    ///
    /// Gravity keeps running after the round ends, so a falling player can still land
    /// on an item and change the score. No replacement item is spawned then.
    pub fn apply_gravity(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::default();
        let below = self.player.position.below();

        if self.grid.is_playable(below) && !self.grid.is_wall(below) {
            self.player.move_to(below, Pose::Falling);
            report.fell = true;

            let collision = self.check_collision(now);
            report.collected = collision.collected;
            report.delta = collision.delta;
            if collision.collected {
                debug!(delta = collision.delta, "Item collected by gravity");
            }
        }

        report
    }

    /// One physics tick: gravity (unless suppressed), then the item sweep
    pub fn tick(&mut self, gravity: bool, now: Instant) -> TickReport {
        let mut report = if gravity {
            self.apply_gravity(now)
        } else {
            TickReport::default()
        };

        report.expired = self
            .items
            .sweep(&mut self.grid, self.player.position, now, self.active);

        report
    }

    pub fn view(&self) -> WorldView {
        WorldView {
            grid: self.render(),
            score: self.score,
            recent_delta: self.recent_delta,
            collected: self.collected,
            active: self.active,
            remaining_secs: self.remaining_secs,
        }
    }

    pub fn render(&self) -> Vec<Vec<String>> {
        self.grid
            .render(Some((self.player.position, self.player.pose.symbol())))
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            player_x: self.player.position.x,
            player_y: self.player.position.y,
            score: self.score,
            grid: self.render(),
            time_remaining: self.remaining_secs,
            saved_at: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Item, MapComponent};
    use emojicraft_core::{ItemId, BLANK};
    use proptest::prelude::*;

    fn config() -> GameConfig {
        GameConfig {
            seed: Some(11),
            ..Default::default()
        }
    }

    fn clear_items(world: &mut World) {
        let items: Vec<(ItemId, Position)> = world.grid.items().map(|i| (i.id, i.position)).collect();
        for (id, pos) in items {
            world.grid.remove_item(id, pos);
            world.items.forget(id);
        }
    }

    fn place_item(world: &mut World, pos: Position, delta: i64) {
        world
            .grid
            .add_component(MapComponent::Item(Item {
                id: ItemId::new(),
                position: pos,
                symbol: format!("{:+}", delta),
                delta,
                created_at: Instant::now(),
            }))
            .unwrap();
    }

    #[test]
    fn test_fresh_world() {
        let world = World::new(config());
        assert!(world.is_active());
        assert_eq!(world.score(), 0);
        assert_eq!(world.remaining_secs(), 180);
        assert_eq!(world.player().position, Position::new(2, 5));
        assert_eq!(world.grid().item_count(), 1);
        assert_eq!(world.items().tracked_count(), 1);
        assert_eq!(world.epoch(), 1);
    }

    #[test]
    fn test_example_scenario() {
        let mut world = World::new(config());
        clear_items(&mut world);

        let outcome = world.move_player(Direction::Down, Instant::now());
        assert_eq!((outcome.x, outcome.y), (2, 6));
        assert!(!outcome.collected);

        place_item(&mut world, Position::new(2, 7), 10);
        let outcome = world.move_player(Direction::Down, Instant::now());
        assert_eq!((outcome.x, outcome.y), (2, 7));
        assert!(outcome.collected);
        assert_eq!(outcome.score, 10);
        assert_eq!(world.recent_delta(), 10);

        // A replacement item was spawned somewhere else
        assert_eq!(world.grid().item_count(), 1);
        let replacement = world.grid().items().next().unwrap();
        assert_ne!(replacement.position, Position::new(2, 7));
    }

    #[test]
    fn test_move_into_ground_is_noop() {
        let mut world = World::new(config());
        clear_items(&mut world);
        world.player.position = Position::new(0, 7);

        let outcome = world.move_player(Direction::Down, Instant::now());
        assert_eq!((outcome.x, outcome.y), (0, 7));

        let outcome = world.move_player(Direction::Left, Instant::now());
        assert_eq!((outcome.x, outcome.y), (0, 7));
    }

    #[test]
    fn test_move_ignored_when_inactive() {
        let mut world = World::new(config());
        world.deactivate();

        let outcome = world.move_player(Direction::Right, Instant::now());
        assert_eq!((outcome.x, outcome.y), (2, 5));
    }

    #[test]
    fn test_gravity_stops_above_ground() {
        let mut world = World::new(config());
        clear_items(&mut world);

        let mut falls = 0;
        for _ in 0..10 {
            if world.tick(true, Instant::now()).fell {
                falls += 1;
            }
        }

        assert_eq!(falls, 2);
        assert_eq!(world.player().position, Position::new(2, 7));
    }

    #[test]
    fn test_gravity_suppressed() {
        let mut world = World::new(config());
        let report = world.tick(false, Instant::now());
        assert!(!report.fell);
        assert_eq!(world.player().position, Position::new(2, 5));
    }

    #[test]
    fn test_gravity_collects() {
        let mut world = World::new(config());
        clear_items(&mut world);
        place_item(&mut world, Position::new(2, 6), -15);

        let report = world.tick(true, Instant::now());
        assert!(report.fell);
        assert!(report.collected);
        assert_eq!(report.delta, -15);
        assert_eq!(world.score(), -15);
    }

    #[test]
    fn test_reset_restores_round() {
        let mut world = World::new(config());
        world.score = 120;
        world.remaining_secs = 3;
        world.player.position = Position::new(10, 1);
        world.deactivate();

        world.reset(Instant::now());

        assert_eq!(world.score(), 0);
        assert_eq!(world.remaining_secs(), 180);
        assert_eq!(world.player().position, Position::new(2, 5));
        assert_eq!(world.grid().item_count(), 1);
        assert!(world.is_active());
        assert_eq!(world.epoch(), 2);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut world = World::new(config());
        clear_items(&mut world);
        place_item(&mut world, Position::new(10, 2), 5);
        world.score = 35;
        world.remaining_secs = 17;
        world.player.position = Position::new(4, 3);
        let snapshot = world.snapshot();

        let restored = World::from_snapshot(config(), &snapshot);
        assert_eq!(restored.player().position, Position::new(4, 3));
        assert_eq!(restored.score(), 35);
        assert_eq!(restored.remaining_secs(), 17);
        assert!(restored.is_active());

        // The old item cell is now a wall and the player's cell is free
        assert!(restored.grid().is_wall(Position::new(10, 2)));
        assert!(restored.grid().is_cell_empty(Position::new(4, 3)));
        // A new pending item replaces the one lost to the conversion
        assert_eq!(restored.grid().item_count(), 1);
    }

    #[test]
    fn test_restore_out_of_bounds_player() {
        let snapshot = WorldSnapshot {
            player_x: 40,
            player_y: 9,
            score: 0,
            grid: Vec::new(),
            time_remaining: 0,
            saved_at: 0,
        };

        let restored = World::from_snapshot(config(), &snapshot);
        assert_eq!(restored.player().position, Position::new(2, 5));
        assert!(!restored.is_active());
        assert_eq!(restored.grid().item_count(), 0);
        // Ground is reseeded even without a saved grid
        assert!(restored.grid().is_wall(Position::new(0, 9)));
    }

    #[test]
    fn test_restored_item_on_spawn_does_not_trap_player() {
        let mut grid = vec![vec![BLANK.to_string(); 24]; 10];
        grid[5][2] = "🙂".to_string();
        grid[3][6] = "👻".to_string();
        let snapshot = WorldSnapshot {
            player_x: 4,
            player_y: 3,
            score: 15,
            grid,
            time_remaining: 0,
            saved_at: 0,
        };

        let mut world = World::from_snapshot(config(), &snapshot);
        assert!(!world.grid().is_wall(Position::new(2, 5)));
        assert!(world.grid().is_wall(Position::new(6, 3)));

        world.begin_round(10, Instant::now());
        let spawn = world.player().position;
        assert_eq!(spawn, Position::new(2, 5));
        assert!(!world.grid().is_wall(spawn));
    }

    #[test]
    fn test_player_inside_wall_goes_back_to_spawn() {
        let mut world = World::new(config());
        clear_items(&mut world);
        world.grid.add_component(MapComponent::wall(Position::new(6, 3))).unwrap();
        world.player.position = Position::new(6, 3);

        assert!(world.ensure_player_in_bounds());
        assert_eq!(world.player().position, Position::new(2, 5));
        assert!(!world.ensure_player_in_bounds());
    }

    #[test]
    fn test_gravity_scores_after_round_end() {
        let mut world = World::new(config());
        clear_items(&mut world);
        place_item(&mut world, Position::new(2, 6), 20);
        world.deactivate();

        let report = world.tick(true, Instant::now());
        assert!(report.collected);
        assert_eq!(world.score(), 20);
        assert_eq!(world.grid().item_count(), 0);
    }

    fn direction() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::Up),
            Just(Direction::Down),
            Just(Direction::Left),
            Just(Direction::Right),
        ]
    }

    proptest! {
        #[test]
        fn prop_player_stays_in_bounds(moves in proptest::collection::vec((direction(), any::<bool>()), 0..200)) {
            let mut world = World::new(config());
            for (direction, tick) in moves {
                let outcome = world.move_player(direction, Instant::now());
                prop_assert!(outcome.x >= 0 && outcome.x < 24);
                prop_assert!(outcome.y >= 0 && outcome.y <= 7);
                if tick {
                    world.tick(true, Instant::now());
                }
                let pos = world.player().position;
                prop_assert!(world.grid().is_playable(pos));
            }
        }
    }
}
