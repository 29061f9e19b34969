//! Player/item collision and scoring.

use crate::grid::MapComponent;
use crate::world::World;
use tokio::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Collision {
    pub collected: bool,
    pub delta: i64,
}

impl World {
    /// Collect the item under the player, if any. Runs with the world exclusively
    /// borrowed, so an item can only ever be credited once.
    pub fn check_collision(&mut self, now: Instant) -> Collision {
        let pos = self.player.position;
        if !matches!(self.grid.component_at(pos), Some(MapComponent::Item(_))) {
            return Collision::default();
        }

        let item = match self.grid.remove_component(pos) {
            Some(MapComponent::Item(item)) => item,
            _ => return Collision::default(),
        };

        self.items.forget(item.id);
        self.score += item.delta;
        self.recent_delta = item.delta;
        self.collected = true;

        info!(
            item_id = %item.id,
            symbol = %item.symbol,
            delta = item.delta,
            score = self.score,
            x = pos.x,
            y = pos.y,
            "Item collected"
        );

        if self.active {
            self.items.spawn(&mut self.grid, pos, now);
        }

        Collision {
            collected: true,
            delta: item.delta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Item;
    use emojicraft_core::{GameConfig, ItemId, Position};

    fn world_with_item_under_player(delta: i64) -> World {
        let mut world = World::new(GameConfig {
            seed: Some(5),
            ..Default::default()
        });
        let existing: Vec<_> = world.grid().items().map(|i| (i.id, i.position)).collect();
        for (id, pos) in existing {
            world.grid_mut().remove_item(id, pos);
            world.items.forget(id);
        }

        let pos = world.player().position;
        world
            .grid_mut()
            .add_component(MapComponent::Item(Item {
                id: ItemId::new(),
                position: pos,
                symbol: "😄".to_string(),
                delta,
                created_at: Instant::now(),
            }))
            .unwrap();
        world
    }

    #[test]
    fn test_collects_once() {
        let mut world = world_with_item_under_player(10);

        let first = world.check_collision(Instant::now());
        assert!(first.collected);
        assert_eq!(first.delta, 10);
        assert_eq!(world.score(), 10);

        let second = world.check_collision(Instant::now());
        assert!(!second.collected);
        assert_eq!(second.delta, 0);
        assert_eq!(world.score(), 10);
    }

    #[test]
    fn test_replacement_spawned_elsewhere() {
        let mut world = world_with_item_under_player(-25);
        world.check_collision(Instant::now());

        assert_eq!(world.score(), -25);
        assert_eq!(world.recent_delta(), -25);
        assert_eq!(world.grid().item_count(), 1);
        assert_eq!(world.items().tracked_count(), 1);
        let replacement = world.grid().items().next().unwrap();
        assert_ne!(replacement.position, world.player().position);
    }

    #[test]
    fn test_no_replacement_after_round_end() {
        let mut world = world_with_item_under_player(5);
        world.deactivate();

        assert!(world.check_collision(Instant::now()).collected);
        assert_eq!(world.grid().item_count(), 0);
    }

    #[test]
    fn test_wall_is_not_collected() {
        let mut world = world_with_item_under_player(5);
        world.check_collision(Instant::now());
        world.player.position = Position::new(0, 8);

        let collision = world.check_collision(Instant::now());
        assert!(!collision.collected);
        assert!(world.grid().is_wall(Position::new(0, 8)));
    }
}
