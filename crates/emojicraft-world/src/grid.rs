//! Bounded 2D grid holding walls and items.

use emojicraft_core::{Error, ItemId, Position, Result, BLANK, GROUND_ROWS};
use std::collections::HashMap;
use tokio::time::Instant;

pub const WALL_SYMBOL: &str = "🧱";

/// A collectible item on the grid
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub position: Position,
    pub symbol: String,
    pub delta: i64,
    pub created_at: Instant,
}

/// Anything that can occupy a grid cell
#[derive(Debug, Clone, PartialEq)]
pub enum MapComponent {
    Wall { position: Position },
    Item(Item),
}

impl MapComponent {
    pub fn wall(position: Position) -> Self {
        MapComponent::Wall { position }
    }

    pub fn position(&self) -> Position {
        match self {
            MapComponent::Wall { position } => *position,
            MapComponent::Item(item) => item.position,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            MapComponent::Wall { .. } => WALL_SYMBOL,
            MapComponent::Item(item) => &item.symbol,
        }
    }

    pub fn as_item(&self) -> Option<&Item> {
        match self {
            MapComponent::Item(item) => Some(item),
            MapComponent::Wall { .. } => None,
        }
    }
}

/// The world's components keyed by cell, so no two can share a cell
#[derive(Debug, Clone)]
pub struct WorldGrid {
    pub width: i32,
    pub height: i32,
    components: HashMap<Position, MapComponent>,
}

impl WorldGrid {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            components: HashMap::new(),
        }
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// Inside the grid and above the ground rows
    pub fn is_playable(&self, pos: Position) -> bool {
        self.in_bounds(pos) && pos.y < self.playable_height()
    }

    pub fn playable_height(&self) -> i32 {
        self.height - GROUND_ROWS
    }

    pub fn is_cell_empty(&self, pos: Position) -> bool {
        !self.components.contains_key(&pos)
    }

    pub fn is_wall(&self, pos: Position) -> bool {
        matches!(self.components.get(&pos), Some(MapComponent::Wall { .. }))
    }

    pub fn component_at(&self, pos: Position) -> Option<&MapComponent> {
        self.components.get(&pos)
    }

    /// Place a component. Out-of-bounds and occupied cells are rejected, never clamped.
    pub fn add_component(&mut self, component: MapComponent) -> Result<()> {
        let pos = component.position();
        if !self.in_bounds(pos) {
            return Err(Error::OutOfBounds(pos));
        }
        if self.components.contains_key(&pos) {
            return Err(Error::Occupied(pos));
        }
        self.components.insert(pos, component);
        Ok(())
    }

    pub fn remove_component(&mut self, pos: Position) -> Option<MapComponent> {
        self.components.remove(&pos)
    }

    /// Remove the item with `id` if it is still where it was placed
    pub fn remove_item(&mut self, id: ItemId, pos: Position) -> Option<Item> {
        match self.components.get(&pos) {
            Some(MapComponent::Item(item)) if item.id == id => {}
            _ => return None,
        }
        match self.components.remove(&pos) {
            Some(MapComponent::Item(item)) => Some(item),
            _ => None,
        }
    }

    /// Fill the ground rows with walls. Cells that already hold a wall are kept.
    pub fn seed_ground(&mut self) {
        for y in self.playable_height().max(0)..self.height {
            for x in 0..self.width {
                let pos = Position::new(x, y);
                if !self.is_wall(pos) {
                    self.components.insert(pos, MapComponent::wall(pos));
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.components.clear();
    }

    pub fn components(&self) -> impl Iterator<Item = &MapComponent> + '_ {
        self.components.values()
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.components.values().filter_map(MapComponent::as_item)
    }

    pub fn item_count(&self) -> usize {
        self.items().count()
    }

    /// Playable cells with no component, excluding `exclude` (usually the player's cell)
    pub fn free_cells(&self, exclude: Position) -> usize {
        let mut count = 0;
        for y in 0..self.playable_height() {
            for x in 0..self.width {
                let pos = Position::new(x, y);
                if pos != exclude && self.is_cell_empty(pos) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Symbols row by row: blanks, then components, then `overlay` (the player) on top
    pub fn render(&self, overlay: Option<(Position, &str)>) -> Vec<Vec<String>> {
        let mut grid = vec![vec![BLANK.to_string(); self.width.max(0) as usize]; self.height.max(0) as usize];

        for component in self.components.values() {
            let pos = component.position();
            grid[pos.y as usize][pos.x as usize] = component.symbol().to_string();
        }

        if let Some((pos, symbol)) = overlay {
            if self.in_bounds(pos) {
                grid[pos.y as usize][pos.x as usize] = symbol.to_string();
            }
        }

        grid
    }
}
