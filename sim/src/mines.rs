//! Land mine lookup used by the pathfinder.

use crate::geometry::TileCoord;
use bevy_ecs::prelude::*;
use std::collections::HashMap;

/// Where mines are and who laid them.
pub trait MineLookup {
    /// Owner of the mine on `tile`, if any.
    fn mine_owner_at(&self, tile: TileCoord) -> Option<u8>;

    /// Whether `tile` holds a mine laid by `owner`.
    fn is_friendly_mine(&self, tile: TileCoord, owner: u8) -> bool {
        self.mine_owner_at(tile) == Some(owner)
    }
}

/// Mines currently on the map.
#[derive(Resource, Debug, Clone, Default)]
pub struct MineField {
    mines: HashMap<TileCoord, u8>,
}

impl MineField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lay a mine, replacing any mine already on the tile.
    pub fn place(&mut self, tile: TileCoord, owner: u8) {
        self.mines.insert(tile, owner);
    }

    /// Remove the mine on `tile`, returning its owner.
    pub fn remove(&mut self, tile: TileCoord) -> Option<u8> {
        self.mines.remove(&tile)
    }

    pub fn len(&self) -> usize {
        self.mines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mines.is_empty()
    }
}

impl MineLookup for MineField {
    fn mine_owner_at(&self, tile: TileCoord) -> Option<u8> {
        self.mines.get(&tile).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_and_lookup() {
        let mut field = MineField::new();
        let tile = TileCoord::new(3, 4);
        field.place(tile, 1);
        assert_eq!(field.mine_owner_at(tile), Some(1));
        assert!(field.is_friendly_mine(tile, 1));
        assert!(!field.is_friendly_mine(tile, 2));
        assert!(!field.is_friendly_mine(TileCoord::new(0, 0), 1));

        assert_eq!(field.remove(tile), Some(1));
        assert!(field.is_empty());
    }
}
