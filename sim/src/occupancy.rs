//! Per-tile occupancy counters.
//!
//! Each cell counts what currently claims the tile: impassable terrain,
//! building footprints, seed crystals, wrecks and living ground units. A tile
//! is free iff its count is zero. The grid is rebuilt from scratch every tick
//! and then nudged incrementally as units change tiles.

use crate::geometry::TileCoord;
use crate::records::{TickUnits, UnitRecord, WreckRecord};
use crate::terrain::MapGrid;
use bevy_ecs::prelude::*;

/// Options for `OccupancyGrid::remove_unit_occupancy`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveOccupancyOptions {
    /// Remove the unit's claim even if it is currently airborne.
    pub ignore_flight_state: bool,
}

/// Counter grid sized to the map in tiles.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupancyGrid {
    width: usize,
    height: usize,
    cells: Vec<u16>,
}

impl OccupancyGrid {
    /// An all-free grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    /// Build the grid for this tick. Returns `None` for an empty map.
    ///
    /// Building tiles are counted through the map, so unit records carrying
    /// a footprint are skipped. Airborne units claim nothing; grounded air
    /// units count like ground units.
    pub fn build<'a>(
        map: &MapGrid,
        units: impl IntoIterator<Item = &'a UnitRecord>,
        wrecks: impl IntoIterator<Item = &'a WreckRecord>,
    ) -> Option<Self> {
        if map.is_empty() {
            return None;
        }

        let mut grid = Self::new(map.width, map.height);
        for (cell, tile) in grid.cells.iter_mut().zip(&map.tiles) {
            if tile.tile_type.traits().occupies {
                *cell += 1;
            }
            if tile.building.is_some() {
                *cell += 1;
            }
            if tile.seed_crystal {
                *cell += 1;
            }
        }

        for unit in units {
            if !unit.is_alive() || unit.footprint.is_some() || unit.is_airborne() {
                continue;
            }
            grid.increment(unit.tile());
        }

        for wreck in wrecks {
            grid.increment(wreck.tile());
        }

        Some(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, tile: TileCoord) -> Option<usize> {
        if tile.x >= 0 && tile.y >= 0 && (tile.x as usize) < self.width && (tile.y as usize) < self.height {
            Some(tile.y as usize * self.width + tile.x as usize)
        } else {
            None
        }
    }

    /// Count at a tile, `None` outside the grid.
    pub fn get(&self, tile: TileCoord) -> Option<u16> {
        self.index(tile).map(|i| self.cells[i])
    }

    /// Whether nothing claims the tile. Tiles outside the grid are never free.
    #[inline]
    pub fn is_free(&self, tile: TileCoord) -> bool {
        self.get(tile) == Some(0)
    }

    /// Add one claim. Out-of-range tiles are ignored.
    pub fn increment(&mut self, tile: TileCoord) {
        if let Some(i) = self.index(tile) {
            self.cells[i] = self.cells[i].saturating_add(1);
        }
    }

    /// Drop one claim, never below zero. Out-of-range tiles are ignored.
    pub fn decrement(&mut self, tile: TileCoord) {
        if let Some(i) = self.index(tile) {
            self.cells[i] = self.cells[i].saturating_sub(1);
        }
    }

    /// Move a unit's claim from `prev` to the tile it stands on now.
    ///
    /// Airborne units are skipped entirely.
    pub fn update_unit_occupancy(&mut self, unit: &UnitRecord, prev: TileCoord) {
        if unit.is_airborne() {
            return;
        }
        self.decrement(prev);
        self.increment(unit.tile());
    }

    /// Remove a unit's claim from the tile it stands on, e.g. on death.
    pub fn remove_unit_occupancy(&mut self, unit: &UnitRecord, options: RemoveOccupancyOptions) {
        if unit.is_airborne() && !options.ignore_flight_state {
            return;
        }
        self.decrement(unit.tile());
    }

    /// Closest free tile to `center`, searching square rings out to
    /// `max_radius`. Within a ring, tiles are visited in row-major order.
    pub fn nearest_free_tile(&self, center: TileCoord, max_radius: i32) -> Option<TileCoord> {
        for radius in 0..=max_radius.max(0) {
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    if dx.abs() != radius && dy.abs() != radius {
                        continue;
                    }
                    let tile = TileCoord::new(center.x + dx, center.y + dy);
                    if self.is_free(tile) {
                        return Some(tile);
                    }
                }
            }
        }
        None
    }

    /// Number of claimed tiles.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c > 0).count()
    }
}

/// System that rebuilds the occupancy grid from this tick's records.
///
/// An empty map leaves a zero-sized grid on which no tile is free.
pub fn occupancy_rebuild_system(
    map: Res<MapGrid>,
    units: Res<TickUnits>,
    mut occupancy: ResMut<OccupancyGrid>,
) {
    *occupancy = OccupancyGrid::build(&map, &units.units, &units.wrecks).unwrap_or_default();
    tracing::debug!(occupied = occupancy.occupied_count(), "occupancy grid rebuilt");
}
