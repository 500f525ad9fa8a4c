//! Tile map - terrain types, resources and building footprints.
//!
//! The map is a row-major grid of tiles. Terrain behaviour (passability,
//! movement cost, whether a tile is always occupied) lives in a single lookup
//! table on `TileType`, so consumers never branch on individual types.

use crate::error::SimError;
use crate::geometry::TileCoord;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Terrain type of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileType {
    /// Open ground.
    #[default]
    Land,
    /// Paved road, cheaper to traverse than land.
    Street,
    /// Impassable water.
    Water,
    /// Impassable rock.
    Rock,
}

/// Per-type terrain behaviour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileTraits {
    /// Ground units may enter the tile.
    pub passable: bool,
    /// Cost of entering the tile with an orthogonal step.
    pub base_cost: f32,
    /// The tile counts as occupied regardless of what stands on it.
    pub occupies: bool,
}

const LAND: TileTraits = TileTraits { passable: true, base_cost: 1.0, occupies: false };
const STREET: TileTraits = TileTraits { passable: true, base_cost: 0.5, occupies: false };
const BLOCKED: TileTraits = TileTraits { passable: false, base_cost: f32::INFINITY, occupies: true };

/// Cheapest `base_cost` of any passable tile type. Scales the A* heuristic.
pub const MIN_TILE_COST: f32 = 0.5;

impl TileType {
    pub fn traits(self) -> TileTraits {
        match self {
            TileType::Land => LAND,
            TileType::Street => STREET,
            TileType::Water | TileType::Rock => BLOCKED,
        }
    }

    pub fn is_passable(self) -> bool {
        self.traits().passable
    }

    pub fn base_cost(self) -> f32 {
        self.traits().base_cost
    }
}

/// A single map tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MapTile {
    #[serde(rename = "type")]
    pub tile_type: TileType,
    /// Harvestable ore lies on this tile.
    #[serde(default)]
    pub ore: bool,
    /// A seed crystal stands on this tile.
    #[serde(default, rename = "seedCrystal")]
    pub seed_crystal: bool,
    /// Id of the building whose footprint covers this tile.
    #[serde(default)]
    pub building: Option<u32>,
}

impl MapTile {
    pub fn new(tile_type: TileType) -> Self {
        Self { tile_type, ..Default::default() }
    }

    /// Whether a ground unit may ever stand here (ignores units and wrecks).
    pub fn is_walkable(&self) -> bool {
        self.tile_type.is_passable() && self.building.is_none()
    }
}

/// The tile grid of the running map.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapGrid {
    /// Width of the map in tiles.
    pub width: usize,
    /// Height of the map in tiles.
    pub height: usize,
    /// Tiles in row-major order.
    pub tiles: Vec<MapTile>,
}

impl MapGrid {
    /// Create a map filled with a single tile type.
    pub fn filled(width: usize, height: usize, tile_type: TileType) -> Self {
        Self {
            width,
            height,
            tiles: vec![MapTile::new(tile_type); width * height],
        }
    }

    /// Parse a map from text rows.
    ///
    /// `.` land, `=` street, `~` water, `#` rock, `o` ore on land,
    /// `*` seed crystal on land. Blank lines and surrounding whitespace are
    /// ignored.
    pub fn from_ascii(text: &str) -> Result<Self, SimError> {
        let rows: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        let height = rows.len();
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);

        let mut tiles = Vec::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            let row_width = row.chars().count();
            if row_width != width {
                return Err(SimError::InvalidMap(format!(
                    "row {y} has {row_width} tiles, expected {width}"
                )));
            }
            for c in row.chars() {
                let tile = match c {
                    '.' => MapTile::new(TileType::Land),
                    '=' => MapTile::new(TileType::Street),
                    '~' => MapTile::new(TileType::Water),
                    '#' => MapTile::new(TileType::Rock),
                    'o' => MapTile { ore: true, ..MapTile::new(TileType::Land) },
                    '*' => MapTile { seed_crystal: true, ..MapTile::new(TileType::Land) },
                    other => return Err(SimError::UnknownTile(other)),
                };
                tiles.push(tile);
            }
        }

        Ok(Self { width, height, tiles })
    }

    /// Parse a map from JSON and check its dimensions.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let grid: MapGrid = serde_json::from_str(json)?;
        grid.validate()?;
        Ok(grid)
    }

    /// Check that the tile vector matches the declared dimensions.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.tiles.len() != self.width * self.height {
            return Err(SimError::InvalidMap(format!(
                "{} tiles for a {}x{} map",
                self.tiles.len(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.tiles.is_empty()
    }

    #[inline]
    pub fn in_bounds(&self, tile: TileCoord) -> bool {
        tile.x >= 0 && tile.y >= 0 && (tile.x as usize) < self.width && (tile.y as usize) < self.height
    }

    #[inline]
    fn index(&self, tile: TileCoord) -> Option<usize> {
        if self.in_bounds(tile) {
            Some(tile.y as usize * self.width + tile.x as usize)
        } else {
            None
        }
    }

    pub fn get(&self, tile: TileCoord) -> Option<&MapTile> {
        self.index(tile).and_then(|i| self.tiles.get(i))
    }

    pub fn get_mut(&mut self, tile: TileCoord) -> Option<&mut MapTile> {
        self.index(tile).and_then(|i| self.tiles.get_mut(i))
    }

    /// Set the terrain type of a tile. Out-of-range tiles are ignored.
    pub fn set_type(&mut self, tile: TileCoord, tile_type: TileType) {
        if let Some(t) = self.get_mut(tile) {
            t.tile_type = tile_type;
        }
    }

    /// Map extent in pixels.
    pub fn pixel_size(&self) -> (f32, f32) {
        (
            self.width as f32 * crate::geometry::TILE_SIZE,
            self.height as f32 * crate::geometry::TILE_SIZE,
        )
    }

    /// Stamp a building footprint onto the map. Tiles outside the map are skipped.
    pub fn place_building(&mut self, id: u32, origin: TileCoord, width: u32, height: u32) {
        for dy in 0..height as i32 {
            for dx in 0..width as i32 {
                if let Some(t) = self.get_mut(TileCoord::new(origin.x + dx, origin.y + dy)) {
                    t.building = Some(id);
                }
            }
        }
    }

    /// Remove every tile reference to a building.
    pub fn clear_building(&mut self, id: u32) {
        for t in &mut self.tiles {
            if t.building == Some(id) {
                t.building = None;
            }
        }
    }

    /// A demo battlefield: a street cross, a lake, rock ridges and ore fields.
    pub fn new_with_features(width: usize, height: usize) -> Self {
        let mut grid = Self::filled(width, height, TileType::Land);
        let (w, h) = (width as i32, height as i32);

        for x in 0..w {
            grid.set_type(TileCoord::new(x, h / 2), TileType::Street);
        }
        for y in 0..h {
            grid.set_type(TileCoord::new(w / 2, y), TileType::Street);
        }

        grid.add_patch(TileCoord::new(w / 4, h / 4), (w / 10).max(1), TileType::Water);
        for i in 0..(h / 3) {
            grid.set_type(TileCoord::new(3 * w / 4, h / 8 + i), TileType::Rock);
        }

        let ore_center = TileCoord::new(w / 4, 3 * h / 4);
        let radius = (w / 12).max(1);
        for y in -radius..=radius {
            for x in -radius..=radius {
                if x * x + y * y <= radius * radius {
                    if let Some(t) = grid.get_mut(TileCoord::new(ore_center.x + x, ore_center.y + y)) {
                        if t.tile_type == TileType::Land {
                            t.ore = true;
                        }
                    }
                }
            }
        }
        if let Some(t) = grid.get_mut(ore_center) {
            t.seed_crystal = true;
        }

        grid
    }

    fn add_patch(&mut self, center: TileCoord, radius: i32, tile_type: TileType) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    self.set_type(TileCoord::new(center.x + dx, center.y + dy), tile_type);
                }
            }
        }
    }
}
