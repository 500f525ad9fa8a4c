//! Flat per-tick records handed to the spatial core.
//!
//! The simulation gathers these from components once per tick; the quadtree
//! and occupancy grid are rebuilt from them and never see ECS types.

use crate::components::{Flight, FlightState, Footprint, Health, Owner, Position, UnitId, UnitKind};
use crate::geometry::{TileCoord, TILE_SIZE};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Snapshot of one unit or building for this tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub id: u32,
    pub owner: u8,
    pub kind: UnitKind,
    /// Top-left pixel position.
    pub x: f32,
    pub y: f32,
    pub health: f32,
    pub max_health: f32,
    pub is_air_unit: bool,
    pub flight_state: FlightState,
    /// Building footprint in tiles; `None` for tile-sized mobile units.
    pub footprint: Option<(u32, u32)>,
}

impl UnitRecord {
    /// A full-health ground unit standing on `tile`.
    pub fn ground(id: u32, owner: u8, tile: TileCoord) -> Self {
        let (x, y) = tile.to_pixel();
        Self {
            id,
            owner,
            kind: UnitKind::Tank,
            x,
            y,
            health: 100.0,
            max_health: 100.0,
            is_air_unit: false,
            flight_state: FlightState::Grounded,
            footprint: None,
        }
    }

    /// An air unit on `tile` in the given flight state.
    pub fn air(id: u32, owner: u8, tile: TileCoord, flight_state: FlightState) -> Self {
        Self {
            kind: UnitKind::Helicopter,
            is_air_unit: true,
            flight_state,
            ..Self::ground(id, owner, tile)
        }
    }

    /// Gather a record from an entity's components.
    pub fn from_components(
        id: &UnitId,
        owner: &Owner,
        kind: &UnitKind,
        position: &Position,
        health: &Health,
        flight: Option<&Flight>,
        footprint: Option<&Footprint>,
    ) -> Self {
        Self {
            id: id.0,
            owner: owner.0,
            kind: *kind,
            x: position.x,
            y: position.y,
            health: health.current,
            max_health: health.max,
            is_air_unit: kind.is_air_unit(),
            flight_state: flight.map(|f| f.state).unwrap_or_default(),
            footprint: footprint.map(|f| (f.width, f.height)),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// In the air right now. Grounded air units count as ground units.
    pub fn is_airborne(&self) -> bool {
        self.is_air_unit && !self.flight_state.is_grounded()
    }

    /// World-space center: half a tile in for units, half the footprint for buildings.
    pub fn center(&self) -> (f32, f32) {
        match self.footprint {
            Some((w, h)) => (
                self.x + w as f32 * TILE_SIZE / 2.0,
                self.y + h as f32 * TILE_SIZE / 2.0,
            ),
            None => (self.x + TILE_SIZE / 2.0, self.y + TILE_SIZE / 2.0),
        }
    }

    /// Tile under the record's center.
    pub fn tile(&self) -> TileCoord {
        let (cx, cy) = self.center();
        TileCoord::from_pixel(cx, cy)
    }
}

/// A unit wreck lying on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WreckRecord {
    /// Top-left pixel position.
    pub x: f32,
    pub y: f32,
}

impl WreckRecord {
    pub fn at_tile(tile: TileCoord) -> Self {
        let (x, y) = tile.to_pixel();
        Self { x, y }
    }

    pub fn tile(&self) -> TileCoord {
        TileCoord::from_pixel_center(self.x, self.y)
    }
}

/// The unit and wreck lists gathered for the current tick.
#[derive(Resource, Debug, Clone, Default)]
pub struct TickUnits {
    pub units: Vec<UnitRecord>,
    pub wrecks: Vec<WreckRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_for_units_and_buildings() {
        let unit = UnitRecord::ground(1, 0, TileCoord::new(2, 3));
        assert_eq!(unit.center(), (80.0, 112.0));
        assert_eq!(unit.tile(), TileCoord::new(2, 3));

        let building = UnitRecord {
            footprint: Some((3, 2)),
            ..UnitRecord::ground(2, 0, TileCoord::new(4, 4))
        };
        assert_eq!(building.center(), (128.0 + 48.0, 128.0 + 32.0));
    }

    #[test]
    fn test_airborne_requires_flight() {
        let landed = UnitRecord::air(1, 0, TileCoord::new(0, 0), FlightState::Grounded);
        let flying = UnitRecord::air(2, 0, TileCoord::new(0, 0), FlightState::Airborne);
        let taking_off = UnitRecord::air(3, 0, TileCoord::new(0, 0), FlightState::TakingOff);
        assert!(!landed.is_airborne());
        assert!(flying.is_airborne());
        assert!(taking_off.is_airborne());
        assert!(!UnitRecord::ground(4, 0, TileCoord::new(0, 0)).is_airborne());
    }

    #[test]
    fn test_wreck_tile() {
        assert_eq!(WreckRecord::at_tile(TileCoord::new(5, 1)).tile(), TileCoord::new(5, 1));
    }
}
