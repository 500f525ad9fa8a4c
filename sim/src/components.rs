//! ECS Components for the RTS simulation.
//!
//! Components are pure data containers attached to entities.
//! All game logic lives in systems that query these components.

use crate::geometry::{TileCoord, TILE_SIZE};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// Top-left pixel position of an entity on the map.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Position of a tile-sized unit standing on `tile`.
    pub fn at_tile(tile: TileCoord) -> Self {
        let (x, y) = tile.to_pixel();
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Tile under the center of a tile-sized sprite at this position.
    pub fn tile(&self) -> TileCoord {
        TileCoord::from_pixel_center(self.x, self.y)
    }

    /// World-space center of a tile-sized sprite at this position.
    pub fn center(&self) -> (f32, f32) {
        (self.x + TILE_SIZE / 2.0, self.y + TILE_SIZE / 2.0)
    }
}

/// Building footprint in tiles.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    pub width: u32,
    pub height: u32,
}

/// Tile the unit was last recorded on in the occupancy grid.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LastTile(pub TileCoord);

// ============================================================================
// IDENTITY COMPONENTS
// ============================================================================

/// Unique identifier for a unit or building.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

/// Owning player.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Owner(pub u8);

/// What an entity is.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    #[default]
    Tank,
    RocketTank,
    Harvester,
    Ambulance,
    RecoveryTank,
    MineLayer,
    Helicopter,
    Building,
}

impl UnitKind {
    /// Units that can take off.
    pub fn is_air_unit(self) -> bool {
        matches!(self, UnitKind::Helicopter)
    }

    pub fn is_building(self) -> bool {
        matches!(self, UnitKind::Building)
    }

    /// Weapons that can engage flying targets.
    pub fn can_target_air(self) -> bool {
        matches!(self, UnitKind::RocketTank | UnitKind::Helicopter | UnitKind::Building)
    }
}

/// Flight state of an air-capable unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlightState {
    /// Landed; behaves as a ground unit.
    #[default]
    Grounded,
    TakingOff,
    Airborne,
    Landing,
}

impl FlightState {
    pub fn is_grounded(self) -> bool {
        self == FlightState::Grounded
    }
}

/// Flight component carried only by air-capable units.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    pub state: FlightState,
}

/// Marker for unit wrecks left behind on the map.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Wreck;

// ============================================================================
// COMBAT COMPONENTS
// ============================================================================

/// Health of a unit or building.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            (self.current / self.max).clamp(0.0, 1.0)
        }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    pub fn damage(&mut self, amount: f32) {
        self.current = (self.current - amount).max(0.0);
    }

    pub fn heal(&mut self, amount: f32) {
        self.current = (self.current + amount).min(self.max);
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// Movement and weapon statistics.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Movement speed in pixels per second.
    pub speed: f32,
    /// Weapon range in pixels. Zero for unarmed units.
    pub weapon_range: f32,
    /// Whether the weapon can engage airborne targets.
    pub can_target_air: bool,
}

impl Default for UnitStats {
    fn default() -> Self {
        Self {
            speed: 64.0,
            weapon_range: 160.0,
            can_target_air: false,
        }
    }
}

impl UnitStats {
    /// Reasonable stats for each kind.
    pub fn for_kind(kind: UnitKind) -> Self {
        let (speed, weapon_range) = match kind {
            UnitKind::Tank => (64.0, 160.0),
            UnitKind::RocketTank => (56.0, 224.0),
            UnitKind::Harvester => (48.0, 0.0),
            UnitKind::Ambulance => (80.0, 0.0),
            UnitKind::RecoveryTank => (56.0, 0.0),
            UnitKind::MineLayer => (56.0, 0.0),
            UnitKind::Helicopter => (112.0, 192.0),
            UnitKind::Building => (0.0, 0.0),
        };
        Self {
            speed,
            weapon_range,
            can_target_air: kind.can_target_air(),
        }
    }
}

/// Id of the enemy currently targeted, if any.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatTarget(pub Option<u32>);

// ============================================================================
// ORDER / PATH COMPONENTS
// ============================================================================

/// Current order for a unit.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum Order {
    /// Stay in place.
    #[default]
    Hold,
    /// Move to a target tile.
    MoveTo { x: i32, y: i32 },
    /// Fall back away from the nearest threat.
    Retreat,
}

/// Remaining tiles to walk, next tile first.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct Path {
    pub tiles: VecDeque<TileCoord>,
    /// Consecutive ticks the next tile has been occupied.
    pub blocked_ticks: u32,
}

impl Path {
    pub fn from_tiles(tiles: impl IntoIterator<Item = TileCoord>) -> Self {
        Self {
            tiles: tiles.into_iter().collect(),
            blocked_ticks: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
        self.blocked_ticks = 0;
    }
}

// ============================================================================
// AI / SUPPORT COMPONENTS
// ============================================================================

/// Marker for AI-controlled units.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct AIControlled;

/// Threat awareness tracking for AI decisions.
#[derive(Component, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreatAwareness {
    /// Center of the nearest enemy.
    pub nearest_threat: Option<(f32, f32)>,
    /// Distance to the nearest enemy.
    pub nearest_threat_dist: f32,
    /// Enemies within the scan radius.
    pub threats_in_range: u32,
}

impl ThreatAwareness {
    pub fn has_contact(&self) -> bool {
        self.nearest_threat.is_some()
    }

    pub fn clear(&mut self) {
        self.nearest_threat = None;
        self.nearest_threat_dist = f32::MAX;
        self.threats_in_range = 0;
    }
}

/// What a support unit looks after.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupportRole {
    /// Ambulance: restores crews of any damaged friendly unit.
    Medic,
    /// Recovery tank: repairs heavily damaged friendly vehicles.
    Repair,
}

impl SupportRole {
    /// Health fraction below which a friendly unit needs this support.
    pub fn health_threshold(self) -> f32 {
        match self {
            SupportRole::Medic => 0.9,
            SupportRole::Repair => 0.5,
        }
    }

    pub fn for_kind(kind: UnitKind) -> Option<Self> {
        match kind {
            UnitKind::Ambulance => Some(SupportRole::Medic),
            UnitKind::RecoveryTank => Some(SupportRole::Repair),
            _ => None,
        }
    }
}

/// Id of the friendly unit a support unit is assigned to.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportTarget(pub Option<u32>);

// ============================================================================
// BUNDLES
// ============================================================================

/// Bundle for spawning a mobile unit.
#[derive(Bundle, Default)]
pub struct UnitBundle {
    pub unit_id: UnitId,
    pub owner: Owner,
    pub kind: UnitKind,
    pub position: Position,
    pub health: Health,
    pub stats: UnitStats,
    pub order: Order,
    pub path: Path,
    pub last_tile: LastTile,
    pub target: CombatTarget,
}

impl UnitBundle {
    pub fn new(id: u32, owner: u8, kind: UnitKind, tile: TileCoord) -> Self {
        Self {
            unit_id: UnitId(id),
            owner: Owner(owner),
            kind,
            position: Position::at_tile(tile),
            health: Health::default(),
            stats: UnitStats::for_kind(kind),
            order: Order::Hold,
            path: Path::default(),
            last_tile: LastTile(tile),
            target: CombatTarget::default(),
        }
    }
}

/// Bundle for spawning a building.
#[derive(Bundle)]
pub struct BuildingBundle {
    pub unit_id: UnitId,
    pub owner: Owner,
    pub kind: UnitKind,
    pub position: Position,
    pub health: Health,
    pub footprint: Footprint,
}

impl BuildingBundle {
    pub fn new(id: u32, owner: u8, origin: TileCoord, width: u32, height: u32) -> Self {
        Self {
            unit_id: UnitId(id),
            owner: Owner(owner),
            kind: UnitKind::Building,
            position: Position::at_tile(origin),
            health: Health::new(1000.0),
            footprint: Footprint { width, height },
        }
    }
}

/// Bundle for AI components to add to a unit.
#[derive(Bundle, Default)]
pub struct AIBundle {
    pub ai: AIControlled,
    pub threat: ThreatAwareness,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_fraction_and_alive() {
        let mut h = Health::new(200.0);
        h.damage(150.0);
        assert!((h.fraction() - 0.25).abs() < 1e-6);
        h.damage(100.0);
        assert!(!h.is_alive());
        assert_eq!(h.current, 0.0);
    }

    #[test]
    fn test_position_tile_uses_sprite_center() {
        let p = Position::new(47.0, 15.0);
        assert_eq!(p.tile(), TileCoord::new(1, 0));
        assert_eq!(Position::at_tile(TileCoord::new(3, 2)), Position::new(96.0, 64.0));
    }

    #[test]
    fn test_kind_tables() {
        assert!(UnitKind::Helicopter.is_air_unit());
        assert!(!UnitKind::Tank.is_air_unit());
        assert!(UnitStats::for_kind(UnitKind::RocketTank).can_target_air);
        assert_eq!(UnitStats::for_kind(UnitKind::Harvester).weapon_range, 0.0);
        assert_eq!(SupportRole::for_kind(UnitKind::Ambulance), Some(SupportRole::Medic));
        assert_eq!(SupportRole::for_kind(UnitKind::Tank), None);
    }
}
