//! Snapshot types.
//!
//! The `Snapshot` struct provides a serializable view of the simulation state
//! that a client can render from.

use crate::components::*;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Snapshot of a single unit or building for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id: u32,
    pub owner: u8,
    pub kind: UnitKind,
    pub x: f32,
    pub y: f32,
    pub health: f32,
    pub health_max: f32,
    pub flight_state: FlightState,
    pub order: String,
    /// Tiles left on the unit's path.
    pub path_len: usize,
    pub target: Option<u32>,
    pub support_target: Option<u32>,
}

/// Snapshot of a wreck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WreckSnapshot {
    pub x: f32,
    pub y: f32,
}

/// Complete simulation state snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current simulation tick.
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub time: f32,
    /// All units and buildings, ordered by id.
    pub units: Vec<UnitSnapshot>,
    pub wrecks: Vec<WreckSnapshot>,
    /// Tiles with at least one occupant.
    pub occupied_tiles: usize,
}

impl Snapshot {
    /// Create a snapshot from the ECS world.
    pub fn from_world(world: &mut World, tick: u64, time: f32) -> Self {
        let mut query = world.query_filtered::<(
            &UnitId,
            &Owner,
            &UnitKind,
            &Position,
            &Health,
            Option<&Flight>,
            Option<&Order>,
            Option<&Path>,
            Option<&CombatTarget>,
            Option<&SupportTarget>,
        ), Without<Wreck>>();

        let mut units: Vec<UnitSnapshot> = query
            .iter(world)
            .map(|(id, owner, kind, pos, health, flight, order, path, target, support)| {
                let order_str = match order {
                    None | Some(Order::Hold) => "Hold".to_string(),
                    Some(Order::MoveTo { x, y }) => format!("MoveTo({},{})", x, y),
                    Some(Order::Retreat) => "Retreat".to_string(),
                };
                UnitSnapshot {
                    id: id.0,
                    owner: owner.0,
                    kind: *kind,
                    x: pos.x,
                    y: pos.y,
                    health: health.current,
                    health_max: health.max,
                    flight_state: flight.map(|f| f.state).unwrap_or_default(),
                    order: order_str,
                    path_len: path.map_or(0, Path::len),
                    target: target.and_then(|t| t.0),
                    support_target: support.and_then(|s| s.0),
                }
            })
            .collect();
        units.sort_by_key(|u| u.id);

        let mut wreck_query = world.query_filtered::<&Position, With<Wreck>>();
        let wrecks = wreck_query
            .iter(world)
            .map(|pos| WreckSnapshot { x: pos.x, y: pos.y })
            .collect();

        let occupied_tiles = world
            .get_resource::<crate::occupancy::OccupancyGrid>()
            .map_or(0, |grid| grid.occupied_count());

        Self {
            tick,
            time,
            units,
            wrecks,
            occupied_tiles,
        }
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
