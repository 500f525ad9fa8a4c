//! Movement system - walks units along their paths and keeps occupancy current.

use crate::components::*;
use crate::config::SimConfig;
use crate::occupancy::OccupancyGrid;
use crate::records::UnitRecord;
use bevy_ecs::prelude::*;

/// Resource containing the delta time for the current tick.
#[derive(Resource, Default)]
pub struct DeltaTime(pub f32);

/// System that moves units towards the next tile of their path.
///
/// Ground units wait while the next tile is occupied and ask for a new path
/// after `repath_after_blocked_ticks`. When a unit's tile changes, its
/// occupancy moves with it. Reaching the last tile puts the unit on `Hold`.
///
/// ## Data Access
/// - Reads: DeltaTime, SimConfig, UnitId, Owner, UnitKind, Health, UnitStats, Flight
/// - Writes: Position, Path, LastTile, Order, OccupancyGrid
pub fn path_following_system(
    dt: Res<DeltaTime>,
    config: Res<SimConfig>,
    mut occupancy: ResMut<OccupancyGrid>,
    mut query: Query<(
        &UnitId,
        &Owner,
        &UnitKind,
        &Health,
        &UnitStats,
        Option<&Flight>,
        &mut Position,
        &mut Path,
        &mut LastTile,
        &mut Order,
    )>,
) {
    let delta = dt.0;

    for (id, owner, kind, health, stats, flight, mut pos, mut path, mut last_tile, mut order) in
        query.iter_mut()
    {
        let Some(&next) = path.tiles.front() else {
            if !matches!(*order, Order::Hold) {
                *order = Order::Hold;
            }
            continue;
        };
        let record = UnitRecord::from_components(id, owner, kind, &pos, health, flight, None);

        // A unit already overlapping the next tile holds its occupancy.
        if !record.is_airborne() && pos.tile() != next && !occupancy.is_free(next) {
            path.blocked_ticks += 1;
            if path.blocked_ticks >= config.repath_after_blocked_ticks {
                tracing::debug!(unit = id.0, ?next, "path blocked, requesting new path");
                path.clear();
                order.set_changed();
            }
            continue;
        }
        path.blocked_ticks = 0;

        let (tx, ty) = next.to_pixel();
        let (dx, dy) = (tx - pos.x, ty - pos.y);
        let dist = (dx * dx + dy * dy).sqrt();
        let step = stats.speed * delta;
        if dist <= step {
            pos.x = tx;
            pos.y = ty;
            path.tiles.pop_front();
        } else {
            pos.x += dx / dist * step;
            pos.y += dy / dist * step;
        }

        let tile = pos.tile();
        if tile != last_tile.0 {
            let moved = UnitRecord { x: pos.x, y: pos.y, ..record };
            occupancy.update_unit_occupancy(&moved, last_tile.0);
            last_tile.0 = tile;
        }

        if path.is_empty() {
            tracing::trace!(unit = id.0, ?tile, "arrived");
            *order = Order::Hold;
        }
    }
}
