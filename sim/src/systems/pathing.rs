//! Path requests - turns changed orders into tile paths.
//!
//! ## Parallel Feature
//!
//! Path searches share no mutable state. When compiled with
//! `--features parallel`, the batch of requests gathered this tick is solved
//! with rayon and the results are written back sequentially.

use crate::components::*;
use crate::config::SimConfig;
use crate::geometry::{TileCoord, TILE_SIZE};
use crate::mines::MineField;
use crate::occupancy::OccupancyGrid;
use crate::pathfinding::{find_path_for_owner, PathOptions};
use crate::terrain::MapGrid;
use bevy_ecs::prelude::*;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One pending search.
#[derive(Debug, Clone, Copy)]
struct PathRequest {
    entity: Entity,
    owner: u8,
    start: TileCoord,
    goal: TileCoord,
}

/// Tile to run to when retreating from a threat at `threat`.
///
/// Heads straight away from the threat for `distance` tiles, clamped to the map.
pub fn retreat_goal(map: &MapGrid, from: &Position, threat: (f32, f32), distance: i32) -> TileCoord {
    let (cx, cy) = from.center();
    let (dx, dy) = (cx - threat.0, cy - threat.1);
    let len = (dx * dx + dy * dy).sqrt();
    let (ux, uy) = if len < 0.0001 { (1.0, 0.0) } else { (dx / len, dy / len) };

    let reach = distance as f32 * TILE_SIZE;
    let goal = TileCoord::from_pixel(cx + ux * reach, cy + uy * reach);
    TileCoord::new(
        goal.x.clamp(0, map.width.saturating_sub(1) as i32),
        goal.y.clamp(0, map.height.saturating_sub(1) as i32),
    )
}

/// System that computes a path whenever a unit's order changes.
///
/// `Hold` clears the path. `MoveTo` searches towards the target tile and
/// settles next to it when the tile is taken. `Retreat` runs away from the
/// nearest known threat.
///
/// ## Data Access
/// - Reads: MapGrid, OccupancyGrid, MineField, SimConfig, Order, Owner, Position, ThreatAwareness
/// - Writes: Path
pub fn path_request_system(
    map: Res<MapGrid>,
    occupancy: Res<OccupancyGrid>,
    mines: Res<MineField>,
    config: Res<SimConfig>,
    mut query: Query<
        (
            Entity,
            &Owner,
            &Position,
            &Order,
            &mut Path,
            Option<&ThreatAwareness>,
        ),
        Changed<Order>,
    >,
) {
    let mut requests = Vec::new();

    for (entity, owner, pos, order, mut path, threat) in query.iter_mut() {
        path.clear();
        let goal = match order {
            Order::Hold => None,
            Order::MoveTo { x, y } => Some(TileCoord::new(*x, *y)),
            Order::Retreat => threat
                .and_then(|t| t.nearest_threat)
                .map(|t| retreat_goal(&map, pos, t, config.retreat_distance_tiles)),
        };
        if let Some(goal) = goal {
            requests.push(PathRequest {
                entity,
                owner: owner.0,
                start: pos.tile(),
                goal,
            });
        }
    }

    if requests.is_empty() {
        return;
    }

    let options = PathOptions {
        max_nodes: config.path_max_nodes,
        ..PathOptions::default()
    };
    let solve = |req: &PathRequest| {
        let tiles = find_path_for_owner(
            req.start,
            req.goal,
            Some(&*map),
            Some(&*occupancy),
            req.owner,
            &*mines,
            &options,
        );
        (req.entity, req.goal, tiles)
    };

    #[cfg(feature = "parallel")]
    let results: Vec<_> = requests.par_iter().map(solve).collect();
    #[cfg(not(feature = "parallel"))]
    let results: Vec<_> = requests.iter().map(solve).collect();

    for (entity, goal, tiles) in results {
        tracing::trace!(
            ?entity,
            len = tiles.len(),
            retargeted = tiles.last().is_some_and(|t| *t != goal),
            "path computed"
        );
        if let Ok((_, _, _, _, mut path, _)) = query.get_mut(entity) {
            // The unit already stands on the first tile.
            *path = Path::from_tiles(tiles.into_iter().skip(1));
        }
    }
}
