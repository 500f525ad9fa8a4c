//! Targeting system - picks the nearest enemy in weapon range.
//!
//! Every armed unit queries the ground tree; units whose weapon can engage
//! aircraft also query the air tree. Unarmed units never hold a target.

use crate::components::*;
use crate::spatial::{nearest_enemy, SpatialEntry, SpatialQuadtree};
use bevy_ecs::prelude::*;

/// System that assigns each armed unit its closest enemy within range.
///
/// ## Data Access
/// - Reads: UnitId, Owner, Position, UnitStats
/// - Writes: CombatTarget, SpatialQuadtree (query buffers)
pub fn targeting_system(
    tree: Option<ResMut<SpatialQuadtree>>,
    mut query: Query<(&UnitId, &Owner, &Position, &UnitStats, &mut CombatTarget)>,
) {
    let Some(mut tree) = tree else {
        return;
    };
    for (id, owner, pos, stats, mut target) in query.iter_mut() {
        let chosen = if stats.weapon_range <= 0.0 {
            None
        } else {
            let (cx, cy) = pos.center();
            let range = stats.weapon_range;
            let ground = nearest_enemy(tree.query_nearby_ground(cx, cy, range, Some(id.0)), owner.0, cx, cy);
            let air = if stats.can_target_air {
                nearest_enemy(tree.query_nearby_air(cx, cy, range, Some(id.0)), owner.0, cx, cy)
            } else {
                None
            };
            closer(ground, air, cx, cy).map(|e| e.id)
        };

        if target.0 != chosen {
            tracing::trace!(unit = id.0, target = ?chosen, "target changed");
            target.0 = chosen;
        }
    }
}

fn closer(a: Option<SpatialEntry>, b: Option<SpatialEntry>, x: f32, y: f32) -> Option<SpatialEntry> {
    match (a, b) {
        (Some(a), Some(b)) => {
            if b.distance_sq_to(x, y) < a.distance_sq_to(x, y) {
                Some(b)
            } else {
                Some(a)
            }
        }
        (a, b) => a.or(b),
    }
}
