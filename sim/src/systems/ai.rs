//! AI systems for autonomous unit behavior.
//!
//! Threat scans go through the spatial quadtree and only look at the plane
//! the unit is on: a landed helicopter sees ground units, an airborne one
//! sees other aircraft.

use crate::components::*;
use crate::config::SimConfig;
use crate::geometry::TILE_SIZE;
use crate::spatial::SpatialQuadtree;
use bevy_ecs::prelude::*;

/// Minimum scan radius in tiles, so unarmed units still notice enemies.
const MIN_SCAN_TILES: f32 = 4.0;

// ============================================================================
// THREAT AWARENESS SYSTEM
// ============================================================================

/// System that updates threat awareness for AI-controlled units.
///
/// ## Data Access
/// - Reads: SimConfig, UnitId, Owner, UnitKind, Position, UnitStats, Flight
/// - Writes: ThreatAwareness, SpatialQuadtree (query buffers)
pub fn threat_awareness_system(
    config: Res<SimConfig>,
    tree: Option<ResMut<SpatialQuadtree>>,
    mut ai_query: Query<
        (
            &UnitId,
            &Owner,
            &UnitKind,
            &Position,
            &UnitStats,
            Option<&Flight>,
            &mut ThreatAwareness,
        ),
        With<AIControlled>,
    >,
) {
    let Some(mut tree) = tree else {
        return;
    };
    for (id, owner, kind, pos, stats, flight, mut threat) in ai_query.iter_mut() {
        threat.clear();

        let airborne = kind.is_air_unit() && flight.is_some_and(|f| !f.state.is_grounded());
        let radius = stats.weapon_range.max(MIN_SCAN_TILES * TILE_SIZE) * config.threat_radius_factor;
        let (cx, cy) = pos.center();

        for enemy in tree
            .query_nearby_for_unit(cx, cy, radius, airborne, Some(id.0))
            .iter()
            .filter(|e| e.owner != owner.0)
        {
            let dist = enemy.distance_sq_to(cx, cy).sqrt();
            if dist < threat.nearest_threat_dist {
                threat.nearest_threat = Some((enemy.cx, enemy.cy));
                threat.nearest_threat_dist = dist;
            }
            threat.threats_in_range += 1;
        }
    }
}

// ============================================================================
// AI ORDER SYSTEM
// ============================================================================

/// System that generates orders for AI units based on their situation.
///
/// Badly damaged units in contact fall back; once contact is lost they hold.
/// Orders are only written when they change, so path requests fire once.
pub fn ai_order_system(
    config: Res<SimConfig>,
    mut ai_query: Query<(&UnitId, &Health, &ThreatAwareness, &mut Order), With<AIControlled>>,
) {
    for (id, health, threat, mut order) in ai_query.iter_mut() {
        let wanted = match *order {
            Order::Retreat if !threat.has_contact() => Order::Hold,
            Order::Retreat => continue,
            _ if threat.has_contact() && health.fraction() < config.retreat_health_fraction => {
                Order::Retreat
            }
            _ => continue,
        };
        tracing::debug!(unit = id.0, order = ?wanted, "ai order");
        *order = wanted;
    }
}
