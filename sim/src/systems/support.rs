//! Support assignment - sends ambulances and recovery tanks to damaged friendlies.

use crate::components::*;
use crate::config::SimConfig;
use crate::spatial::SpatialQuadtree;
use bevy_ecs::prelude::*;

/// System that assigns every support unit the closest friendly needing it.
///
/// A friendly needs support when its health fraction is below the role's
/// threshold. Buildings are never patients.
///
/// ## Data Access
/// - Reads: SimConfig, UnitId, Owner, Position, SupportRole
/// - Writes: SupportTarget, SpatialQuadtree (query buffers)
pub fn support_assignment_system(
    config: Res<SimConfig>,
    tree: Option<ResMut<SpatialQuadtree>>,
    mut query: Query<(&UnitId, &Owner, &Position, &SupportRole, &mut SupportTarget)>,
) {
    let Some(mut tree) = tree else {
        return;
    };
    for (id, owner, pos, role, mut target) in query.iter_mut() {
        let (cx, cy) = pos.center();
        let threshold = role.health_threshold();

        let patient = tree
            .query_nearby_ground(cx, cy, config.support_search_radius, Some(id.0))
            .iter()
            .filter(|e| e.owner == owner.0 && !e.kind.is_building())
            .filter(|e| e.health_fraction() < threshold)
            .min_by(|a, b| a.distance_sq_to(cx, cy).total_cmp(&b.distance_sq_to(cx, cy)))
            .map(|e| e.id);

        if target.0 != patient {
            tracing::trace!(unit = id.0, patient = ?patient, "support target changed");
            target.0 = patient;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::TileCoord;
    use crate::records::UnitRecord;

    fn damaged(id: u32, owner: u8, tile: TileCoord, health: f32) -> UnitRecord {
        UnitRecord {
            health,
            ..UnitRecord::ground(id, owner, tile)
        }
    }

    fn assign(role: SupportRole, records: &[UnitRecord]) -> Option<u32> {
        let mut world = World::new();
        world.insert_resource(SimConfig::default());
        let mut tree = SpatialQuadtree::new(1024.0, 1024.0, 4);
        tree.rebuild(records);
        world.insert_resource(tree);

        let kind = match role {
            SupportRole::Medic => UnitKind::Ambulance,
            SupportRole::Repair => UnitKind::RecoveryTank,
        };
        let medic = world
            .spawn((
                UnitBundle::new(1, 0, kind, TileCoord::new(10, 10)),
                role,
                SupportTarget::default(),
            ))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(support_assignment_system);
        schedule.run(&mut world);
        world.get::<SupportTarget>(medic).unwrap().0
    }

    #[test]
    fn test_medic_picks_nearest_damaged_friendly() {
        let records = [
            damaged(1, 0, TileCoord::new(10, 10), 50.0),
            damaged(2, 0, TileCoord::new(15, 10), 80.0),
            damaged(3, 0, TileCoord::new(12, 10), 85.0),
            damaged(4, 1, TileCoord::new(11, 10), 10.0),
            damaged(5, 0, TileCoord::new(11, 11), 100.0),
        ];
        assert_eq!(assign(SupportRole::Medic, &records), Some(3));
    }

    #[test]
    fn test_repair_threshold_is_lower() {
        let records = [
            damaged(2, 0, TileCoord::new(11, 10), 80.0),
            damaged(3, 0, TileCoord::new(14, 10), 40.0),
        ];
        assert_eq!(assign(SupportRole::Repair, &records), Some(3));
        assert_eq!(assign(SupportRole::Medic, &records), Some(2));
    }

    #[test]
    fn test_no_patient_in_range() {
        let records = [damaged(2, 0, TileCoord::new(30, 30), 10.0)];
        assert_eq!(assign(SupportRole::Medic, &records), None);
    }
}
