//! Gathers this tick's flat unit and wreck lists from components.

use crate::components::*;
use crate::records::{TickUnits, UnitRecord, WreckRecord};
use bevy_ecs::prelude::*;

/// System that rebuilds `TickUnits` from the live entities.
///
/// ## Data Access
/// - Reads: UnitId, Owner, UnitKind, Position, Health, Flight, Footprint, Wreck
/// - Writes: TickUnits
pub fn unit_record_system(
    mut tick_units: ResMut<TickUnits>,
    units: Query<
        (
            &UnitId,
            &Owner,
            &UnitKind,
            &Position,
            &Health,
            Option<&Flight>,
            Option<&Footprint>,
        ),
        Without<Wreck>,
    >,
    wrecks: Query<&Position, With<Wreck>>,
) {
    let tick_units = &mut *tick_units;
    tick_units.units.clear();
    tick_units.wrecks.clear();

    tick_units.units.extend(units.iter().map(|(id, owner, kind, pos, health, flight, footprint)| {
        UnitRecord::from_components(id, owner, kind, pos, health, flight, footprint)
    }));
    tick_units
        .wrecks
        .extend(wrecks.iter().map(|pos| WreckRecord { x: pos.x, y: pos.y }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::TileCoord;

    #[test]
    fn test_gathers_units_and_wrecks() {
        let mut world = World::new();
        world.insert_resource(TickUnits::default());

        world.spawn(UnitBundle::new(1, 0, UnitKind::Tank, TileCoord::new(1, 1)));
        world.spawn((
            UnitBundle::new(2, 1, UnitKind::Helicopter, TileCoord::new(2, 2)),
            Flight { state: FlightState::Airborne },
        ));
        world.spawn(BuildingBundle::new(3, 0, TileCoord::new(5, 5), 2, 2));
        world.spawn((Position::at_tile(TileCoord::new(4, 4)), Wreck));

        let mut schedule = Schedule::default();
        schedule.add_systems(unit_record_system);
        schedule.run(&mut world);

        let gathered = world.resource::<TickUnits>();
        assert_eq!(gathered.units.len(), 3);
        assert_eq!(gathered.wrecks.len(), 1);

        let heli = gathered.units.iter().find(|u| u.id == 2).unwrap();
        assert!(heli.is_airborne());
        let building = gathered.units.iter().find(|u| u.id == 3).unwrap();
        assert_eq!(building.footprint, Some((2, 2)));
    }
}
