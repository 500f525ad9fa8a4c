//! Public API for the simulation.
//!
//! This module provides the main interface for a game client to drive the
//! simulation.
//!
//! ## Fixed Timestep
//!
//! The simulation uses a fixed timestep internally (default 30 Hz). When `step(dt)` is called,
//! the simulation accumulates time and runs fixed updates as needed. This ensures deterministic
//! behavior regardless of frame rate.
//!
//! ## Spatial Data
//!
//! Every fixed update starts by gathering flat unit records, rebuilding the
//! occupancy grid and rebuilding both quadtrees. Everything after that in the
//! tick reads those structures.

use crate::components::*;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::geometry::TileCoord;
use crate::mines::MineField;
use crate::occupancy::{occupancy_rebuild_system, OccupancyGrid, RemoveOccupancyOptions};
use crate::pathfinding::{self, PathOptions};
use crate::records::{TickUnits, UnitRecord};
use crate::spatial::{spatial_quadtree_rebuild_system, SpatialQuadtree};
use crate::systems::*;
use crate::terrain::MapGrid;
use crate::world::Snapshot;
use bevy_ecs::prelude::*;

/// How far `spawn_unit` looks for a free tile around the requested one.
const SPAWN_SEARCH_RADIUS: i32 = 8;

/// The main simulation world container.
///
/// Holds the ECS world and schedule, providing a clean API for:
/// - Initializing the simulation from a map
/// - Stepping the simulation forward
/// - Extracting state snapshots
/// - Issuing commands
pub struct SimWorld {
    world: World,
    schedule: Schedule,
    tick: u64,
    time: f32,
    /// Accumulated time for fixed timestep.
    time_accumulator: f32,
}

impl SimWorld {
    /// Create a simulation on `map` with the given configuration.
    pub fn new(map: MapGrid, config: SimConfig) -> Result<Self, SimError> {
        if let Err(err) = config.validate().and_then(|_| map.validate()) {
            tracing::warn!(%err, "rejected simulation setup");
            return Err(err);
        }

        let mut world = World::new();

        // Core resources
        world.insert_resource(DeltaTime(config.fixed_timestep));
        world.insert_resource(SpatialQuadtree::for_map(&map, config.quadtree_capacity));
        world.insert_resource(OccupancyGrid::build(&map, &[], &[]).unwrap_or_default());
        world.insert_resource(MineField::new());
        world.insert_resource(TickUnits::default());

        tracing::info!(
            width = map.width,
            height = map.height,
            timestep = config.fixed_timestep,
            "simulation created"
        );
        world.insert_resource(map);
        world.insert_resource(config);

        // One strictly ordered pass per tick.
        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                unit_record_system,
                occupancy_rebuild_system,
                spatial_quadtree_rebuild_system,
                threat_awareness_system,
                ai_order_system,
                path_request_system,
                targeting_system,
                support_assignment_system,
                path_following_system,
            )
                .chain(),
        );

        Ok(Self {
            world,
            schedule,
            tick: 0,
            time: 0.0,
            time_accumulator: 0.0,
        })
    }

    /// A demo battlefield with two small armies facing each other.
    pub fn new_default_test_world() -> Result<Self, SimError> {
        let mut sim = Self::new(MapGrid::new_with_features(64, 64), SimConfig::default())?;

        for i in 0..6 {
            sim.spawn_unit(i, 0, UnitKind::Tank, TileCoord::new(6, 20 + 2 * i as i32));
        }
        sim.spawn_unit(10, 0, UnitKind::Ambulance, TileCoord::new(4, 24));
        sim.spawn_unit(11, 0, UnitKind::RocketTank, TileCoord::new(4, 28));

        for i in 0..6 {
            sim.spawn_ai_unit(100 + i, 1, UnitKind::Tank, TileCoord::new(56, 20 + 2 * i as i32));
        }
        sim.spawn_ai_unit(110, 1, UnitKind::Helicopter, TileCoord::new(58, 24));
        sim.spawn_ai_unit(111, 1, UnitKind::RecoveryTank, TileCoord::new(58, 28));

        sim.spawn_building(1000, 0, TileCoord::new(2, 2), 3, 3);
        sim.spawn_building(1001, 1, TileCoord::new(59, 59), 3, 3);

        Ok(sim)
    }

    /// Step the simulation forward by `dt` seconds.
    ///
    /// Uses fixed timestep internally - accumulates time and runs fixed updates
    /// as needed. This ensures deterministic behavior regardless of frame rate.
    pub fn step(&mut self, dt: f32) {
        let fixed_dt = self
            .world
            .get_resource::<SimConfig>()
            .map(|c| c.fixed_timestep)
            .unwrap_or(1.0 / 30.0);

        self.time_accumulator += dt;

        while self.time_accumulator >= fixed_dt {
            self.fixed_update(fixed_dt);
            self.time_accumulator -= fixed_dt;
        }
    }

    /// Run a single fixed timestep update.
    fn fixed_update(&mut self, dt: f32) {
        if let Some(mut dt_res) = self.world.get_resource_mut::<DeltaTime>() {
            dt_res.0 = dt;
        }

        self.schedule.run(&mut self.world);

        self.tick += 1;
        self.time += dt;
    }

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot::from_world(&mut self.world, self.tick, self.time)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&mut self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".to_string())
    }

    /// Get the current tick number.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Get the elapsed simulation time.
    pub fn current_time(&self) -> f32 {
        self.time
    }

    /// Spawn a mobile unit on the free tile closest to `tile`.
    ///
    /// Returns `None` when no tile within reach is free.
    pub fn spawn_unit(&mut self, id: u32, owner: u8, kind: UnitKind, tile: TileCoord) -> Option<Entity> {
        let tile = self
            .world
            .get_resource::<OccupancyGrid>()?
            .nearest_free_tile(tile, SPAWN_SEARCH_RADIUS)?;

        let mut entity = self.world.spawn(UnitBundle::new(id, owner, kind, tile));
        if let Some(role) = SupportRole::for_kind(kind) {
            entity.insert((role, SupportTarget::default()));
        }
        if kind.is_air_unit() {
            entity.insert(Flight::default());
        }
        let entity = entity.id();

        if let Some(mut occupancy) = self.world.get_resource_mut::<OccupancyGrid>() {
            occupancy.increment(tile);
        }
        tracing::debug!(id, owner, ?kind, ?tile, "unit spawned");
        Some(entity)
    }

    /// Spawn an AI-controlled unit.
    pub fn spawn_ai_unit(&mut self, id: u32, owner: u8, kind: UnitKind, tile: TileCoord) -> Option<Entity> {
        let entity = self.spawn_unit(id, owner, kind, tile)?;
        self.world.entity_mut(entity).insert(AIBundle::default());
        Some(entity)
    }

    /// Spawn a building and stamp its footprint onto the map.
    pub fn spawn_building(&mut self, id: u32, owner: u8, origin: TileCoord, width: u32, height: u32) -> Entity {
        if let Some(mut map) = self.world.get_resource_mut::<MapGrid>() {
            map.place_building(id, origin, width, height);
        }
        if let Some(mut occupancy) = self.world.get_resource_mut::<OccupancyGrid>() {
            for dy in 0..height as i32 {
                for dx in 0..width as i32 {
                    occupancy.increment(TileCoord::new(origin.x + dx, origin.y + dy));
                }
            }
        }
        self.world.spawn(BuildingBundle::new(id, owner, origin, width, height)).id()
    }

    /// Leave a wreck on `tile`.
    pub fn spawn_wreck(&mut self, tile: TileCoord) -> Entity {
        if let Some(mut occupancy) = self.world.get_resource_mut::<OccupancyGrid>() {
            occupancy.increment(tile);
        }
        self.world.spawn((Position::at_tile(tile), Wreck)).id()
    }

    /// Remove a unit, optionally leaving a wreck where a ground unit stood.
    ///
    /// Buildings also release their map footprint. Returns `false` when no
    /// entity has `id`.
    pub fn destroy_unit(&mut self, id: u32, leave_wreck: bool) -> bool {
        let mut query = self
            .world
            .query::<(Entity, &UnitId, &Owner, &UnitKind, &Position, &Health, Option<&Flight>, Option<&Footprint>)>();
        let found = query
            .iter(&self.world)
            .find(|(_, unit_id, ..)| unit_id.0 == id)
            .map(|(entity, unit_id, owner, kind, pos, health, flight, footprint)| {
                (entity, UnitRecord::from_components(unit_id, owner, kind, pos, health, flight, footprint))
            });
        let Some((entity, record)) = found else {
            return false;
        };

        self.world.despawn(entity);
        if let Some((width, height)) = record.footprint {
            if let Some(mut map) = self.world.get_resource_mut::<MapGrid>() {
                map.clear_building(id);
            }
            let origin = TileCoord::from_pixel(record.x, record.y);
            if let Some(mut occupancy) = self.world.get_resource_mut::<OccupancyGrid>() {
                for dy in 0..height as i32 {
                    for dx in 0..width as i32 {
                        occupancy.decrement(TileCoord::new(origin.x + dx, origin.y + dy));
                    }
                }
            }
            tracing::debug!(id, "building destroyed");
            return true;
        }

        if let Some(mut occupancy) = self.world.get_resource_mut::<OccupancyGrid>() {
            occupancy.remove_unit_occupancy(&record, RemoveOccupancyOptions::default());
        }
        if leave_wreck && !record.is_airborne() {
            self.spawn_wreck(record.tile());
        }
        tracing::debug!(id, leave_wreck, "unit destroyed");
        true
    }

    /// Lay a mine for `owner`.
    pub fn place_mine(&mut self, tile: TileCoord, owner: u8) {
        if let Some(mut mines) = self.world.get_resource_mut::<MineField>() {
            mines.place(tile, owner);
        }
    }

    fn set_order(&mut self, unit_id: u32, new_order: Order) -> bool {
        let mut query = self.world.query::<(&UnitId, &mut Order)>();
        for (id, mut order) in query.iter_mut(&mut self.world) {
            if id.0 == unit_id {
                *order = new_order;
                return true;
            }
        }
        false
    }

    /// Issue a move order to a unit. Returns `false` for unknown ids.
    pub fn order_move(&mut self, unit_id: u32, target: TileCoord) -> bool {
        self.set_order(unit_id, Order::MoveTo { x: target.x, y: target.y })
    }

    /// Issue a hold order to a unit. Returns `false` for unknown ids.
    pub fn order_hold(&mut self, unit_id: u32) -> bool {
        self.set_order(unit_id, Order::Hold)
    }

    /// Issue a retreat order to a unit. Returns `false` for unknown ids.
    pub fn order_retreat(&mut self, unit_id: u32) -> bool {
        self.set_order(unit_id, Order::Retreat)
    }

    /// Run a path search against the current map and occupancy.
    pub fn find_path(&self, start: TileCoord, end: TileCoord, options: &PathOptions) -> Vec<TileCoord> {
        pathfinding::find_path(
            start,
            end,
            self.world.get_resource::<MapGrid>(),
            self.world.get_resource::<OccupancyGrid>(),
            options,
        )
    }

    /// Get the spatial quadtree (for debugging/visualization).
    pub fn spatial_quadtree(&self) -> Option<&SpatialQuadtree> {
        self.world.get_resource::<SpatialQuadtree>()
    }

    /// Mutable access to the quadtree, needed to run queries.
    pub fn spatial_quadtree_mut(&mut self) -> Option<Mut<'_, SpatialQuadtree>> {
        self.world.get_resource_mut::<SpatialQuadtree>()
    }

    pub fn occupancy(&self) -> Option<&OccupancyGrid> {
        self.world.get_resource::<OccupancyGrid>()
    }

    pub fn map(&self) -> Option<&MapGrid> {
        self.world.get_resource::<MapGrid>()
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world (for advanced usage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::TileType;

    fn open_field() -> SimWorld {
        SimWorld::new(MapGrid::filled(20, 20, TileType::Land), SimConfig::default()).unwrap()
    }

    fn unit<'a>(snapshot: &'a Snapshot, id: u32) -> &'a crate::world::UnitSnapshot {
        snapshot.units.iter().find(|u| u.id == id).unwrap()
    }

    #[test]
    fn test_new_world() {
        let sim = open_field();
        assert_eq!(sim.current_tick(), 0);
        assert_eq!(sim.occupancy().unwrap().occupied_count(), 0);
    }

    #[test]
    fn test_new_rejects_bad_setup() {
        let config = SimConfig {
            fixed_timestep: 0.0,
            ..SimConfig::default()
        };
        let map = MapGrid::filled(4, 4, TileType::Land);
        assert!(matches!(SimWorld::new(map, config), Err(SimError::InvalidConfig(_))));

        let mut map = MapGrid::filled(4, 4, TileType::Land);
        map.tiles.pop();
        assert!(matches!(SimWorld::new(map, SimConfig::default()), Err(SimError::InvalidMap(_))));
    }

    #[test]
    fn test_step_advances_tick() {
        let config = SimConfig {
            fixed_timestep: 0.05,
            ..SimConfig::default()
        };
        let mut sim = SimWorld::new(MapGrid::filled(8, 8, TileType::Land), config).unwrap();
        sim.step(0.05);
        assert_eq!(sim.current_tick(), 1);
        sim.step(0.05);
        assert_eq!(sim.current_tick(), 2);
        sim.step(0.01);
        assert_eq!(sim.current_tick(), 2);
    }

    #[test]
    fn test_spawn_finds_free_tile() {
        let mut sim = open_field();
        sim.spawn_unit(1, 0, UnitKind::Tank, TileCoord::new(5, 5)).unwrap();
        sim.spawn_unit(2, 0, UnitKind::Tank, TileCoord::new(5, 5)).unwrap();

        let snapshot = sim.snapshot();
        let (x, y) = TileCoord::new(4, 4).to_pixel();
        assert_eq!((unit(&snapshot, 2).x, unit(&snapshot, 2).y), (x, y));
        assert_eq!(sim.occupancy().unwrap().occupied_count(), 2);
    }

    #[test]
    fn test_move_order_walks_to_goal() {
        let mut sim = open_field();
        sim.spawn_unit(1, 0, UnitKind::Tank, TileCoord::new(1, 1)).unwrap();
        assert!(sim.order_move(1, TileCoord::new(5, 1)));
        assert!(!sim.order_move(99, TileCoord::new(5, 1)));

        for _ in 0..40 {
            sim.step(0.1);
        }

        let snapshot = sim.snapshot();
        let tank = unit(&snapshot, 1);
        assert_eq!((tank.x, tank.y), TileCoord::new(5, 1).to_pixel());
        assert_eq!(tank.order, "Hold");
        assert_eq!(tank.path_len, 0);
        assert_eq!(sim.occupancy().unwrap().get(TileCoord::new(5, 1)), Some(1));
    }

    #[test]
    fn test_move_onto_wreck_stops_next_to_it() {
        let mut sim = open_field();
        sim.spawn_unit(1, 0, UnitKind::Tank, TileCoord::new(1, 1)).unwrap();
        sim.spawn_wreck(TileCoord::new(5, 1));
        sim.order_move(1, TileCoord::new(5, 1));

        for _ in 0..40 {
            sim.step(0.1);
        }

        let snapshot = sim.snapshot();
        let tank = unit(&snapshot, 1);
        assert_eq!((tank.x, tank.y), TileCoord::new(4, 1).to_pixel());
    }

    #[test]
    fn test_enemy_mines_block_own_mines_do_not() {
        for (mine_owner, expected) in [(1, TileCoord::new(4, 1)), (0, TileCoord::new(5, 1))] {
            let mut sim = open_field();
            sim.spawn_unit(1, 0, UnitKind::Tank, TileCoord::new(1, 1)).unwrap();
            sim.place_mine(TileCoord::new(5, 1), mine_owner);
            sim.order_move(1, TileCoord::new(5, 1));

            for _ in 0..40 {
                sim.step(0.1);
            }

            let snapshot = sim.snapshot();
            let tank = unit(&snapshot, 1);
            assert_eq!((tank.x, tank.y), expected.to_pixel(), "mine owner {mine_owner}");
        }
    }

    #[test]
    fn test_find_path_respects_buildings() {
        let mut sim = open_field();
        sim.spawn_building(50, 0, TileCoord::new(3, 0), 1, 5);

        let path = sim.find_path(TileCoord::new(1, 1), TileCoord::new(5, 1), &PathOptions::default());
        assert_eq!(path.first(), Some(&TileCoord::new(1, 1)));
        assert_eq!(path.last(), Some(&TileCoord::new(5, 1)));
        assert!(path.iter().all(|t| t.x != 3 || t.y >= 5));

        let strict = sim.find_path(TileCoord::new(1, 1), TileCoord::new(3, 1), &PathOptions::strict());
        assert!(strict.is_empty());
    }

    #[test]
    fn test_destroy_unit_leaves_wreck() {
        let mut sim = open_field();
        sim.spawn_unit(1, 0, UnitKind::Tank, TileCoord::new(2, 2)).unwrap();
        assert!(sim.destroy_unit(1, true));
        assert!(!sim.destroy_unit(1, true));

        let snapshot = sim.snapshot();
        assert!(snapshot.units.is_empty());
        assert_eq!(snapshot.wrecks.len(), 1);
        assert_eq!(sim.occupancy().unwrap().get(TileCoord::new(2, 2)), Some(1));
    }

    #[test]
    fn test_destroy_building_clears_footprint() {
        let mut sim = open_field();
        sim.spawn_building(50, 0, TileCoord::new(3, 3), 2, 2);
        assert!(sim.destroy_unit(50, false));
        assert!(sim.map().unwrap().get(TileCoord::new(3, 3)).unwrap().is_walkable());
        assert_eq!(sim.occupancy().unwrap().occupied_count(), 0);
        assert_eq!(
            sim.find_path(TileCoord::new(2, 3), TileCoord::new(4, 3), &PathOptions::strict()),
            vec![TileCoord::new(2, 3), TileCoord::new(3, 3), TileCoord::new(4, 3)]
        );

        sim.step(0.05);
        assert_eq!(sim.occupancy().unwrap().occupied_count(), 0);
    }

    #[test]
    fn test_quadtree_populated_after_step() {
        let mut sim = open_field();
        sim.spawn_unit(1, 0, UnitKind::Tank, TileCoord::new(2, 2)).unwrap();
        sim.spawn_unit(2, 1, UnitKind::Tank, TileCoord::new(4, 2)).unwrap();
        sim.spawn_unit(3, 1, UnitKind::Helicopter, TileCoord::new(6, 2)).unwrap();
        let heli = sim.spawn_unit(4, 1, UnitKind::Helicopter, TileCoord::new(8, 2)).unwrap();
        sim.world_mut().entity_mut(heli).insert(Flight { state: FlightState::Airborne });

        sim.step(0.05);

        let tree = sim.spatial_quadtree().unwrap();
        assert_eq!(tree.ground_len(), 3);
        assert_eq!(tree.air_len(), 1);

        let mut tree = sim.spatial_quadtree_mut().unwrap();
        let nearby = tree.query_nearby_ground(80.0, 80.0, 70.0, Some(1));
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].id, 2);
    }

    #[test]
    fn test_targets_and_support_assigned() {
        let mut sim = open_field();
        sim.spawn_unit(1, 0, UnitKind::Tank, TileCoord::new(2, 2)).unwrap();
        sim.spawn_unit(2, 0, UnitKind::Ambulance, TileCoord::new(2, 4)).unwrap();
        sim.spawn_unit(3, 1, UnitKind::Tank, TileCoord::new(5, 2)).unwrap();
        {
            let world = sim.world_mut();
            let mut query = world.query::<(&UnitId, &mut Health)>();
            for (id, mut health) in query.iter_mut(world) {
                if id.0 == 1 {
                    health.damage(40.0);
                }
            }
        }

        sim.step(0.05);

        let snapshot = sim.snapshot();
        assert_eq!(unit(&snapshot, 1).target, Some(3));
        assert_eq!(unit(&snapshot, 3).target, Some(1));
        assert_eq!(unit(&snapshot, 2).support_target, Some(1));
    }

    #[test]
    fn test_damaged_ai_unit_retreats() {
        let mut sim = open_field();
        let scared = sim.spawn_ai_unit(1, 1, UnitKind::Tank, TileCoord::new(10, 10)).unwrap();
        sim.spawn_unit(2, 0, UnitKind::Tank, TileCoord::new(13, 10)).unwrap();
        sim.world_mut().get_mut::<Health>(scared).unwrap().damage(80.0);

        sim.step(0.05);

        let snapshot = sim.snapshot();
        let runner = unit(&snapshot, 1);
        assert_eq!(runner.order, "Retreat");
        assert!(runner.path_len > 0);
        assert!(runner.x < 10.0 * 32.0);
    }

    #[test]
    fn test_snapshot_json() {
        let mut sim = SimWorld::new_default_test_world().unwrap();
        let json = sim.snapshot_json();
        assert!(json.contains("units"));
        assert!(json.contains("Helicopter"));
        assert_eq!(sim.snapshot().units.len(), 18);
    }

    #[test]
    fn test_default_world_runs() {
        let mut sim = SimWorld::new_default_test_world().unwrap();
        sim.order_move(0, TileCoord::new(30, 30));
        for _ in 0..30 {
            sim.step(0.05);
        }
        assert!(sim.current_tick() > 0);
        assert_eq!(sim.spatial_quadtree().unwrap().ground_len(), 18);
    }
}
