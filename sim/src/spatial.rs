//! Dual quadtree for proximity queries.
//!
//! Ground-plane entities and airborne entities live in two independent trees
//! over the full map extent, so a ground-only query never walks past flying
//! units and vice versa. Both trees are rebuilt from scratch every tick.
//!
//! Query results are written into per-tree buffers owned by the index and
//! handed out as borrowed slices. A result is valid until the next query;
//! the borrow checker enforces that callers copy what they need first.

use crate::components::UnitKind;
use crate::geometry::Aabb;
use crate::quadtree::{QuadtreeItem, QuadtreeNode, DEFAULT_CAPACITY};
use crate::records::{TickUnits, UnitRecord};
use crate::terrain::MapGrid;
use bevy_ecs::prelude::*;

/// Initial capacity of each result buffer.
const RESULT_BUFFER_CAPACITY: usize = 64;

/// Indexed copy of a unit, carrying its precomputed center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialEntry {
    pub id: u32,
    pub owner: u8,
    pub kind: UnitKind,
    /// World-space center in pixels.
    pub cx: f32,
    pub cy: f32,
    pub health: f32,
    pub max_health: f32,
}

impl SpatialEntry {
    fn from_record(record: &UnitRecord) -> Self {
        let (cx, cy) = record.center();
        Self {
            id: record.id,
            owner: record.owner,
            kind: record.kind,
            cx,
            cy,
            health: record.health,
            max_health: record.max_health,
        }
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }

    pub fn distance_sq_to(&self, x: f32, y: f32) -> f32 {
        let dx = self.cx - x;
        let dy = self.cy - y;
        dx * dx + dy * dy
    }
}

impl QuadtreeItem for SpatialEntry {
    #[inline]
    fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    fn center(&self) -> (f32, f32) {
        (self.cx, self.cy)
    }
}

/// Ground and air quadtrees plus their reusable result buffers.
///
/// `Default` gives an inert index with a zero-sized extent: every insert is
/// rejected and every query returns an empty slice.
#[derive(Resource, Debug)]
pub struct SpatialQuadtree {
    ground_tree: QuadtreeNode<SpatialEntry>,
    air_tree: QuadtreeNode<SpatialEntry>,
    ground_results: Vec<SpatialEntry>,
    air_results: Vec<SpatialEntry>,
}

impl Default for SpatialQuadtree {
    fn default() -> Self {
        Self::new(0.0, 0.0, DEFAULT_CAPACITY)
    }
}

impl SpatialQuadtree {
    /// Create an index covering `width` x `height` pixels.
    pub fn new(width: f32, height: f32, capacity: usize) -> Self {
        let bounds = Aabb::new(0.0, 0.0, width, height);
        Self {
            ground_tree: QuadtreeNode::new(bounds, capacity),
            air_tree: QuadtreeNode::new(bounds, capacity),
            ground_results: Vec::with_capacity(RESULT_BUFFER_CAPACITY),
            air_results: Vec::with_capacity(RESULT_BUFFER_CAPACITY),
        }
    }

    /// Create an index covering a map.
    pub fn for_map(map: &MapGrid, capacity: usize) -> Self {
        let (width, height) = map.pixel_size();
        Self::new(width, height, capacity)
    }

    /// Clear both trees and index every living unit.
    ///
    /// Accepts `&UnitRecord` or `Option<&UnitRecord>` items; `None` slots and
    /// dead units are skipped. Airborne air units go into the air tree;
    /// everything else, grounded air units included, goes into the ground tree.
    pub fn rebuild<'a, I, R>(&mut self, units: I)
    where
        I: IntoIterator<Item = R>,
        R: Into<Option<&'a UnitRecord>>,
    {
        self.ground_tree.clear();
        self.air_tree.clear();

        for unit in units {
            let Some(unit): Option<&UnitRecord> = unit.into() else {
                continue;
            };
            if !unit.is_alive() {
                continue;
            }
            let entry = SpatialEntry::from_record(unit);
            if unit.is_airborne() {
                self.air_tree.insert(entry);
            } else {
                self.ground_tree.insert(entry);
            }
        }
    }

    /// Ground-plane entities within `radius` of `(x, y)`.
    pub fn query_nearby_ground(&mut self, x: f32, y: f32, radius: f32, exclude_id: Option<u32>) -> &[SpatialEntry] {
        self.ground_results.clear();
        self.ground_tree
            .query_circle_into(x, y, radius * radius, exclude_id, &mut self.ground_results);
        &self.ground_results
    }

    /// Airborne entities within `radius` of `(x, y)`.
    pub fn query_nearby_air(&mut self, x: f32, y: f32, radius: f32, exclude_id: Option<u32>) -> &[SpatialEntry] {
        self.air_results.clear();
        self.air_tree
            .query_circle_into(x, y, radius * radius, exclude_id, &mut self.air_results);
        &self.air_results
    }

    /// Query the tree matching the caller's own flight state.
    pub fn query_nearby_for_unit(
        &mut self,
        x: f32,
        y: f32,
        radius: f32,
        is_airborne: bool,
        exclude_id: Option<u32>,
    ) -> &[SpatialEntry] {
        if is_airborne {
            self.query_nearby_air(x, y, radius, exclude_id)
        } else {
            self.query_nearby_ground(x, y, radius, exclude_id)
        }
    }

    pub fn ground_tree(&self) -> &QuadtreeNode<SpatialEntry> {
        &self.ground_tree
    }

    pub fn air_tree(&self) -> &QuadtreeNode<SpatialEntry> {
        &self.air_tree
    }

    /// Entities in the ground tree.
    pub fn ground_len(&self) -> usize {
        self.ground_tree.len()
    }

    /// Entities in the air tree.
    pub fn air_len(&self) -> usize {
        self.air_tree.len()
    }
}

/// Closest entry in `results` not owned by `owner`.
pub fn nearest_enemy(results: &[SpatialEntry], owner: u8, x: f32, y: f32) -> Option<SpatialEntry> {
    results
        .iter()
        .filter(|e| e.owner != owner)
        .min_by(|a, b| a.distance_sq_to(x, y).total_cmp(&b.distance_sq_to(x, y)))
        .copied()
}

/// System that rebuilds the spatial quadtree each tick.
///
/// Does nothing when the index was never initialized.
pub fn spatial_quadtree_rebuild_system(tree: Option<ResMut<SpatialQuadtree>>, units: Res<TickUnits>) {
    let Some(mut tree) = tree else {
        return;
    };
    tree.rebuild(&units.units);
    tracing::debug!(
        ground = tree.ground_len(),
        air = tree.air_len(),
        "spatial quadtree rebuilt"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::FlightState;
    use crate::geometry::TileCoord;

    fn index() -> SpatialQuadtree {
        SpatialQuadtree::new(640.0, 640.0, 4)
    }

    #[test]
    fn test_rebuild_and_query_ground() {
        let mut tree = index();
        let units = [
            UnitRecord::ground(1, 0, TileCoord::new(1, 1)),
            UnitRecord::ground(2, 0, TileCoord::new(2, 1)),
            UnitRecord::ground(3, 1, TileCoord::new(15, 15)),
        ];
        tree.rebuild(&units);
        assert_eq!(tree.ground_len(), 3);
        assert_eq!(tree.air_len(), 0);

        // Unit 1's center is (48, 48), unit 2's is (80, 48).
        let nearby = tree.query_nearby_ground(48.0, 48.0, 40.0, None);
        let mut ids: Vec<_> = nearby.iter().map(|e| e.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);

        let nearby = tree.query_nearby_ground(48.0, 48.0, 31.0, None);
        assert_eq!(nearby.len(), 1);
    }

    #[test]
    fn test_query_excludes_caller() {
        let mut tree = index();
        let units: Vec<_> = (0..20)
            .map(|i| UnitRecord::ground(i, 0, TileCoord::new(i as i32 % 5, i as i32 / 5)))
            .collect();
        tree.rebuild(&units);
        assert!(tree.ground_tree().is_divided());

        let nearby = tree.query_nearby_ground(48.0, 48.0, 500.0, Some(6));
        assert_eq!(nearby.len(), 19);
        assert!(nearby.iter().all(|e| e.id != 6));
    }

    #[test]
    fn test_query_returns_same_buffer() {
        let mut tree = index();
        tree.rebuild(&[UnitRecord::ground(1, 0, TileCoord::new(3, 3))]);

        let first = tree.query_nearby_ground(100.0, 100.0, 64.0, None).as_ptr();
        let second = tree.query_nearby_ground(100.0, 100.0, 64.0, None).as_ptr();
        assert_eq!(first, second);

        let first_air = tree.query_nearby_air(0.0, 0.0, 10.0, None).as_ptr();
        let second_air = tree.query_nearby_air(300.0, 300.0, 10.0, None).as_ptr();
        assert_eq!(first_air, second_air);
    }

    #[test]
    fn test_flight_state_selects_tree() {
        let mut tree = index();
        let landed = UnitRecord::air(1, 0, TileCoord::new(5, 5), FlightState::Grounded);
        let flying = UnitRecord::air(2, 0, TileCoord::new(5, 5), FlightState::Airborne);
        tree.rebuild(&[landed, flying]);

        let (x, y) = landed.center();
        let ground: Vec<_> = tree.query_nearby_ground(x, y, 1.0, None).iter().map(|e| e.id).collect();
        let air: Vec<_> = tree.query_nearby_air(x, y, 1.0, None).iter().map(|e| e.id).collect();
        assert_eq!(ground, vec![1]);
        assert_eq!(air, vec![2]);

        assert_eq!(tree.query_nearby_for_unit(x, y, 1.0, true, None)[0].id, 2);
        assert_eq!(tree.query_nearby_for_unit(x, y, 1.0, false, None)[0].id, 1);
    }

    #[test]
    fn test_rebuild_skips_dead_and_missing() {
        let mut tree = index();
        let alive = UnitRecord::ground(1, 0, TileCoord::new(1, 1));
        let mut dead = UnitRecord::ground(2, 0, TileCoord::new(2, 2));
        dead.health = 0.0;
        tree.rebuild(vec![Some(&alive), None, Some(&dead)]);
        assert_eq!(tree.ground_len(), 1);

        // Rebuild replaces the previous contents.
        tree.rebuild(std::iter::empty::<&UnitRecord>());
        assert_eq!(tree.ground_len(), 0);
    }

    #[test]
    fn test_building_center_uses_footprint() {
        let mut tree = index();
        let building = UnitRecord {
            kind: UnitKind::Building,
            footprint: Some((2, 2)),
            ..UnitRecord::ground(1, 0, TileCoord::new(4, 4))
        };
        tree.rebuild(&[building]);
        let found = tree.query_nearby_ground(160.0, 160.0, 0.5, None);
        assert_eq!(found.len(), 1);
        assert_eq!((found[0].cx, found[0].cy), (160.0, 160.0));
    }

    #[test]
    fn test_default_is_inert() {
        let mut tree = SpatialQuadtree::default();
        tree.rebuild(&[UnitRecord::ground(1, 0, TileCoord::new(0, 0))]);
        assert_eq!(tree.ground_len(), 0);
        assert!(tree.query_nearby_ground(0.0, 0.0, 1000.0, None).is_empty());
    }

    #[test]
    fn test_nearest_enemy() {
        let mut tree = index();
        tree.rebuild(&[
            UnitRecord::ground(1, 0, TileCoord::new(0, 0)),
            UnitRecord::ground(2, 1, TileCoord::new(6, 0)),
            UnitRecord::ground(3, 1, TileCoord::new(3, 0)),
            UnitRecord::ground(4, 0, TileCoord::new(1, 0)),
        ]);
        let results = tree.query_nearby_ground(16.0, 16.0, 400.0, Some(1));
        let nearest = nearest_enemy(results, 0, 16.0, 16.0);
        assert_eq!(nearest.map(|e| e.id), Some(3));
        assert!(nearest_enemy(&[], 0, 0.0, 0.0).is_none());
    }
}
