//! RTS Simulation Core
//!
//! A deterministic, fixed-timestep ECS simulation built around three spatial
//! structures rebuilt every tick: a ground/air quadtree for proximity
//! queries, a tile occupancy grid, and an A* tile pathfinder.
//! Uses `bevy_ecs` for the entity-component-system architecture.

pub mod api;
pub mod components;
pub mod config;
pub mod error;
pub mod geometry;
pub mod mines;
pub mod occupancy;
pub mod pathfinding;
pub mod quadtree;
pub mod records;
pub mod spatial;
pub mod systems;
pub mod terrain;
pub mod world;

pub use api::SimWorld;
pub use components::*;
pub use config::SimConfig;
pub use error::SimError;
pub use geometry::{Aabb, Quadrant, TileCoord, TILE_SIZE};
pub use mines::{MineField, MineLookup};
pub use occupancy::{OccupancyGrid, RemoveOccupancyOptions};
pub use pathfinding::{find_path, find_path_for_owner, PathOptions};
pub use quadtree::{QuadtreeItem, QuadtreeNode};
pub use records::{TickUnits, UnitRecord, WreckRecord};
pub use spatial::{nearest_enemy, SpatialEntry, SpatialQuadtree};
pub use systems::*;
pub use terrain::{MapGrid, MapTile, TileTraits, TileType};
pub use world::{Snapshot, UnitSnapshot};
