//! ECS Systems for the RTS simulation.
//!
//! Systems contain the game logic that operates on components.
//!
//! ## System Order
//!
//! One tick runs these groups strictly in sequence:
//!
//! **Group 1 (Spatial)** - Rebuild per-tick spatial data:
//! - `unit_record_system` - Gathers flat unit and wreck records
//! - `occupancy_rebuild_system` - Rebuilds the occupancy grid
//! - `spatial_quadtree_rebuild_system` - Rebuilds the ground and air trees
//!
//! **Group 2 (AI)** - Reads the quadtree:
//! - `threat_awareness_system` - Scans for enemies
//! - `ai_order_system` - Retreats or holds based on threats
//!
//! **Group 3 (Orders)** - Turns orders into paths:
//! - `path_request_system` - Runs A* for changed orders
//!
//! **Group 4 (Targeting)** - Reads the quadtree:
//! - `targeting_system` - Picks weapon targets
//! - `support_assignment_system` - Picks patients for support units
//!
//! **Group 5 (Movement)**:
//! - `path_following_system` - Walks paths and updates occupancy

pub mod ai;
pub mod combat;
pub mod gather;
pub mod movement;
pub mod pathing;
pub mod support;

pub use ai::*;
pub use combat::*;
pub use gather::*;
pub use movement::*;
pub use pathing::*;
pub use support::*;
