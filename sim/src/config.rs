//! Simulation configuration.

use crate::error::SimError;
use crate::quadtree::DEFAULT_CAPACITY;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Tuning values for the simulation loop and its spatial queries.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed timestep in seconds (e.g., 1/30 = 0.0333 for 30 Hz).
    pub fixed_timestep: f32,
    /// Items a quadtree leaf holds before subdividing.
    pub quadtree_capacity: usize,
    /// Node-expansion budget for a single path search. `None` scales the
    /// budget with the map so every reachable goal is found.
    pub path_max_nodes: Option<usize>,
    /// Ticks a unit waits on an occupied tile before asking for a new path.
    pub repath_after_blocked_ticks: u32,
    /// Threat scan radius as a multiple of weapon range.
    pub threat_radius_factor: f32,
    /// Radius in pixels within which support units look for patients.
    pub support_search_radius: f32,
    /// Health fraction below which AI units under threat retreat.
    pub retreat_health_fraction: f32,
    /// How far (in tiles) a retreating unit runs from its nearest threat.
    pub retreat_distance_tiles: i32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 30.0, // 30 Hz
            quadtree_capacity: DEFAULT_CAPACITY,
            path_max_nodes: None,
            repath_after_blocked_ticks: 15,
            threat_radius_factor: 1.5,
            support_search_radius: 320.0, // 10 tiles
            retreat_health_fraction: 0.3,
            retreat_distance_tiles: 8,
        }
    }
}

impl SimConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.fixed_timestep > 0.0 && self.fixed_timestep.is_finite()) {
            return Err(SimError::InvalidConfig(format!(
                "fixed_timestep must be positive, got {}",
                self.fixed_timestep
            )));
        }
        if self.quadtree_capacity == 0 {
            return Err(SimError::InvalidConfig("quadtree_capacity must be at least 1".into()));
        }
        if self.path_max_nodes == Some(0) {
            return Err(SimError::InvalidConfig("path_max_nodes must be at least 1".into()));
        }
        if self.support_search_radius < 0.0 || self.threat_radius_factor < 0.0 {
            return Err(SimError::InvalidConfig("search radii must not be negative".into()));
        }
        if !(0.0..=1.0).contains(&self.retreat_health_fraction) {
            return Err(SimError::InvalidConfig(format!(
                "retreat_health_fraction must be within 0..=1, got {}",
                self.retreat_health_fraction
            )));
        }
        Ok(())
    }
}
