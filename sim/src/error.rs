//! Errors raised while loading maps and configuration.
//!
//! The per-tick spatial APIs never fail; they return empty or neutral values
//! for bad input. Only construction-time loading reports errors.

use thiserror::Error;

/// Errors from building a simulation world or its inputs.
#[derive(Debug, Error)]
pub enum SimError {
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Map dimensions and tile data disagree.
    #[error("invalid map: {0}")]
    InvalidMap(String),
    /// A text map contains a character with no tile meaning.
    #[error("unknown map tile character {0:?}")]
    UnknownTile(char),
    /// JSON input failed to parse.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
