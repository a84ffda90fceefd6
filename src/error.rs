//! Error types for race_balance.
//!
//! Only construction-time work (track analysis, config loading) returns errors.
//! Per-tick degradations are logged and fall back to neutral values instead.

use thiserror::Error;

/// Result type alias using [`BalanceError`].
pub type Result<T> = std::result::Result<T, BalanceError>;

#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("track analysis needs at least 2 waypoints, found {found}")]
    NotEnoughWaypoints { found: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("could not parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("vehicle has no tunable field `{0}`")]
    MissingField(&'static str),
}
