//! Error types for the geofence core

use thiserror::Error;

/// Errors returned by the registry, the evaluator and the configuration loader
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeofenceError {
    #[error("Geofence '{0}' is already registered")]
    DuplicateId(String),

    #[error("Invalid position sample: {0}")]
    InvalidSample(String),

    #[error("Invalid geofence: {0}")]
    InvalidGeofence(String),

    #[error("Invalid landmark configuration: {0}")]
    Config(String),
}
