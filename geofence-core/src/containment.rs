//! Containment Evaluation
//!
//! Pure geometry: given a position sample and the active geofences, decide
//! for each geofence whether the sample lies inside its circle. No
//! transition decisions are made here; see [`crate::transition`].

use serde::{Deserialize, Serialize};

use crate::error::GeofenceError;
use crate::geo::LatLng;
use crate::geofence::{Geofence, TriggerMask};

/// A single position fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSample {
    pub position: LatLng,
    /// Sample time, milliseconds since epoch
    pub timestamp_ms: u64,
}

impl PositionSample {
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: u64) -> Self {
        PositionSample {
            position: LatLng::new(latitude, longitude),
            timestamp_ms,
        }
    }

    /// Reject non-finite or out-of-range coordinates
    pub fn validate(&self) -> Result<(), GeofenceError> {
        if self.position.is_valid() {
            Ok(())
        } else {
            Err(GeofenceError::InvalidSample(format!(
                "coordinates {} out of range",
                self.position
            )))
        }
    }
}

/// Last known containment of one geofence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainmentState {
    pub is_inside: bool,
    pub updated_at_ms: u64,
}

/// Result of evaluating one geofence against one sample
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub geofence_id: String,
    pub trigger_mask: TriggerMask,
    pub distance_meters: f64,
    pub state: ContainmentState,
}

/// Whether `position` lies inside the circle of `geofence` (boundary inclusive)
pub fn contains(geofence: &Geofence, position: &LatLng) -> bool {
    geofence.center().distance_to(position) <= geofence.radius_meters() as f64
}

/// Evaluate `sample` against every geofence, in the order given.
///
/// Returns [`GeofenceError::InvalidSample`] without evaluating anything if
/// the sample coordinates are malformed.
pub fn evaluate(
    sample: &PositionSample,
    geofences: &[Geofence],
) -> Result<Vec<Observation>, GeofenceError> {
    sample.validate()?;

    Ok(geofences
        .iter()
        .map(|geofence| {
            let distance_meters = geofence.center().distance_to(&sample.position);
            Observation {
                geofence_id: geofence.id().to_string(),
                trigger_mask: geofence.trigger_mask(),
                distance_meters,
                state: ContainmentState {
                    is_inside: distance_meters <= geofence.radius_meters() as f64,
                    updated_at_ms: sample.timestamp_ms,
                },
            }
        })
        .collect())
}
