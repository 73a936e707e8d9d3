//! Landmark Configuration
//!
//! The set of monitored landmarks is configuration data, loaded from JSON:
//!
//! ```json
//! {
//!   "radius_meters": 1609,
//!   "expiration_hours": 12,
//!   "landmarks": [
//!     { "id": "SFO", "latitude": 37.621313, "longitude": -122.378955 },
//!     { "id": "GOOGLE", "latitude": 37.422611, "longitude": -122.0840577 }
//!   ]
//! }
//! ```
//!
//! `radius_meters`, `expiration_hours` and `transitions` (e.g. `"ENTER | EXIT"`)
//! are optional and default to the bay-area values below.

use serde::{Deserialize, Serialize};

use crate::error::GeofenceError;
use crate::geofence::{Geofence, GeofenceBuilder, TriggerMask};

/// 1 mile
pub const DEFAULT_RADIUS_METERS: f32 = 1609.0;
pub const DEFAULT_EXPIRATION_HOURS: u64 = 12;
pub const HOUR_MS: u64 = 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Landmark {
    pub fn new(id: &str, latitude: f64, longitude: f64) -> Self {
        Landmark {
            id: id.to_string(),
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkConfig {
    #[serde(default = "default_radius")]
    pub radius_meters: f32,
    #[serde(default = "default_expiration")]
    pub expiration_hours: u64,
    #[serde(default)]
    pub transitions: TriggerMask,
    pub landmarks: Vec<Landmark>,
}

fn default_radius() -> f32 {
    DEFAULT_RADIUS_METERS
}

fn default_expiration() -> u64 {
    DEFAULT_EXPIRATION_HOURS
}

impl LandmarkConfig {
    /// Airports and offices in the San Francisco bay area
    pub fn bay_area() -> Self {
        LandmarkConfig {
            radius_meters: DEFAULT_RADIUS_METERS,
            expiration_hours: DEFAULT_EXPIRATION_HOURS,
            transitions: TriggerMask::ENTER | TriggerMask::EXIT,
            landmarks: vec![
                Landmark::new("SFO", 37.621313, -122.378955),
                Landmark::new("GOOGLE", 37.422611, -122.0840577),
            ],
        }
    }

    pub fn from_json(json: &str) -> Result<Self, GeofenceError> {
        let config: LandmarkConfig =
            serde_json::from_str(json).map_err(|e| GeofenceError::Config(e.to_string()))?;
        if config.landmarks.is_empty() {
            return Err(GeofenceError::Config("no landmarks defined".to_string()));
        }
        Ok(config)
    }

    pub fn expiration_ms(&self) -> u64 {
        self.expiration_hours.saturating_mul(HOUR_MS)
    }

    /// Build one geofence per landmark, in configuration order
    pub fn to_geofences(&self, now_ms: u64) -> Result<Vec<Geofence>, GeofenceError> {
        self.landmarks
            .iter()
            .map(|landmark| {
                GeofenceBuilder::new()
                    .set_request_id(landmark.id.as_str())
                    .set_circular_region(landmark.latitude, landmark.longitude, self.radius_meters)
                    .set_expiration_duration(self.expiration_ms())
                    .set_transition_types(self.transitions)
                    .build(now_ms)
            })
            .collect()
    }
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        LandmarkConfig::bay_area()
    }
}
