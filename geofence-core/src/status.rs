//! Geofence Service Status Codes
//!
//! Result codes reported by the geofencing service when registering or
//! removing geofences, with their fixed user-facing messages.

use serde::{Deserialize, Serialize};

pub const GEOFENCE_NOT_AVAILABLE: i32 = 1000;
pub const GEOFENCE_TOO_MANY_GEOFENCES: i32 = 1001;
pub const GEOFENCE_TOO_MANY_PENDING_INTENTS: i32 = 1002;
/// Generic failure code used for errors outside the geofence range
pub const ERROR: i32 = 13;

const NOT_AVAILABLE_MESSAGE: &str =
    "Geofence service is not available now. Typically this is because the user turned off location access in settings > location access.";
const TOO_MANY_GEOFENCES_MESSAGE: &str =
    "Your app has registered more than 100 geofences. Remove unused ones before adding new geofences.";
const TOO_MANY_PENDING_INTENTS_MESSAGE: &str =
    "You have provided more than 5 different PendingIntents to the addGeofences() call.";
const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error: the Geofence service is not available now.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeofenceStatusCode {
    NotAvailable,
    TooManyGeofences,
    TooManyPendingIntents,
    /// Any other code, kept verbatim
    Unknown(i32),
}

impl GeofenceStatusCode {
    pub fn from_code(code: i32) -> Self {
        match code {
            GEOFENCE_NOT_AVAILABLE => GeofenceStatusCode::NotAvailable,
            GEOFENCE_TOO_MANY_GEOFENCES => GeofenceStatusCode::TooManyGeofences,
            GEOFENCE_TOO_MANY_PENDING_INTENTS => GeofenceStatusCode::TooManyPendingIntents,
            other => GeofenceStatusCode::Unknown(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            GeofenceStatusCode::NotAvailable => GEOFENCE_NOT_AVAILABLE,
            GeofenceStatusCode::TooManyGeofences => GEOFENCE_TOO_MANY_GEOFENCES,
            GeofenceStatusCode::TooManyPendingIntents => GEOFENCE_TOO_MANY_PENDING_INTENTS,
            GeofenceStatusCode::Unknown(code) => code,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GeofenceStatusCode::NotAvailable => "GEOFENCE_NOT_AVAILABLE",
            GeofenceStatusCode::TooManyGeofences => "GEOFENCE_TOO_MANY_GEOFENCES",
            GeofenceStatusCode::TooManyPendingIntents => "GEOFENCE_TOO_MANY_PENDING_INTENTS",
            GeofenceStatusCode::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// User-facing message for this code
    pub fn message(self) -> &'static str {
        match self {
            GeofenceStatusCode::NotAvailable => NOT_AVAILABLE_MESSAGE,
            GeofenceStatusCode::TooManyGeofences => TOO_MANY_GEOFENCES_MESSAGE,
            GeofenceStatusCode::TooManyPendingIntents => TOO_MANY_PENDING_INTENTS_MESSAGE,
            GeofenceStatusCode::Unknown(_) => UNKNOWN_ERROR_MESSAGE,
        }
    }
}

impl std::fmt::Display for GeofenceStatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

/// Message for a raw status code
pub fn error_message(code: i32) -> &'static str {
    GeofenceStatusCode::from_code(code).message()
}
