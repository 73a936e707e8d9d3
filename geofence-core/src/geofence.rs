//! Geofence Definitions
//!
//! A geofence is a circular region with an identifier, an expiry time and a
//! mask of the transitions it reports. Geofences are immutable once built;
//! use [`GeofenceBuilder`] to create them.
//!
//! # Example
//!
//! ```rust
//! use geofence_core::{GeofenceBuilder, TriggerMask};
//!
//! let geofence = GeofenceBuilder::new()
//!     .set_request_id("SFO")
//!     .set_circular_region(37.621313, -122.378955, 1609.0)
//!     .set_expiration_duration(12 * 60 * 60 * 1000)
//!     .set_transition_types(TriggerMask::ENTER | TriggerMask::EXIT)
//!     .build(0)
//!     .unwrap();
//!
//! assert_eq!(geofence.id(), "SFO");
//! assert_eq!(geofence.expires_at_ms(), 12 * 60 * 60 * 1000);
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::GeofenceError;
use crate::geo::LatLng;

/// Expiration duration for a geofence that is never evicted
pub const NEVER_EXPIRE: u64 = u64::MAX;

bitflags! {
    /// Transition kinds a geofence reports.
    ///
    /// Bit values match the platform transition constants
    /// (ENTER = 1, EXIT = 2).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct TriggerMask: u8 {
        const ENTER = 1;
        const EXIT = 2;
    }
}

bitflags! {
    /// Which transitions fire on the very first observation of a geofence.
    ///
    /// With no flags set the first observation only establishes the
    /// inside/outside baseline.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct InitialTrigger: u8 {
        const ENTER = 1;
        const EXIT = 2;
    }
}

impl Default for TriggerMask {
    fn default() -> Self {
        TriggerMask::ENTER | TriggerMask::EXIT
    }
}

impl Default for InitialTrigger {
    fn default() -> Self {
        InitialTrigger::empty()
    }
}

/// A monitored circular region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geofence {
    id: String,
    center: LatLng,
    radius_meters: f32,
    trigger_mask: TriggerMask,
    created_at_ms: u64,
    expires_at_ms: u64,
}

impl Geofence {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn radius_meters(&self) -> f32 {
        self.radius_meters
    }

    pub fn trigger_mask(&self) -> TriggerMask {
        self.trigger_mask
    }

    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    pub fn expires_at_ms(&self) -> u64 {
        self.expires_at_ms
    }

    /// A geofence is active while `now_ms < expires_at_ms`
    pub fn is_active(&self, now_ms: u64) -> bool {
        self.expires_at_ms > now_ms
    }
}

/// Builder for [`Geofence`], validating every field on [`build`](Self::build)
#[derive(Debug, Clone, Default)]
pub struct GeofenceBuilder {
    request_id: Option<String>,
    region: Option<(LatLng, f32)>,
    expiration_ms: Option<u64>,
    transition_types: TriggerMask,
}

impl GeofenceBuilder {
    pub fn new() -> Self {
        GeofenceBuilder::default()
    }

    pub fn set_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn set_circular_region(
        mut self,
        latitude: f64,
        longitude: f64,
        radius_meters: f32,
    ) -> Self {
        self.region = Some((LatLng::new(latitude, longitude), radius_meters));
        self
    }

    /// Time to live in milliseconds, counted from the build time.
    /// Defaults to [`NEVER_EXPIRE`].
    pub fn set_expiration_duration(mut self, duration_ms: u64) -> Self {
        self.expiration_ms = Some(duration_ms);
        self
    }

    pub fn set_transition_types(mut self, mask: TriggerMask) -> Self {
        self.transition_types = mask;
        self
    }

    /// Build the geofence with `created_at_ms` as its creation time
    pub fn build(self, created_at_ms: u64) -> Result<Geofence, GeofenceError> {
        let id = match self.request_id {
            Some(id) if !id.is_empty() => id,
            _ => {
                return Err(GeofenceError::InvalidGeofence(
                    "request id must not be empty".to_string(),
                ))
            }
        };

        let (center, radius_meters) = self.region.ok_or_else(|| {
            GeofenceError::InvalidGeofence(format!("{}: circular region not set", id))
        })?;

        if !center.is_valid() {
            return Err(GeofenceError::InvalidGeofence(format!(
                "{}: invalid center {}",
                id, center
            )));
        }
        if !radius_meters.is_finite() || radius_meters <= 0.0 {
            return Err(GeofenceError::InvalidGeofence(format!(
                "{}: radius must be positive, got {}",
                id, radius_meters
            )));
        }
        if self.transition_types.is_empty() {
            return Err(GeofenceError::InvalidGeofence(format!(
                "{}: no transition types set",
                id
            )));
        }

        let duration = self.expiration_ms.unwrap_or(NEVER_EXPIRE);

        Ok(Geofence {
            id,
            center,
            radius_meters,
            trigger_mask: self.transition_types,
            created_at_ms,
            expires_at_ms: created_at_ms.saturating_add(duration),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sfo() -> GeofenceBuilder {
        GeofenceBuilder::new()
            .set_request_id("SFO")
            .set_circular_region(37.621313, -122.378955, 1609.0)
    }

    #[test]
    fn test_build_defaults() {
        let g = sfo().build(1_000).unwrap();
        assert_eq!(g.id(), "SFO");
        assert_eq!(g.radius_meters(), 1609.0);
        assert_eq!(g.trigger_mask(), TriggerMask::ENTER | TriggerMask::EXIT);
        assert_eq!(g.created_at_ms(), 1_000);
        assert_eq!(g.expires_at_ms(), NEVER_EXPIRE);
    }

    #[test]
    fn test_expiry() {
        let g = sfo().set_expiration_duration(500).build(1_000).unwrap();
        assert_eq!(g.expires_at_ms(), 1_500);
        assert!(g.is_active(1_499));
        assert!(!g.is_active(1_500));
    }

    #[test]
    fn test_rejects_missing_id() {
        let err = GeofenceBuilder::new()
            .set_circular_region(0.0, 0.0, 10.0)
            .build(0)
            .unwrap_err();
        assert!(matches!(err, GeofenceError::InvalidGeofence(_)));

        assert!(GeofenceBuilder::new()
            .set_request_id("")
            .set_circular_region(0.0, 0.0, 10.0)
            .build(0)
            .is_err());
    }

    #[test]
    fn test_rejects_bad_region() {
        assert!(GeofenceBuilder::new().set_request_id("X").build(0).is_err());
        assert!(sfo().set_circular_region(91.0, 0.0, 10.0).build(0).is_err());
        assert!(sfo().set_circular_region(0.0, 0.0, 0.0).build(0).is_err());
        assert!(sfo().set_circular_region(0.0, 0.0, f32::NAN).build(0).is_err());
    }

    #[test]
    fn test_rejects_empty_mask() {
        let err = sfo()
            .set_transition_types(TriggerMask::empty())
            .build(0)
            .unwrap_err();
        assert_eq!(
            err,
            GeofenceError::InvalidGeofence("SFO: no transition types set".to_string())
        );
    }

    #[test]
    fn test_trigger_mask_bits() {
        assert_eq!(TriggerMask::ENTER.bits(), 1);
        assert_eq!(TriggerMask::EXIT.bits(), 2);
        assert!(InitialTrigger::default().is_empty());
    }
}
