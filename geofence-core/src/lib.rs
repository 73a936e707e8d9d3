//! Geofence Core
//!
//! Platform-independent geofencing: a registry of circular regions, a
//! containment evaluator, and a transition tracker that turns successive
//! position samples into ENTER/EXIT events.
//!
//! No I/O, no async and no clock: every operation takes its timestamp
//! (milliseconds since epoch) from the caller, so the same code runs in the
//! native server and in tests.
//!
//! # Data flow
//!
//! ```text
//! PositionSample -> containment::evaluate -> TransitionTracker -> TransitionEvent -> Notification
//!                         ^
//!                  GeofenceRegistry (active, not expired)
//! ```
//!
//! [`GeofenceMonitor`] wires the stages together.

pub mod containment;
pub mod error;
pub mod geo;
pub mod geofence;
pub mod landmarks;
pub mod monitor;
pub mod notification;
pub mod registry;
pub mod status;
pub mod transition;

pub use containment::{ContainmentState, Observation, PositionSample};
pub use error::GeofenceError;
pub use geo::{haversine_distance, LatLng, EARTH_RADIUS_METERS};
pub use geofence::{Geofence, GeofenceBuilder, InitialTrigger, TriggerMask, NEVER_EXPIRE};
pub use landmarks::{Landmark, LandmarkConfig};
pub use monitor::GeofenceMonitor;
pub use notification::{transition_details, Notification, NotificationTarget};
pub use registry::GeofenceRegistry;
pub use status::GeofenceStatusCode;
pub use transition::{TrackedState, TransitionEvent, TransitionKind, TransitionTracker};
