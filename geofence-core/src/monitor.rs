//! Geofence Monitor
//!
//! Ties the registry, the containment evaluator and the transition tracker
//! together and keeps their state consistent: a geofence has containment
//! and tracker state only while it is registered and not expired.
//!
//! # Example
//!
//! ```rust
//! use geofence_core::{GeofenceMonitor, InitialTrigger, LandmarkConfig, PositionSample};
//!
//! let mut monitor = GeofenceMonitor::new();
//! let geofences = LandmarkConfig::bay_area().to_geofences(0).unwrap();
//! monitor.register(geofences, InitialTrigger::empty()).unwrap();
//!
//! // At SFO: establishes the baseline, no event
//! let events = monitor.process_sample(&PositionSample::new(37.621313, -122.378955, 1)).unwrap();
//! assert!(events.is_empty());
//!
//! // At Google: leave SFO, enter GOOGLE
//! let events = monitor.process_sample(&PositionSample::new(37.422611, -122.0840577, 2)).unwrap();
//! assert_eq!(events.len(), 2);
//! ```

use crate::containment::{self, ContainmentState, PositionSample};
use crate::error::GeofenceError;
use crate::geofence::{Geofence, InitialTrigger};
use crate::registry::GeofenceRegistry;
use crate::transition::{TrackedState, TransitionEvent, TransitionTracker};

#[derive(Debug, Default)]
pub struct GeofenceMonitor {
    registry: GeofenceRegistry,
    tracker: TransitionTracker,
}

impl GeofenceMonitor {
    pub fn new() -> Self {
        GeofenceMonitor::default()
    }

    /// Register a batch of geofences atomically
    pub fn register(
        &mut self,
        geofences: Vec<Geofence>,
        initial_trigger: InitialTrigger,
    ) -> Result<(), GeofenceError> {
        let ids: Vec<String> = geofences.iter().map(|g| g.id().to_string()).collect();
        self.registry.add_all(geofences)?;
        for id in &ids {
            self.tracker.track(id, initial_trigger);
        }
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<Geofence> {
        self.tracker.forget(id);
        self.registry.remove(id)
    }

    /// Remove every geofence; returns the removed ids
    pub fn unregister_all(&mut self) -> Vec<String> {
        self.tracker.clear();
        self.registry.clear()
    }

    /// Evaluate one position sample and return the resulting transitions.
    ///
    /// A malformed sample is rejected before any state is touched,
    /// including expiry.
    pub fn process_sample(
        &mut self,
        sample: &PositionSample,
    ) -> Result<Vec<TransitionEvent>, GeofenceError> {
        sample.validate()?;

        let active = self.active_geofences(sample.timestamp_ms);
        let observations = containment::evaluate(sample, &active)?;
        for obs in &observations {
            self.registry.record_containment(&obs.geofence_id, obs.state);
        }

        Ok(self.tracker.observe(&observations, sample.timestamp_ms))
    }

    /// Active geofences at `now_ms`; expired ones are purged
    pub fn active_geofences(&mut self, now_ms: u64) -> Vec<Geofence> {
        for id in self.registry.evict_expired(now_ms) {
            self.tracker.forget(&id);
        }
        self.registry.list_active(now_ms)
    }

    pub fn containment(&self, id: &str) -> Option<&ContainmentState> {
        self.registry.containment(id)
    }

    pub fn tracked_state(&self, id: &str) -> TrackedState {
        self.tracker.state(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.registry.contains(id)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geofence::GeofenceBuilder;
    use crate::landmarks::LandmarkConfig;
    use crate::transition::TransitionKind;

    const HOUR_MS: u64 = 60 * 60 * 1000;

    fn bay_area(monitor: &mut GeofenceMonitor) {
        let geofences = LandmarkConfig::bay_area().to_geofences(0).unwrap();
        monitor.register(geofences, InitialTrigger::empty()).unwrap();
    }

    #[test]
    fn test_sfo_scenario() {
        let mut monitor = GeofenceMonitor::new();
        bay_area(&mut monitor);

        let at_sfo = PositionSample::new(37.621313, -122.378955, 1_000);
        assert!(monitor.process_sample(&at_sfo).unwrap().is_empty());
        assert!(monitor.containment("SFO").unwrap().is_inside);

        // 0.02 degrees north is about 2.2 km away
        let away = PositionSample::new(37.641313, -122.378955, 2_000);
        let events = monitor.process_sample(&away).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TransitionKind::Exit);
        assert_eq!(events[0].geofence_ids, vec!["SFO"]);
        assert_eq!(events[0].occurred_at_ms, 2_000);

        assert!(monitor.process_sample(&away).unwrap().is_empty());
    }

    #[test]
    fn test_two_geofences_enter_together() {
        let mut monitor = GeofenceMonitor::new();
        let geofences = ["A", "B"]
            .iter()
            .map(|id| {
                GeofenceBuilder::new()
                    .set_request_id(*id)
                    .set_circular_region(10.0, 10.0, 500.0)
                    .build(0)
                    .unwrap()
            })
            .collect();
        monitor.register(geofences, InitialTrigger::empty()).unwrap();

        monitor.process_sample(&PositionSample::new(11.0, 10.0, 1)).unwrap();
        let events = monitor.process_sample(&PositionSample::new(10.0, 10.0, 2)).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TransitionKind::Enter);
        assert_eq!(events[0].geofence_ids, vec!["A", "B"]);
    }

    #[test]
    fn test_invalid_sample_leaves_state_unchanged() {
        let mut monitor = GeofenceMonitor::new();
        bay_area(&mut monitor);
        monitor
            .process_sample(&PositionSample::new(37.621313, -122.378955, 1))
            .unwrap();

        // Far past expiry, but rejected before eviction
        let bad = PositionSample::new(f64::NAN, -122.378955, 13 * HOUR_MS);
        assert!(matches!(
            monitor.process_sample(&bad),
            Err(GeofenceError::InvalidSample(_))
        ));
        assert_eq!(monitor.len(), 2);
        assert_eq!(monitor.tracked_state("SFO"), TrackedState::Inside);
        assert_eq!(monitor.containment("SFO").unwrap().updated_at_ms, 1);
    }

    #[test]
    fn test_expiry_purges_state() {
        let mut monitor = GeofenceMonitor::new();
        bay_area(&mut monitor);
        monitor
            .process_sample(&PositionSample::new(37.621313, -122.378955, 1))
            .unwrap();

        // Leaving SFO exactly at expiry produces nothing: the geofence is gone
        let events = monitor
            .process_sample(&PositionSample::new(0.0, 0.0, 12 * HOUR_MS))
            .unwrap();
        assert!(events.is_empty());
        assert!(monitor.is_empty());
        assert!(monitor.containment("SFO").is_none());
        assert_eq!(monitor.tracked_state("SFO"), TrackedState::Unknown);
    }

    #[test]
    fn test_reregister_starts_fresh() {
        let mut monitor = GeofenceMonitor::new();
        bay_area(&mut monitor);
        monitor
            .process_sample(&PositionSample::new(37.621313, -122.378955, 1))
            .unwrap();

        assert_eq!(monitor.unregister_all(), vec!["SFO", "GOOGLE"]);
        assert!(monitor.containment("SFO").is_none());

        bay_area(&mut monitor);
        // First observation after re-registration is silent again
        assert!(monitor
            .process_sample(&PositionSample::new(0.0, 0.0, 2))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_initial_trigger_on_register() {
        let mut monitor = GeofenceMonitor::new();
        let geofences = LandmarkConfig::bay_area().to_geofences(0).unwrap();
        monitor
            .register(geofences, InitialTrigger::ENTER | InitialTrigger::EXIT)
            .unwrap();

        let events = monitor
            .process_sample(&PositionSample::new(37.621313, -122.378955, 1))
            .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, TransitionKind::Enter);
        assert_eq!(events[0].geofence_ids, vec!["SFO"]);
        assert_eq!(events[1].kind, TransitionKind::Exit);
        assert_eq!(events[1].geofence_ids, vec!["GOOGLE"]);
    }

    #[test]
    fn test_remove_single() {
        let mut monitor = GeofenceMonitor::new();
        bay_area(&mut monitor);
        assert!(monitor.remove("SFO").is_some());
        assert!(monitor.remove("SFO").is_none());
        assert!(!monitor.contains("SFO"));
        assert!(monitor.contains("GOOGLE"));
    }
}
