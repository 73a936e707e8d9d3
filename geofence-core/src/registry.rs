//! Geofence Registry
//!
//! Holds the monitored geofences in insertion order together with the last
//! known [`ContainmentState`] of each. Expired geofences are evicted lazily
//! whenever the active set is queried.

use std::collections::HashMap;

use crate::containment::ContainmentState;
use crate::error::GeofenceError;
use crate::geofence::Geofence;

#[derive(Debug, Default)]
pub struct GeofenceRegistry {
    geofences: Vec<Geofence>,
    containment: HashMap<String, ContainmentState>,
}

impl GeofenceRegistry {
    pub fn new() -> Self {
        GeofenceRegistry::default()
    }

    /// Register a geofence. Ids must be unique.
    pub fn add(&mut self, geofence: Geofence) -> Result<(), GeofenceError> {
        if self.contains(geofence.id()) {
            return Err(GeofenceError::DuplicateId(geofence.id().to_string()));
        }
        self.geofences.push(geofence);
        Ok(())
    }

    /// Register a batch of geofences; either all of them are added or none.
    pub fn add_all(&mut self, geofences: Vec<Geofence>) -> Result<(), GeofenceError> {
        for (i, geofence) in geofences.iter().enumerate() {
            let repeated = geofences[..i].iter().any(|g| g.id() == geofence.id());
            if repeated || self.contains(geofence.id()) {
                return Err(GeofenceError::DuplicateId(geofence.id().to_string()));
            }
        }
        self.geofences.extend(geofences);
        Ok(())
    }

    /// Remove a geofence and its containment state. Absent ids are ignored.
    pub fn remove(&mut self, id: &str) -> Option<Geofence> {
        let index = self.geofences.iter().position(|g| g.id() == id)?;
        self.containment.remove(id);
        Some(self.geofences.remove(index))
    }

    /// Remove every geofence, returning their ids in insertion order
    pub fn clear(&mut self) -> Vec<String> {
        self.containment.clear();
        self.geofences
            .drain(..)
            .map(|g| g.id().to_string())
            .collect()
    }

    /// Drop geofences with `expires_at_ms <= now_ms`; returns the evicted ids
    pub fn evict_expired(&mut self, now_ms: u64) -> Vec<String> {
        let mut evicted = Vec::new();
        let containment = &mut self.containment;
        self.geofences.retain(|g| {
            if g.is_active(now_ms) {
                true
            } else {
                containment.remove(g.id());
                evicted.push(g.id().to_string());
                false
            }
        });
        evicted
    }

    /// Geofences still active at `now_ms`, in insertion order.
    /// Expired entries are evicted as a side effect.
    pub fn list_active(&mut self, now_ms: u64) -> Vec<Geofence> {
        self.evict_expired(now_ms);
        self.geofences.clone()
    }

    pub fn get(&self, id: &str) -> Option<&Geofence> {
        self.geofences.iter().find(|g| g.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.geofences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geofences.is_empty()
    }

    pub fn containment(&self, id: &str) -> Option<&ContainmentState> {
        self.containment.get(id)
    }

    /// Store the latest containment of a registered geofence.
    ///
    /// Returns false (and stores nothing) if the id is not registered.
    pub fn record_containment(&mut self, id: &str, state: ContainmentState) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.containment.insert(id.to_string(), state);
        true
    }
}
