//! Geofence registration round trip
//!
//! [`GeofencingClient`] is the seam to the service that actually monitors
//! geofences. [`RegistrationTask`] drives it on behalf of the UI: it gates
//! calls on location permission, serializes them, and updates the
//! persisted "geofences added" flag when a call completes successfully.
//! Failures are reported once and never retried.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use geofence_core::status::{self, GeofenceStatusCode};
use geofence_core::{Geofence, GeofenceError, InitialTrigger, LandmarkConfig};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::app_state::{AppState, PendingTask};
use crate::error::ServerError;
use crate::preferences::{geofences_added, set_geofences_added, PreferenceStore};
use crate::{now_ms, SharedMonitor};

/// Per-app limit on registered geofences
pub const MAX_GEOFENCES: usize = 100;

pub const GEOFENCES_ADDED: &str = "Geofences added";
pub const GEOFENCES_REMOVED: &str = "Geofences removed";
pub const PERMISSION_DENIED_EXPLANATION: &str =
    "Permission was denied, but is needed for core functionality.";

/// A failed add/remove call, carrying the service status code
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{}", .code.message())]
pub struct RegistrationFailure {
    pub code: GeofenceStatusCode,
}

impl RegistrationFailure {
    pub fn new(code: GeofenceStatusCode) -> Self {
        RegistrationFailure { code }
    }

    pub fn from_code(code: i32) -> Self {
        RegistrationFailure::new(GeofenceStatusCode::from_code(code))
    }
}

#[derive(Debug, Clone)]
pub struct GeofencingRequest {
    pub geofences: Vec<Geofence>,
    pub initial_trigger: InitialTrigger,
}

impl GeofencingRequest {
    pub fn from_landmarks(
        landmarks: &LandmarkConfig,
        initial_trigger: InitialTrigger,
        now_ms: u64,
    ) -> Result<Self, GeofenceError> {
        Ok(GeofencingRequest {
            geofences: landmarks.to_geofences(now_ms)?,
            initial_trigger,
        })
    }

    fn has_duplicate_ids(&self) -> bool {
        self.geofences
            .iter()
            .enumerate()
            .any(|(i, g)| self.geofences[..i].iter().any(|other| other.id() == g.id()))
    }
}

#[async_trait]
pub trait GeofencingClient: Send + Sync {
    async fn add_geofences(&self, request: GeofencingRequest) -> Result<(), RegistrationFailure>;
    async fn remove_geofences(&self) -> Result<(), RegistrationFailure>;
}

/// In-process geofencing service backed by the shared monitor.
///
/// Geofences re-added under an existing id replace the old registration.
pub struct LocalGeofencingClient {
    monitor: SharedMonitor,
    available: AtomicBool,
}

impl LocalGeofencingClient {
    pub fn new(monitor: SharedMonitor) -> Self {
        LocalGeofencingClient {
            monitor,
            available: AtomicBool::new(true),
        }
    }

    /// Simulate location access being switched off (or back on)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    fn check_available(&self) -> Result<(), RegistrationFailure> {
        if self.available.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(RegistrationFailure::new(GeofenceStatusCode::NotAvailable))
        }
    }
}

#[async_trait]
impl GeofencingClient for LocalGeofencingClient {
    async fn add_geofences(&self, request: GeofencingRequest) -> Result<(), RegistrationFailure> {
        self.check_available()?;
        if request.has_duplicate_ids() {
            log::warn!("Request contains duplicate geofence ids");
            return Err(RegistrationFailure::from_code(status::ERROR));
        }

        let mut monitor = self.monitor.lock().await;
        let active = monitor.active_geofences(now_ms());
        let replaced = request
            .geofences
            .iter()
            .filter(|g| active.iter().any(|a| a.id() == g.id()))
            .count();
        if active.len() - replaced + request.geofences.len() > MAX_GEOFENCES {
            return Err(RegistrationFailure::new(GeofenceStatusCode::TooManyGeofences));
        }

        for geofence in &request.geofences {
            if monitor.remove(geofence.id()).is_some() {
                log::debug!("Replacing geofence {}", geofence.id());
            }
        }
        let count = request.geofences.len();
        monitor
            .register(request.geofences, request.initial_trigger)
            .map_err(|e| {
                log::warn!("{}", e);
                RegistrationFailure::from_code(status::ERROR)
            })?;
        log::debug!("Registered {} geofences, {} active", count, monitor.len());
        Ok(())
    }

    async fn remove_geofences(&self) -> Result<(), RegistrationFailure> {
        self.check_available()?;
        let removed = self.monitor.lock().await.unregister_all();
        log::debug!("Removed geofences {:?}", removed);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Add,
    Remove,
}

impl From<Operation> for PendingTask {
    fn from(operation: Operation) -> Self {
        match operation {
            Operation::Add => PendingTask::Add,
            Operation::Remove => PendingTask::Remove,
        }
    }
}

#[derive(Debug)]
struct RegistrationState {
    permission_granted: bool,
    pending: PendingTask,
}

pub struct RegistrationTask {
    client: Arc<dyn GeofencingClient>,
    preferences: Arc<dyn PreferenceStore>,
    landmarks: LandmarkConfig,
    initial_trigger: InitialTrigger,
    // Held for the whole round trip, so add/remove never overlap
    state: Mutex<RegistrationState>,
}

impl RegistrationTask {
    pub fn new(
        client: Arc<dyn GeofencingClient>,
        preferences: Arc<dyn PreferenceStore>,
        landmarks: LandmarkConfig,
        initial_trigger: InitialTrigger,
        permission_granted: bool,
    ) -> Self {
        RegistrationTask {
            client,
            preferences,
            landmarks,
            initial_trigger,
            state: Mutex::new(RegistrationState {
                permission_granted,
                pending: PendingTask::None,
            }),
        }
    }

    pub async fn app_state(&self) -> AppState {
        let state = self.state.lock().await;
        AppState::new(
            geofences_added(&*self.preferences),
            state.permission_granted,
            state.pending,
        )
    }

    /// Register the configured landmarks. Returns the message to show.
    pub async fn add_geofences(&self) -> Result<String, ServerError> {
        self.request(Operation::Add).await
    }

    /// Remove all registered geofences. Returns the message to show.
    pub async fn remove_geofences(&self) -> Result<String, ServerError> {
        self.request(Operation::Remove).await
    }

    /// Record that location permission was granted and run the pending
    /// task, if any.
    pub async fn grant_permission(&self) -> Result<Option<String>, ServerError> {
        let mut state = self.state.lock().await;
        log::info!("Permission granted.");
        state.permission_granted = true;
        let operation = match state.pending {
            PendingTask::Add => Operation::Add,
            PendingTask::Remove => Operation::Remove,
            PendingTask::None => return Ok(None),
        };
        self.perform(&mut state, operation).await.map(Some)
    }

    /// Record that location permission was denied. Any pending task is
    /// dropped. Returns the explanation to show.
    pub async fn deny_permission(&self) -> String {
        let mut state = self.state.lock().await;
        log::info!("Permission denied.");
        state.permission_granted = false;
        state.pending = PendingTask::None;
        PERMISSION_DENIED_EXPLANATION.to_string()
    }

    /// Re-register the landmarks after a restart if the persisted flag says
    /// they were added. On failure the flag is cleared.
    ///
    /// Without location permission nothing is registered; the add is left
    /// pending until permission is granted.
    pub async fn restore(&self) -> Result<(), ServerError> {
        let mut state = self.state.lock().await;
        if !geofences_added(&*self.preferences) {
            return Ok(());
        }
        if !state.permission_granted {
            log::info!("Geofences need restoring, waiting for permission");
            state.pending = PendingTask::Add;
            set_geofences_added(&*self.preferences, false)?;
            return Ok(());
        }

        let request =
            GeofencingRequest::from_landmarks(&self.landmarks, self.initial_trigger, now_ms())?;
        log::info!("Restoring {} geofences", request.geofences.len());
        if let Err(failure) = self.client.add_geofences(request).await {
            log::warn!("Unable to restore geofences: {}", failure);
            set_geofences_added(&*self.preferences, false)?;
        }
        Ok(())
    }

    async fn request(&self, operation: Operation) -> Result<String, ServerError> {
        let mut state = self.state.lock().await;
        if !state.permission_granted {
            log::info!("Requesting permission");
            state.pending = operation.into();
            return Err(ServerError::PermissionDenied);
        }
        self.perform(&mut state, operation).await
    }

    async fn perform(
        &self,
        state: &mut RegistrationState,
        operation: Operation,
    ) -> Result<String, ServerError> {
        let result = match operation {
            Operation::Add => {
                let request = GeofencingRequest::from_landmarks(
                    &self.landmarks,
                    self.initial_trigger,
                    now_ms(),
                )?;
                self.client.add_geofences(request).await
            }
            Operation::Remove => self.client.remove_geofences().await,
        };
        state.pending = PendingTask::None;

        match result {
            Ok(()) => {
                let added = operation == Operation::Add;
                if let Err(e) = set_geofences_added(&*self.preferences, added) {
                    log::error!(
                        "Geofences {} but the added flag could not be saved: {}",
                        if added { "added" } else { "removed" },
                        e
                    );
                    return Err(e);
                }
                let message = if added { GEOFENCES_ADDED } else { GEOFENCES_REMOVED };
                log::info!("{}", message);
                Ok(message.to_string())
            }
            Err(failure) => {
                log::error!("Error Code {}", failure.code.code());
                log::warn!("{}", failure);
                Err(ServerError::Registration(failure))
            }
        }
    }
}
