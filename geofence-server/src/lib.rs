//! Geofence Server
//!
//! Hosts a [`GeofenceMonitor`] behind a small REST API. Position samples
//! are queued to a single transition worker; add/remove requests go through
//! the [`RegistrationTask`](registration::RegistrationTask), which persists
//! whether the geofences are currently registered.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use geofence_core::{
    GeofenceError, GeofenceMonitor, InitialTrigger, LandmarkConfig, PositionSample,
};
use tokio::sync::{mpsc, Mutex};

pub mod app_state;
pub mod error;
pub mod notifier;
pub mod preferences;
pub mod registration;
pub mod transitions;
pub mod web;

use error::ServerError;
use notifier::{CompositeNotifier, HistoryNotifier, LogNotifier, Notifier};
use preferences::{FilePreferences, PreferenceStore};
use registration::{LocalGeofencingClient, RegistrationTask};
use transitions::TransitionWorker;

/// How far a sample timestamp may run ahead of the server clock. Expiry is
/// judged on sample time, so anything later would evict live geofences.
pub const MAX_CLOCK_SKEW_MS: u64 = 60 * 1000;

/// Monitor shared between the registration path and the transition worker
pub type SharedMonitor = Arc<Mutex<GeofenceMonitor>>;

#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    /// Port for the REST API
    #[arg(short, long, default_value_t = 3005)]
    pub port: u16,

    /// Landmark configuration (JSON); defaults to the bay-area landmarks
    #[arg(short, long)]
    pub landmarks: Option<PathBuf>,

    /// Preference file; defaults to the user configuration directory
    #[arg(long)]
    pub preferences: Option<PathBuf>,

    /// Start without location permission; add/remove stay pending until
    /// permission is granted through the API
    #[arg(long, default_value_t = false)]
    pub no_permission: bool,

    /// Fire ENTER/EXIT on the first observation after registration
    #[arg(long, default_value_t = false)]
    pub initial_trigger: bool,

    /// Depth of the position sample queue
    #[arg(long, default_value_t = 16)]
    pub sample_queue: usize,
}

impl Cli {
    pub fn initial_trigger(&self) -> InitialTrigger {
        if self.initial_trigger {
            InitialTrigger::ENTER | InitialTrigger::EXIT
        } else {
            InitialTrigger::empty()
        }
    }
}

/// Milliseconds since the Unix epoch
pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

pub fn load_landmarks(path: Option<&Path>) -> anyhow::Result<LandmarkConfig> {
    match path {
        None => Ok(LandmarkConfig::bay_area()),
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read landmarks from {}", path.display()))?;
            LandmarkConfig::from_json(&json)
                .with_context(|| format!("Cannot parse landmarks in {}", path.display()))
        }
    }
}

/// Everything the API handlers need, cheap to clone
#[derive(Clone)]
pub struct Session {
    pub args: Arc<Cli>,
    pub landmarks: Arc<LandmarkConfig>,
    pub monitor: SharedMonitor,
    pub registration: Arc<RegistrationTask>,
    pub history: Arc<HistoryNotifier>,
    pub notifier: Arc<dyn Notifier>,
    samples_tx: mpsc::Sender<PositionSample>,
}

impl Session {
    /// Build a session from command line arguments, reading the landmark
    /// and preference files
    pub fn new(args: Cli) -> anyhow::Result<(Session, TransitionWorker)> {
        let landmarks = load_landmarks(args.landmarks.as_deref())?;
        let path = match &args.preferences {
            Some(path) => path.clone(),
            None => FilePreferences::default_path()
                .context("No home directory found for the preference file")?,
        };
        let preferences = FilePreferences::open(&path)
            .with_context(|| format!("Cannot open preferences {}", path.display()))?;
        log::info!("Preferences in {}", preferences.path().display());

        Ok(Session::with_parts(args, landmarks, Arc::new(preferences)))
    }

    pub fn with_parts(
        args: Cli,
        landmarks: LandmarkConfig,
        preferences: Arc<dyn PreferenceStore>,
    ) -> (Session, TransitionWorker) {
        let monitor: SharedMonitor = Arc::new(Mutex::new(GeofenceMonitor::new()));
        let client = Arc::new(LocalGeofencingClient::new(monitor.clone()));
        let registration = Arc::new(RegistrationTask::new(
            client,
            preferences,
            landmarks.clone(),
            args.initial_trigger(),
            !args.no_permission,
        ));

        let history = Arc::new(HistoryNotifier::default());
        let notifiers: Vec<Arc<dyn Notifier>> = vec![Arc::new(LogNotifier), history.clone()];
        let notifier: Arc<dyn Notifier> = Arc::new(CompositeNotifier::new(notifiers));

        let (samples_tx, samples_rx) = mpsc::channel(args.sample_queue.max(1));
        let worker = TransitionWorker::new(monitor.clone(), samples_rx, notifier.clone());

        let session = Session {
            args: Arc::new(args),
            landmarks: Arc::new(landmarks),
            monitor,
            registration,
            history,
            notifier,
            samples_tx,
        };
        (session, worker)
    }

    /// Validate a sample and queue it for the transition worker
    pub async fn submit_sample(&self, sample: PositionSample) -> Result<(), ServerError> {
        sample.validate()?;
        let now = now_ms();
        if sample.timestamp_ms > now.saturating_add(MAX_CLOCK_SKEW_MS) {
            return Err(GeofenceError::InvalidSample(format!(
                "timestamp {} is ahead of the server clock ({})",
                sample.timestamp_ms, now
            ))
            .into());
        }
        self.samples_tx
            .send(sample)
            .await
            .map_err(|_| ServerError::QueueClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::MemoryPreferences;

    pub(crate) fn test_args() -> Cli {
        Cli::parse_from(["geofence-server"])
    }

    #[test]
    fn test_cli_defaults() {
        let args = test_args();
        assert_eq!(args.port, 3005);
        assert!(!args.no_permission);
        assert_eq!(args.sample_queue, 16);
        assert!(args.initial_trigger().is_empty());

        let args = Cli::parse_from(["geofence-server", "--initial-trigger", "--no-permission"]);
        assert_eq!(
            args.initial_trigger(),
            InitialTrigger::ENTER | InitialTrigger::EXIT
        );
        assert!(args.no_permission);
    }

    #[test]
    fn test_load_landmarks() {
        assert_eq!(load_landmarks(None).unwrap(), LandmarkConfig::bay_area());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("landmarks.json");
        std::fs::write(
            &path,
            r#"{"landmarks":[{"id":"DOCK","latitude":51.9,"longitude":4.4}]}"#,
        )
        .unwrap();
        let config = load_landmarks(Some(&path)).unwrap();
        assert_eq!(config.landmarks[0].id, "DOCK");

        assert!(load_landmarks(Some(&dir.path().join("missing.json"))).is_err());
    }

    #[tokio::test]
    async fn test_submit_rejects_invalid_sample() {
        let (session, _worker) = Session::with_parts(
            test_args(),
            LandmarkConfig::bay_area(),
            Arc::new(MemoryPreferences::new()),
        );
        let result = session
            .submit_sample(PositionSample::new(f64::NAN, 0.0, 0))
            .await;
        assert!(matches!(result, Err(ServerError::Geofence(_))));
    }

    #[tokio::test]
    async fn test_submit_after_worker_dropped() {
        let (session, worker) = Session::with_parts(
            test_args(),
            LandmarkConfig::bay_area(),
            Arc::new(MemoryPreferences::new()),
        );
        drop(worker);
        let result = session
            .submit_sample(PositionSample::new(37.0, -122.0, 0))
            .await;
        assert!(matches!(result, Err(ServerError::QueueClosed)));
    }

    #[tokio::test]
    async fn test_submit_rejects_future_timestamp() {
        let (session, mut worker) = Session::with_parts(
            test_args(),
            LandmarkConfig::bay_area(),
            Arc::new(MemoryPreferences::new()),
        );
        session.registration.add_geofences().await.unwrap();

        let result = session
            .submit_sample(PositionSample::new(37.621313, -122.378955, u64::MAX / 2))
            .await;
        assert!(matches!(
            result,
            Err(ServerError::Geofence(GeofenceError::InvalidSample(_)))
        ));

        // Slight skew is tolerated and does not evict anything
        let sample = PositionSample::new(37.621313, -122.378955, now_ms() + 1000);
        session.submit_sample(sample).await.unwrap();
        let queued = worker.next_sample().await.unwrap();
        worker.process(&queued).await.unwrap();
        assert_eq!(session.monitor.lock().await.len(), 2);
        assert!(session.registration.app_state().await.geofences_added);
    }
}
