//! Application state handed to the UI layer
//!
//! Button enablement follows the persisted "geofences added" flag: adding
//! is possible only while nothing is registered, removing only while
//! something is.

use serde::{Deserialize, Serialize};

/// Registration request deferred until location permission is granted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingTask {
    Add,
    Remove,
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub geofences_added: bool,
    pub add_enabled: bool,
    pub remove_enabled: bool,
    pub permission_granted: bool,
    pub pending_task: PendingTask,
}

impl AppState {
    pub fn new(geofences_added: bool, permission_granted: bool, pending_task: PendingTask) -> Self {
        AppState {
            geofences_added,
            add_enabled: !geofences_added,
            remove_enabled: geofences_added,
            permission_granted,
            pending_task,
        }
    }
}
