//! Key-value preference storage
//!
//! Holds the single persisted flag recording whether the geofences are
//! currently registered. The file backend stores a flat JSON object and
//! rewrites it on every change.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use serde_json::{Map, Value};

use crate::error::ServerError;

pub const GEOFENCES_ADDED_KEY: &str =
    "com.google.android.gms.location.Geofence.GEOFENCES_ADDED_KEY";

const PREFERENCES_FILE: &str = "preferences.json";

pub trait PreferenceStore: Send + Sync {
    fn get_bool(&self, key: &str, default: bool) -> bool;
    fn put_bool(&self, key: &str, value: bool) -> Result<(), ServerError>;
}

pub fn geofences_added(store: &dyn PreferenceStore) -> bool {
    store.get_bool(GEOFENCES_ADDED_KEY, false)
}

pub fn set_geofences_added(store: &dyn PreferenceStore, added: bool) -> Result<(), ServerError> {
    store.put_bool(GEOFENCES_ADDED_KEY, added)
}

#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, bool>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        MemoryPreferences::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(key).copied().unwrap_or(default)
    }

    fn put_bool(&self, key: &str, value: bool) -> Result<(), ServerError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value);
        Ok(())
    }
}

#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl FilePreferences {
    /// Open (or lazily create) the preference file at `path`
    pub fn open(path: &Path) -> Result<Self, ServerError> {
        let values = match fs::read_to_string(path) {
            Ok(s) if s.trim().is_empty() => Map::new(),
            Ok(s) => serde_json::from_str(&s).map_err(|e| {
                ServerError::Preferences(format!("{}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No preferences at {}, starting empty", path.display());
                Map::new()
            }
            Err(e) => return Err(ServerError::Io(e)),
        };

        Ok(FilePreferences {
            path: path.to_path_buf(),
            values: Mutex::new(values),
        })
    }

    /// `preferences.json` in the per-user configuration directory
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "Geofence", "geofence-server")
            .map(|dirs| dirs.config_dir().join(PREFERENCES_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, values: &Map<String, Value>) -> Result<(), ServerError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(values)
            .map_err(|e| ServerError::Preferences(e.to_string()))?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferences {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    fn put_bool(&self, key: &str, value: bool) -> Result<(), ServerError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), Value::Bool(value));
        self.write(&values)?;
        log::debug!("{}: {} = {}", self.path.display(), key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_default_false() {
        let store = MemoryPreferences::new();
        assert!(!geofences_added(&store));
        set_geofences_added(&store, true).unwrap();
        assert!(geofences_added(&store));
    }

    #[test]
    fn test_file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(PREFERENCES_FILE);

        let store = FilePreferences::open(&path).unwrap();
        assert!(!geofences_added(&store));
        set_geofences_added(&store, true).unwrap();

        let reopened = FilePreferences::open(&path).unwrap();
        assert!(geofences_added(&reopened));

        let json: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json[GEOFENCES_ADDED_KEY], Value::Bool(true));
    }

    #[test]
    fn test_file_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE);
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            FilePreferences::open(&path),
            Err(ServerError::Preferences(_))
        ));
    }

    #[test]
    fn test_non_bool_value_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE);
        fs::write(&path, format!(r#"{{"{}": "yes"}}"#, GEOFENCES_ADDED_KEY)).unwrap();
        let store = FilePreferences::open(&path).unwrap();
        assert!(!geofences_added(&store));
    }
}
