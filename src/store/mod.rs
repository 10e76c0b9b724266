//! Flat key/value settings store shared by every feature.
//!
//! Keys are opaque. Values are strings; the typed helpers encode them as JSON
//! text, while typed settings in the settings tree write their own
//! locale-invariant encoding through the raw accessors.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{require_key, ShellError};

#[derive(Clone, Default)]
pub struct SettingsStore {
    values: Arc<Mutex<BTreeMap<String, String>>>,
}

impl SettingsStore {
    pub fn open_memory() -> Self {
        Self::default()
    }

    // ============================================================
    // Typed access
    // ============================================================

    /// Returns the stored value, or `default` when the key is absent or the
    /// stored text does not deserialize as `T`.
    pub fn get_value<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, ShellError> {
        Ok(self.try_get_value(key)?.unwrap_or(default))
    }

    pub fn try_get_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ShellError> {
        require_key(key)?;
        let values = self.values.lock();
        let Some(serialized) = values.get(key) else {
            return Ok(None);
        };

        match serde_json::from_str(serialized) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::debug!("Stored value for '{}' is not of the requested type: {}", key, e);
                Ok(None)
            }
        }
    }

    pub fn set_value<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), ShellError> {
        require_key(key)?;
        let serialized = serde_json::to_string(value).map_err(|source| ShellError::Serialization {
            key: key.to_string(),
            source,
        })?;
        self.values.lock().insert(key.to_string(), serialized);
        Ok(())
    }

    /// Removes the key. Returns whether anything was stored under it.
    pub fn clear_value(&self, key: &str) -> Result<bool, ShellError> {
        require_key(key)?;
        Ok(self.values.lock().remove(key).is_some())
    }

    // ============================================================
    // Raw access
    // ============================================================

    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    pub fn set_raw(&self, key: &str, value: impl Into<String>) -> Result<(), ShellError> {
        require_key(key)?;
        self.values.lock().insert(key.to_string(), value.into());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.values.lock().clone()
    }

    // ============================================================
    // Persistence
    // ============================================================

    /// Merges the JSON object in `path` into the store.
    ///
    /// A missing file is not an error and loads nothing. Returns the number of
    /// keys read.
    pub fn load_file(&self, path: &Path) -> Result<usize> {
        if !path.exists() {
            return Ok(0);
        }

        let content = fs::read_to_string(path).context("Failed to read settings file")?;
        let loaded: BTreeMap<String, String> =
            serde_json::from_str(&content).context("Failed to parse settings file")?;

        let count = loaded.len();
        self.values.lock().extend(loaded);
        Ok(count)
    }

    pub fn save_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create settings directory")?;
        }

        let content =
            serde_json::to_string_pretty(&self.snapshot()).context("Failed to serialize settings")?;
        fs::write(path, content).context("Failed to write settings file")?;

        Ok(())
    }

    /// [`load_file`](Self::load_file) that logs failures instead of returning them.
    pub fn load_or_default(&self, path: &Path) {
        match self.load_file(path) {
            Ok(0) => tracing::info!("No saved settings at {}", path.display()),
            Ok(count) => tracing::info!("Loaded {} settings from {}", count, path.display()),
            Err(e) => tracing::error!("Failed to load settings, using defaults: {:#}", e),
        }
    }

    /// [`save_file`](Self::save_file) that logs failures instead of returning them.
    pub fn save_or_log(&self, path: &Path) {
        if let Err(e) = self.save_file(path) {
            tracing::error!("Failed to save settings: {:#}", e);
        }
    }
}
