//! Scenario configuration file.
//!
//! The config is a single JSON object mapping each canonical key to an
//! object of `scenario name -> bool`. The server never caches it: every
//! resolution reads the file again, so a write is visible to the very next
//! request.
//!
//! ```json
//! {
//!   "get.api-users": { "success": true, "error": false }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::observability::metrics;

/// The whole scenario configuration, in stored key order.
///
/// Values are kept as raw JSON: anything the operator posts is persisted
/// as-is, and only `true` flags are interpreted.
pub type ScenarioConfig = serde_json::Map<String, Value>;

/// Distinguishes temp files of concurrent writers within one process.
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Access to the scenario configuration file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Creates a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Seeds the file with `{}` if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InitFailed`] if the parent directory or the
    /// file cannot be created.
    pub fn ensure_exists(&self) -> Result<(), StorageError> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::InitFailed {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.path, "{}\n").map_err(|source| StorageError::InitFailed {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "created empty scenario config");
        Ok(())
    }

    /// Reads the config, returning `Ok(None)` when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the file cannot be read, is not valid
    /// JSON, or is valid JSON but not an object.
    pub fn try_load(&self) -> Result<Option<ScenarioConfig>, StorageError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let value: Value = serde_json::from_str(&raw).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })?;
        match value {
            Value::Object(config) => Ok(Some(config)),
            _ => Err(StorageError::NotAnObject {
                path: self.path.clone(),
            }),
        }
    }

    /// Reads the config, degrading to an empty object on any failure.
    #[must_use]
    pub fn load(&self) -> ScenarioConfig {
        match self.try_load() {
            Ok(config) => config.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "scenario config unreadable, using empty config");
                metrics::record_storage_error(e.kind());
                ScenarioConfig::new()
            }
        }
    }

    /// Replaces the stored config with `config`.
    ///
    /// The new content is written to a sibling temp file and renamed over the
    /// old one, so readers see either the previous or the new config, never a
    /// partial write. Concurrent writers race; the last rename wins.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the temp file cannot be written or
    /// renamed into place.
    pub fn try_save(&self, config: &ScenarioConfig) -> Result<(), StorageError> {
        let mut body =
            serde_json::to_string_pretty(config).map_err(|e| StorageError::Write {
                path: self.path.clone(),
                source: e.into(),
            })?;
        body.push('\n');

        let tmp = self.temp_path();
        let write = std::fs::write(&tmp, body).and_then(|()| std::fs::rename(&tmp, &self.path));
        if let Err(source) = write {
            let _ = std::fs::remove_file(&tmp);
            return Err(StorageError::Write {
                path: self.path.clone(),
                source,
            });
        }
        Ok(())
    }

    /// Replaces the stored config, returning `false` (and logging) on failure.
    #[must_use]
    pub fn save(&self, config: &ScenarioConfig) -> bool {
        match self.try_save(config) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to save scenario config");
                metrics::record_storage_error(e.kind());
                false
            }
        }
    }

    fn temp_path(&self) -> PathBuf {
        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        let name = self
            .path
            .file_name()
            .map_or_else(|| "config.json".into(), |n| n.to_string_lossy());
        self.path
            .with_file_name(format!(".{name}.{}.{seq}.tmp", std::process::id()))
    }
}

/// Returns the active scenario for `key`.
///
/// Scenarios are scanned in stored order and the first one whose flag is
/// exactly `true` wins. If several are flagged, the earlier one is served.
#[must_use]
pub fn active_scenario<'a>(key: &str, config: &'a ScenarioConfig) -> Option<&'a str> {
    config
        .get(key)?
        .as_object()?
        .iter()
        .find(|(_, flag)| matches!(flag, Value::Bool(true)))
        .map(|(name, _)| name.as_str())
}

/// Keys that flag more than one scenario as active.
#[must_use]
pub fn keys_with_multiple_active(config: &ScenarioConfig) -> Vec<&str> {
    config
        .iter()
        .filter(|(_, scenarios)| {
            scenarios.as_object().is_some_and(|s| {
                s.values()
                    .filter(|flag| matches!(flag, Value::Bool(true)))
                    .count()
                    > 1
            })
        })
        .map(|(key, _)| key.as_str())
        .collect()
}
