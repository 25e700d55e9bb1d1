//! Recorded response fixtures.
//!
//! Each fixture lives in its own file inside the mocks directory, named
//! `<key>.<scenario>.json`. The scenario is everything after the last `.`
//! of the file stem, so canonical keys may themselves contain dots.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::observability::metrics;
use crate::store::config::{ScenarioConfig, active_scenario};

/// File extension of fixture files.
pub const FIXTURE_EXTENSION: &str = "json";

/// Placeholder message for fixtures that exist but cannot be parsed.
pub const FIXTURE_ERROR_MARKER: &str = "failed to load mock";

/// Status served when a fixture omits `status` or sets it to zero.
pub const DEFAULT_STATUS: u16 = 200;

/// A recorded HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Fixture {
    /// HTTP status code; absent or `0` means [`DEFAULT_STATUS`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// JSON body written as the response.
    #[serde(default)]
    pub response: Value,

    /// Headers applied before the body is written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<IndexMap<String, String>>,
}

impl Fixture {
    /// Status code to send for this fixture.
    #[must_use]
    pub const fn effective_status(&self) -> u16 {
        match self.status {
            None | Some(0) => DEFAULT_STATUS,
            Some(status) => status,
        }
    }
}

/// One scenario slot in the endpoint listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FixtureEntry {
    /// The file content as parsed, including fields the server ignores.
    Loaded(Value),
    /// The file exists but could not be read or parsed.
    Failed {
        /// Fixed diagnostic message.
        error: String,
    },
}

impl FixtureEntry {
    fn failed() -> Self {
        Self::Failed {
            error: FIXTURE_ERROR_MARKER.to_string(),
        }
    }
}

/// Every scenario recorded for one canonical key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointEntry {
    /// Fixtures by scenario name, in file-name order.
    pub use_cases: IndexMap<String, FixtureEntry>,
    /// Scenario currently flagged active in the config, if any.
    pub active_use_case: Option<String>,
}

/// Endpoint listing keyed by canonical key.
pub type EndpointIndex = IndexMap<String, EndpointEntry>;

/// Builds the file name of the fixture for `(key, scenario)`.
#[must_use]
pub fn fixture_file_name(key: &str, scenario: &str) -> String {
    format!("{key}.{scenario}.{FIXTURE_EXTENSION}")
}

/// Splits a fixture file name into `(key, scenario)`.
///
/// Returns `None` for non-fixture files and for stems without a `.`.
#[must_use]
pub fn parse_fixture_file_name(file_name: &str) -> Option<(&str, &str)> {
    let stem = file_name
        .strip_suffix(FIXTURE_EXTENSION)?
        .strip_suffix('.')?;
    stem.rsplit_once('.')
}

/// A key or scenario must stay a single path component.
fn is_single_component(part: &str) -> bool {
    !part.contains(['/', '\\', '\0'])
}

/// Read-only access to the fixtures directory.
#[derive(Debug, Clone)]
pub struct FixtureStore {
    dir: PathBuf,
}

impl FixtureStore {
    /// Creates a store over the directory at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the fixture files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the fixtures directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InitFailed`] if the directory cannot be created.
    pub fn ensure_exists(&self) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| StorageError::InitFailed {
            path: self.dir.clone(),
            source,
        })
    }

    /// Path of the fixture for `(key, scenario)`, or `None` when either part
    /// would escape the fixtures directory.
    #[must_use]
    pub fn fixture_path(&self, key: &str, scenario: &str) -> Option<PathBuf> {
        (is_single_component(key) && is_single_component(scenario))
            .then(|| self.dir.join(fixture_file_name(key, scenario)))
    }

    /// Loads the fixture for `(key, scenario)`, returning `Ok(None)` if no
    /// such file exists.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the file exists but cannot be read or
    /// does not hold a valid fixture.
    pub fn try_load_fixture(
        &self,
        key: &str,
        scenario: &str,
    ) -> Result<Option<Fixture>, StorageError> {
        let Some((path, document)) = self.read_document(key, scenario)? else {
            return Ok(None);
        };
        serde_json::from_value(document)
            .map(Some)
            .map_err(|source| StorageError::Parse { path, source })
    }

    /// Reads the fixture file for `(key, scenario)` as untyped JSON.
    fn read_document(
        &self,
        key: &str,
        scenario: &str,
    ) -> Result<Option<(PathBuf, Value)>, StorageError> {
        let Some(path) = self.fixture_path(key, scenario) else {
            debug!(key, scenario, "fixture name is not a single path component");
            return Ok(None);
        };
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Read { path, source }),
        };
        match serde_json::from_str(&raw) {
            Ok(document) => Ok(Some((path, document))),
            Err(source) => Err(StorageError::Parse { path, source }),
        }
    }

    /// Loads the fixture for `(key, scenario)`, logging and returning `None`
    /// when it is missing or unreadable.
    #[must_use]
    pub fn load_fixture(&self, key: &str, scenario: &str) -> Option<Fixture> {
        match self.try_load_fixture(key, scenario) {
            Ok(fixture) => fixture,
            Err(e) => {
                warn!(error = %e, "fixture unreadable");
                metrics::record_storage_error(e.kind());
                None
            }
        }
    }

    /// Enumerates every fixture file, grouped by canonical key.
    ///
    /// Files are visited in sorted name order. Each entry is the file's JSON
    /// exactly as parsed; a file that is not valid JSON is listed as
    /// [`FixtureEntry::Failed`] instead of aborting the scan.
    #[must_use]
    pub fn list_all(&self, config: &ScenarioConfig) -> EndpointIndex {
        let mut index = EndpointIndex::new();

        for file_name in self.fixture_file_names() {
            let Some((key, scenario)) = parse_fixture_file_name(&file_name) else {
                continue;
            };

            let entry = match self.read_document(key, scenario) {
                Ok(Some((_, document))) => FixtureEntry::Loaded(document),
                Ok(None) => FixtureEntry::failed(),
                Err(e) => {
                    warn!(error = %e, "fixture unreadable while listing");
                    metrics::record_storage_error(e.kind());
                    FixtureEntry::failed()
                }
            };

            index
                .entry(key.to_string())
                .or_insert_with(|| EndpointEntry {
                    use_cases: IndexMap::new(),
                    active_use_case: active_scenario(key, config).map(str::to_string),
                })
                .use_cases
                .insert(scenario.to_string(), entry);
        }

        index
    }

    fn fixture_file_names(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %self.dir.display(), "fixtures directory does not exist");
                return Vec::new();
            }
            Err(source) => {
                let e = StorageError::Read {
                    path: self.dir.clone(),
                    source,
                };
                warn!(error = %e, "cannot list fixtures directory");
                metrics::record_storage_error(e.kind());
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();
        names
    }
}
