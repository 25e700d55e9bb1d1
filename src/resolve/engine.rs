//! Request-to-fixture resolution.
//!
//! The engine is a pair of storage handles and nothing else. Every call goes
//! back to disk, so config changes apply to the next request without any
//! invalidation step.

use serde::Deserialize;
use tracing::debug;

use crate::error::StorageError;
use crate::resolve::key::{CanonicalKey, QueryParams, normalize};
use crate::store::config::{ConfigStore, ScenarioConfig, active_scenario};
use crate::store::fixtures::{
    EndpointEntry, EndpointIndex, Fixture, FixtureStore, fixture_file_name,
};

/// Outcome of resolving one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No scenario is active for the key.
    NotConfigured {
        /// Key derived from the request.
        key: CanonicalKey,
    },
    /// A scenario is active but its fixture cannot be loaded.
    FixtureMissing {
        /// Key derived from the request.
        key: CanonicalKey,
        /// The active scenario.
        scenario: String,
    },
    /// The fixture to replay.
    Resolved {
        /// Key derived from the request.
        key: CanonicalKey,
        /// The active scenario.
        scenario: String,
        /// The recorded response.
        fixture: Fixture,
    },
}

impl Resolution {
    /// Key the request was resolved under.
    #[must_use]
    pub const fn key(&self) -> &CanonicalKey {
        match self {
            Self::NotConfigured { key }
            | Self::FixtureMissing { key, .. }
            | Self::Resolved { key, .. } => key,
        }
    }

    /// Fixed label used for metrics and logs.
    #[must_use]
    pub const fn outcome(&self) -> &'static str {
        match self {
            Self::NotConfigured { .. } => "not_configured",
            Self::FixtureMissing { .. } => "fixture_missing",
            Self::Resolved { .. } => "resolved",
        }
    }

    /// File name the active scenario's fixture is expected under.
    #[must_use]
    pub fn expected_file(&self) -> Option<String> {
        match self {
            Self::NotConfigured { .. } => None,
            Self::FixtureMissing { key, scenario } | Self::Resolved { key, scenario, .. } => {
                Some(fixture_file_name(key.as_str(), scenario))
            }
        }
    }
}

/// Optional narrowing of the endpoint listing.
///
/// Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointFilter {
    /// Restrict to one canonical key.
    #[serde(default)]
    pub query_key: Option<String>,
    /// Restrict to one scenario name.
    #[serde(default)]
    pub use_case: Option<String>,
}

impl EndpointFilter {
    fn key(&self) -> Option<&str> {
        self.query_key.as_deref().filter(|k| !k.is_empty())
    }

    fn scenario(&self) -> Option<&str> {
        self.use_case.as_deref().filter(|s| !s.is_empty())
    }
}

/// Narrows an endpoint listing.
///
/// - key and scenario: that single pair, or nothing
/// - key only: that key's full entry
/// - scenario only: every key that has it, narrowed to it
/// - neither: the whole listing
#[must_use]
pub fn filter_endpoints(mut all: EndpointIndex, filter: &EndpointFilter) -> EndpointIndex {
    match (filter.key(), filter.scenario()) {
        (None, None) => all,
        (Some(key), None) => all.swap_remove_entry(key).into_iter().collect(),
        (Some(key), Some(scenario)) => all
            .swap_remove_entry(key)
            .and_then(|(key, entry)| narrow(entry, scenario).map(|entry| (key, entry)))
            .into_iter()
            .collect(),
        (None, Some(scenario)) => all
            .into_iter()
            .filter_map(|(key, entry)| narrow(entry, scenario).map(|entry| (key, entry)))
            .collect(),
    }
}

fn narrow(mut entry: EndpointEntry, scenario: &str) -> Option<EndpointEntry> {
    let (name, fixture) = entry.use_cases.swap_remove_entry(scenario)?;
    Some(EndpointEntry {
        use_cases: std::iter::once((name, fixture)).collect(),
        active_use_case: entry.active_use_case,
    })
}

/// Maps requests onto fixtures via the scenario config.
#[derive(Debug, Clone)]
pub struct ResolutionEngine {
    config: ConfigStore,
    fixtures: FixtureStore,
}

impl ResolutionEngine {
    /// Creates an engine over the given stores.
    #[must_use]
    pub const fn new(config: ConfigStore, fixtures: FixtureStore) -> Self {
        Self { config, fixtures }
    }

    /// The scenario config store.
    #[must_use]
    pub const fn config_store(&self) -> &ConfigStore {
        &self.config
    }

    /// The fixture store.
    #[must_use]
    pub const fn fixture_store(&self) -> &FixtureStore {
        &self.fixtures
    }

    /// Creates the fixtures directory and an empty config file if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InitFailed`] if either cannot be created.
    pub fn init_storage(&self) -> Result<(), StorageError> {
        self.fixtures.ensure_exists()?;
        self.config.ensure_exists()
    }

    /// Resolves a request to the fixture of its active scenario.
    #[must_use]
    pub fn resolve(&self, method: &str, path: &str, query: &QueryParams) -> Resolution {
        let key = normalize(method, path, query);
        let config = self.config.load();

        let Some(scenario) = active_scenario(key.as_str(), &config).map(str::to_string) else {
            debug!(%key, "no active scenario");
            return Resolution::NotConfigured { key };
        };

        match self.fixtures.load_fixture(key.as_str(), &scenario) {
            Some(fixture) => {
                debug!(%key, %scenario, status = fixture.effective_status(), "resolved fixture");
                Resolution::Resolved {
                    key,
                    scenario,
                    fixture,
                }
            }
            None => {
                debug!(%key, %scenario, "active scenario has no fixture");
                Resolution::FixtureMissing { key, scenario }
            }
        }
    }

    /// Current scenario config.
    #[must_use]
    pub fn load_config(&self) -> ScenarioConfig {
        self.config.load()
    }

    /// Replaces the scenario config, returning whether the write succeeded.
    #[must_use]
    pub fn replace_config(&self, config: &ScenarioConfig) -> bool {
        self.config.save(config)
    }

    /// Every recorded fixture, grouped by key, with active scenarios marked.
    #[must_use]
    pub fn list_all(&self) -> EndpointIndex {
        self.fixtures.list_all(&self.config.load())
    }

    /// [`list_all`](Self::list_all) narrowed by `filter`.
    #[must_use]
    pub fn query(&self, filter: &EndpointFilter) -> EndpointIndex {
        filter_endpoints(self.list_all(), filter)
    }
}
