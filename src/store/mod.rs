//! Flat-file storage for the scenario config and recorded fixtures.

pub mod config;
pub mod fixtures;

pub use config::{ConfigStore, ScenarioConfig, active_scenario};
pub use fixtures::{EndpointEntry, EndpointIndex, Fixture, FixtureEntry, FixtureStore};
