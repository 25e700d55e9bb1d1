//! `endpoints`: prints the fixture listing without starting the server.

use crate::cli::args::{EndpointsArgs, StorageArgs};
use crate::error::MockStageError;
use crate::resolve::{EndpointFilter, ResolutionEngine};
use crate::store::{ConfigStore, FixtureStore};

/// Builds an engine over the configured storage locations.
#[must_use]
pub fn engine_for(storage: &StorageArgs) -> ResolutionEngine {
    ResolutionEngine::new(
        ConfigStore::new(&storage.config_file),
        FixtureStore::new(&storage.mocks_dir),
    )
}

/// Print the (optionally filtered) endpoint listing as pretty JSON.
///
/// Missing storage reads as empty; nothing is created on disk.
///
/// # Errors
///
/// Returns an error if the storage task panics or the listing cannot be
/// serialized.
pub async fn run(args: &EndpointsArgs) -> Result<(), MockStageError> {
    let engine = engine_for(&args.storage);
    let filter = EndpointFilter {
        query_key: args.query_key.clone(),
        use_case: args.use_case.clone(),
    };

    let index = tokio::task::spawn_blocking(move || engine.query(&filter))
        .await
        .map_err(|e| MockStageError::Io(std::io::Error::other(e.to_string())))?;

    println!("{}", serde_json::to_string_pretty(&index)?);
    Ok(())
}
