//! Request-to-scenario resolution.
//!
//! [`key`] derives the canonical key of a request; [`engine`] looks that key
//! up in the scenario config and loads the matching fixture.

pub mod engine;
pub mod key;

pub use engine::{EndpointFilter, Resolution, ResolutionEngine, filter_endpoints};
pub use key::{CanonicalKey, QueryParams, collect_query, normalize};
