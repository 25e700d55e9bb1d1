//! `mockstage` - scenario-driven mock HTTP server
//!
//! Every request that is not a management route is reduced to a canonical
//! key. The scenario config names the active scenario for that key, and the
//! matching fixture file on disk supplies status, headers and body.

pub mod cli;
pub mod error;
pub mod observability;
pub mod resolve;
pub mod store;
pub mod transport;
