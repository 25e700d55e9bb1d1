//! HTTP transport: router, CORS layer and the OpenAPI document.

pub mod cors;
pub mod http;
pub mod openapi;

pub use http::{HttpConfig, HttpServer, build_router, parse_bind_addr};

/// Default maximum request body size (10 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3001;
