//! `serve`: runs the mock server until cancelled.

use tokio_util::sync::CancellationToken;

use crate::cli::args::ServeArgs;
use crate::cli::commands::endpoints::engine_for;
use crate::error::MockStageError;
use crate::transport::http::{HttpConfig, HttpServer, parse_bind_addr};

/// Start the mock server.
///
/// Creates the mocks directory and an empty config file if missing, binds
/// the listener, and serves until `cancel` fires.
///
/// # Errors
///
/// Returns a storage error if the storage cannot be initialized, or a
/// transport error if the address is invalid or cannot be bound.
pub async fn run(args: &ServeArgs, cancel: CancellationToken) -> Result<(), MockStageError> {
    if let Some(port) = args.metrics_port {
        crate::observability::init_metrics(Some(port))?;
        tracing::info!(port, "Prometheus metrics endpoint started");
    }

    let engine = engine_for(&args.storage);
    engine.init_storage()?;

    let bind_addr = parse_bind_addr(&format_host_port(&args.bind, args.port))?;
    let config = HttpConfig {
        bind_addr,
        max_body_size: args.max_body_size,
    };

    let server = HttpServer::bind(config, engine, cancel).await?;
    tracing::info!(
        bound_addr = %server.local_addr(),
        mocks_dir = %args.storage.mocks_dir.display(),
        config_file = %args.storage.config_file.display(),
        "HTTP server listening"
    );

    server.wait().await?;
    tracing::info!("server stopped");
    Ok(())
}

/// Joins host and port, bracketing bare IPv6 hosts.
fn format_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}
