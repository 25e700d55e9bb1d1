//! Metrics collection for `mockstage`.
//!
//! Provides Prometheus-compatible metrics with label cardinality protection
//! and typed convenience functions for recording measurements. Every
//! recording function is a no-op until [`init_metrics`] installs a recorder.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::MockStageError;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// HTTP methods accepted as metric label values.
///
/// Mocked requests can carry any method token, so anything outside this
/// list is bucketed as `"__other__"`.
const KNOWN_METHODS: [&str; 9] = [
    "GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "OPTIONS", "CONNECT", "TRACE",
];

/// Sanitizes an HTTP method for use as a metrics label.
#[must_use]
pub fn sanitize_method_label(method: &str) -> &str {
    if KNOWN_METHODS.contains(&method) {
        method
    } else {
        "__other__"
    }
}

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without
/// an HTTP endpoint.
///
/// # Errors
///
/// Returns `MockStageError::Io` if the recorder or HTTP listener
/// cannot be installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), MockStageError> {
    install_once(&METRICS_INITIALIZED, || {
        port.map_or_else(
            || PrometheusBuilder::new().install_recorder().map(|_| ()),
            |p| {
                PrometheusBuilder::new()
                    .with_http_listener(([127, 0, 0, 1], p))
                    .install()
            },
        )
        .map_err(|e| MockStageError::Io(std::io::Error::other(e.to_string())))
    })?;

    describe_metrics();
    Ok(())
}

/// Runs `install` unless `flag` records an earlier success.
///
/// A failed install clears the flag so a later call can retry.
fn install_once<F>(flag: &AtomicBool, install: F) -> Result<(), MockStageError>
where
    F: FnOnce() -> Result<(), MockStageError>,
{
    if flag.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    install().inspect_err(|_| flag.store(false, Ordering::SeqCst))
}

/// Registers metric descriptions with the global recorder.
fn describe_metrics() {
    describe_counter!(
        "mockstage_requests_total",
        "Mocked requests by HTTP method and resolution outcome"
    );
    describe_histogram!(
        "mockstage_resolution_duration_ms",
        "Time spent resolving a request to a fixture in milliseconds"
    );
    describe_counter!(
        "mockstage_management_requests_total",
        "Requests to the config and endpoint management routes"
    );
    describe_counter!(
        "mockstage_storage_errors_total",
        "Storage failures that were degraded instead of surfaced"
    );
    describe_counter!(
        "mockstage_config_writes_total",
        "Successful scenario config replacements since start"
    );
}

/// Records one mocked request and how it resolved.
pub fn record_request(method: &str, outcome: &'static str) {
    let label = sanitize_method_label(method);
    counter!(
        "mockstage_requests_total",
        "method" => label.to_owned(),
        "outcome" => outcome,
    )
    .increment(1);
}

/// Records how long a resolution took.
pub fn record_resolution_duration(outcome: &'static str, duration: Duration) {
    histogram!("mockstage_resolution_duration_ms", "outcome" => outcome)
        .record(duration.as_secs_f64() * 1000.0);
}

/// Records a call to a management route (`config`, `endpoints`, `api-docs`).
pub fn record_management_request(route: &'static str) {
    counter!("mockstage_management_requests_total", "route" => route).increment(1);
}

/// Records a storage error that was logged and degraded.
pub fn record_storage_error(kind: &'static str) {
    counter!("mockstage_storage_errors_total", "kind" => kind).increment(1);
}

/// Records a successful config replacement.
pub fn record_config_write() {
    counter!("mockstage_config_writes_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_known_method_returns_original() {
        assert_eq!(sanitize_method_label("GET"), "GET");
        assert_eq!(sanitize_method_label("DELETE"), "DELETE");
    }

    #[test]
    fn sanitize_unknown_method_is_bucketed() {
        assert_eq!(sanitize_method_label("PROPFIND"), "__other__");
        assert_eq!(sanitize_method_label("get"), "__other__");
        assert_eq!(sanitize_method_label(""), "__other__");
    }

    #[test]
    fn very_long_method_is_bucketed() {
        let long_method = "X".repeat(10_000);
        assert_eq!(sanitize_method_label(&long_method), "__other__");
    }

    #[test]
    fn failed_install_can_be_retried() {
        let flag = AtomicBool::new(false);
        let err = install_once(&flag, || {
            Err(MockStageError::Io(std::io::Error::other("address in use")))
        });
        assert!(err.is_err());
        assert!(!flag.load(Ordering::SeqCst));

        let mut calls = 0;
        install_once(&flag, || {
            calls += 1;
            Ok(())
        })
        .unwrap();
        install_once(&flag, || {
            calls += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(calls, 1);
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        record_request("GET", "resolved");
        record_resolution_duration("not_configured", Duration::from_millis(3));
        record_management_request("config");
        record_storage_error("parse");
        record_config_write();
    }
}
