//! Error types for `mockstage`.
//!
//! Storage and transport failures are modelled as separate enums and
//! aggregated into [`MockStageError`], which also owns the mapping to
//! process exit codes.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `mockstage` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Storage error (mocks directory or config file unusable)
    pub const STORAGE_ERROR: i32 = 3;

    /// Transport error (bind failure, invalid address)
    pub const TRANSPORT_ERROR: i32 = 4;

    /// Usage error (invalid arguments)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `mockstage` operations.
///
/// Aggregates the domain-specific errors and maps each of them to an
/// exit code.
#[derive(Debug, Error)]
pub enum MockStageError {
    /// Durable storage error
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// HTTP transport error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Invalid command-line usage that clap could not catch
    #[error("usage error: {0}")]
    Usage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MockStageError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Storage(_) | Self::Io(_) => ExitCode::STORAGE_ERROR,
            Self::Transport(_) => ExitCode::TRANSPORT_ERROR,
            Self::Usage(_) => ExitCode::USAGE_ERROR,
            Self::Json(_) => ExitCode::ERROR,
        }
    }
}

// ============================================================================
// Storage Errors
// ============================================================================

/// Failures reading or writing the config file and fixture files.
///
/// The HTTP surface never propagates these for reads: the degrading store
/// operations log them and fall back to an empty value instead.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Creating the mocks directory or seeding the config file failed
    #[error("failed to initialize storage at {path}: {source}")]
    InitFailed {
        /// Path that could not be created
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Reading a stored file failed
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path of the file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Writing a stored file failed
    #[error("failed to write {path}: {source}")]
    Write {
        /// Path of the file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A stored file is not valid JSON of the expected shape
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Path of the file
        path: PathBuf,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// The config file holds valid JSON that is not an object
    #[error("{path} does not contain a JSON object")]
    NotAnObject {
        /// Path of the file
        path: PathBuf,
    },
}

impl StorageError {
    /// Short, fixed label for metrics and log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InitFailed { .. } => "init",
            Self::Read { .. } => "read",
            Self::Write { .. } => "write",
            Self::Parse { .. } | Self::NotAnObject { .. } => "parse",
        }
    }
}

// ============================================================================
// Transport Errors
// ============================================================================

/// HTTP listener errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Binding the TCP listener failed
    #[error("bind failed: {0}")]
    BindFailed(String),

    /// The bind address could not be parsed
    #[error("invalid bind address: {0}")]
    InvalidBindAddress(String),

    /// The server loop exited with an error
    #[error("server error: {0}")]
    Serve(String),
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `mockstage` operations.
pub type Result<T> = std::result::Result<T, MockStageError>;

// ============================================================================
// Tests
// ============================================================================
