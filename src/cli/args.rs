//! CLI argument definitions.
//!
//! All Clap derive structs for `mockstage` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::observability::LogFormat;
use crate::transport::{DEFAULT_MAX_BODY_SIZE, DEFAULT_PORT};

// ============================================================================
// Root CLI
// ============================================================================

/// Scenario-driven mock HTTP server.
#[derive(Parser, Debug)]
#[command(name = "mockstage", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "MOCKSTAGE_COLOR")]
    pub color: ColorChoice,

    /// Log output format.
    #[arg(long, default_value = "human", global = true)]
    pub log_format: LogFormat,
}

// ============================================================================
// Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the mock server.
    Serve(ServeArgs),

    /// Print the canonical key a request resolves to.
    Key(KeyArgs),

    /// List recorded fixtures as JSON without starting the server.
    Endpoints(EndpointsArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

/// Storage locations shared by commands that read fixtures or config.
#[derive(Args, Debug, Clone)]
pub struct StorageArgs {
    /// Directory holding `<key>.<scenario>.json` fixture files.
    #[arg(long, default_value = "./mocks", env = "MOCKSTAGE_MOCKS_DIR")]
    pub mocks_dir: PathBuf,

    /// Path to the scenario config file.
    #[arg(long, default_value = "./config.json", env = "MOCKSTAGE_CONFIG_FILE")]
    pub config_file: PathBuf,
}

/// Arguments for `serve`.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    /// Host address to bind.
    #[arg(long, default_value = "0.0.0.0", env = "MOCKSTAGE_BIND")]
    pub bind: String,

    /// Fixture and config locations.
    #[command(flatten)]
    pub storage: StorageArgs,

    /// Expose Prometheus metrics on `127.0.0.1:<port>`.
    #[arg(long, env = "MOCKSTAGE_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Maximum accepted request body size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_SIZE)]
    pub max_body_size: usize,
}

/// Arguments for `key`.
#[derive(Args, Debug)]
pub struct KeyArgs {
    /// HTTP method, e.g. `GET`.
    pub method: String,

    /// Request path with optional query string, e.g. `/api/users?requestDTO.status=active`.
    pub url: String,
}

/// Arguments for `endpoints`.
#[derive(Args, Debug)]
pub struct EndpointsArgs {
    /// Fixture and config locations.
    #[command(flatten)]
    pub storage: StorageArgs,

    /// Only list this canonical key.
    #[arg(long)]
    pub query_key: Option<String>,

    /// Only list fixtures for this use case.
    #[arg(long)]
    pub use_case: Option<String>,
}

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================
