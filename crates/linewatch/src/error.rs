//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use linewatch_config::ConfigError;
use linewatch_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Store ────────────────────────────────────────────────────────
    #[error("Telemetry store unavailable: {message}")]
    #[diagnostic(
        code(linewatch::unavailable),
        help(
            "Check that the store URL is reachable and the API key is valid.\n\
             Try: linewatch machines -v"
        )
    )]
    Unavailable { message: String },

    #[error("The store returned a record linewatch cannot read: {message}")]
    #[diagnostic(code(linewatch::invalid_record))]
    InvalidRecord { message: String },

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(linewatch::not_found),
        help("Run: linewatch {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Credentials ──────────────────────────────────────────────────
    #[error("No API key configured for profile '{profile}'")]
    #[diagnostic(
        code(linewatch::no_credentials),
        help(
            "Configure one with: linewatch config init --url <URL> --key-env <VAR>\n\
             Or set the LINEWATCH_API_KEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(linewatch::validation))]
    Validation { field: String, reason: String },

    #[error("No machine given")]
    #[diagnostic(
        code(linewatch::no_machine),
        help(
            "Pass a machine id, or set one with: linewatch config set default_machine <ID>\n\
             Run: linewatch machines to see available machines"
        )
    )]
    NoMachine,

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(linewatch::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: linewatch config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No store configured")]
    #[diagnostic(
        code(linewatch::no_config),
        help(
            "Create a profile with: linewatch config init --url <URL>\n\
             Or pass --store-url and --api-key.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(linewatch::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML output failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Unavailable { .. } => exit_code::CONNECTION,
            Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NoMachine | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { identifier } => CliError::NotFound {
                resource_type: "machine".into(),
                identifier,
                list_command: "machines".into(),
            },
            CoreError::Unavailable { message } => CliError::Unavailable { message },
            CoreError::Invalid { message } => CliError::InvalidRecord { message },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(Box::new(other)),
        }
    }
}
