//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` / `ConfigError` / `ForecastError` into user-facing
//! errors with actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use loadscope_config::ConfigError;
use loadscope_core::CoreError;
use loadscope_forecast::ForecastError;

/// Exit codes of the `loadscope` binary.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("{entity} '{identifier}' not found")]
    #[diagnostic(
        code(loadscope::not_found),
        help("Run: loadscope types list to see the catalog")
    )]
    NotFound {
        entity: String,
        identifier: String,
    },

    #[error("{message}")]
    #[diagnostic(
        code(loadscope::conflict),
        help("Names and (networkProtocol, transportProtocol, port) triples must be unique.")
    )]
    Conflict { message: String },

    #[error("{message}")]
    #[diagnostic(code(loadscope::validation))]
    Validation { message: String },

    #[error("Capture setup failed: {message}")]
    #[diagnostic(
        code(loadscope::capture),
        help(
            "Check that the adapter exists and the process may open it\n\
             (CAP_NET_RAW or root is required for live capture)."
        )
    )]
    Capture { message: String },

    #[error("Stats server connection failed: {message}")]
    #[diagnostic(
        code(loadscope::forecaster),
        help("Check forecaster.host / forecaster.port and that Rserve is running.")
    )]
    Forecaster { message: String },

    #[error(transparent)]
    #[diagnostic(code(loadscope::config))]
    Config(#[from] ConfigError),

    #[error("{0}")]
    #[diagnostic(code(loadscope::core))]
    Core(String),
}

impl CliError {
    /// Map this error to a process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::Config(_) => exit_code::USAGE,
            Self::Capture { .. } | Self::Forecaster { .. } => exit_code::CONNECTION,
            Self::Core(_) => exit_code::GENERAL,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { entity, identifier } => Self::NotFound {
                entity: entity.to_string(),
                identifier,
            },
            CoreError::Conflict { message } => Self::Conflict { message },
            CoreError::Validation(errors) => Self::Validation {
                message: errors.to_string(),
            },
            CoreError::Capture(error) => Self::Capture {
                message: error.to_string(),
            },
            CoreError::Forecast(error) => Self::Forecaster {
                message: error.to_string(),
            },
            other => Self::Core(other.to_string()),
        }
    }
}

impl From<ForecastError> for CliError {
    fn from(err: ForecastError) -> Self {
        Self::Forecaster {
            message: err.to_string(),
        }
    }
}
