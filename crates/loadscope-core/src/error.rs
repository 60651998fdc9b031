use std::fmt;

use thiserror::Error;

use loadscope_forecast::ForecastError;

/// Unified error type for the core crate.
///
/// REST and CLI layers map these to status codes / exit codes; the
/// pipeline itself only aborts on capture setup failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A named or id-addressed entity does not exist.
    #[error("{entity} '{identifier}' not found")]
    NotFound {
        entity: &'static str,
        identifier: String,
    },

    /// A uniqueness constraint (name, or protocol/port triple) was hit.
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Field-range validation failed; all problems reported together.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The relational store failed an operation.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] rusqlite::Error),

    /// Adapter open, filter install, or frame read failed.
    #[error("Capture failure: {0}")]
    Capture(#[from] pcap::Error),

    /// The external forecaster failed a session or an evaluation.
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    /// A display driver command failed (logged, never fatal).
    #[error("Display driver failure: {0}")]
    Driver(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// HTTP status the REST collaborator should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Conflict { .. } | Self::Validation(_) => 400,
            _ => 500,
        }
    }
}

/// Accumulator for field-validation problems.
///
/// Validation checks every field and reports the full list in one error
/// instead of stopping at the first failure.
#[derive(Debug, Default)]
pub struct ValidationErrors {
    problems: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, problem: impl Into<String>) {
        self.problems.push(problem.into());
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn problems(&self) -> &[String] {
        &self.problems
    }

    /// `Ok(())` when no problem was recorded, the composite error otherwise.
    pub fn into_result(self) -> Result<(), CoreError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed: {}", self.problems.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}
