//! Common error types for the school data pipeline

use thiserror::Error;

/// Common result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the pipeline crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A cell could not be converted to its typed representation
    #[error("Parse error in column '{column}' (value '{value}'): {reason}")]
    Parse {
        column: String,
        value: String,
        reason: String,
    },

    /// School code cannot be sliced into district / borough / number
    #[error("Malformed school code: '{0}'")]
    MalformedCode(String),

    /// Borough letter missing from the borough table
    #[error("Unknown borough code '{0}' (borough table is incomplete or source schema drifted)")]
    UnknownBorough(char),

    /// Test category label missing from the category table
    #[error("Unknown test category label '{0}'")]
    UnknownCategory(String),

    /// Test grade label that is neither numeric nor the "all grades" marker
    #[error("Unknown test grade label '{0}'")]
    UnknownGrade(String),

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build a [`Error::Parse`] for a cell
    pub fn parse(column: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Parse {
            column: column.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// True for errors that indicate the fixed lookup tables no longer match
    /// the upstream data
    pub fn is_schema_drift(&self) -> bool {
        matches!(
            self,
            Error::UnknownBorough(_) | Error::UnknownCategory(_) | Error::UnknownGrade(_)
        )
    }
}
