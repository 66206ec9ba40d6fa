//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum BorderError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// A setting could not be resolved into a usable value.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A demonstration file is missing, unreadable or corrupt.
    #[error("Failed to load demonstrations: {0}")]
    DemoLoad(String),

    /// A gradient step produced a non-finite value.
    #[error("Numeric error: {0}")]
    Numeric(String),

    /// Demonstrations do not fit the observation/action spec of the policy.
    #[error("Shape mismatch in demonstrations ({field}): expected {expected}, got {actual}")]
    DemoShapeMismatch {
        /// Name of the offending field.
        field: String,

        /// What the policy expects.
        expected: String,

        /// What was found in the demonstrations.
        actual: String,
    },
}

impl BorderError {
    pub(crate) fn shape_mismatch(
        field: impl Into<String>,
        expected: impl std::fmt::Debug,
        actual: impl std::fmt::Debug,
    ) -> Self {
        Self::DemoShapeMismatch {
            field: field.into(),
            expected: format!("{:?}", expected),
            actual: format!("{:?}", actual),
        }
    }
}
