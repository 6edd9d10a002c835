//! Error types for dispatch domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing or interpreting domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// A report payload was not a JSON object.
    #[error("report payload must be a JSON object")]
    PayloadNotObject,

    /// A field required by the customer meter record is absent.
    #[error("report field '{0}' is missing")]
    MissingReportField(&'static str),

    /// A report field is present but has the wrong shape.
    #[error("report field '{field}' is invalid: {reason}")]
    InvalidReportField {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the expected shape.
        reason: String,
    },

    /// The sub-task kind does not produce a customer meter record.
    #[error("sub-task type {0} carries no customer meter data")]
    NoMeterData(String),
}

/// Error returned while parsing stored codes and statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseCodeError {
    /// Vocabulary the value was parsed against.
    pub kind: &'static str,
    /// The rejected raw value.
    pub value: String,
}

impl ParseCodeError {
    /// Creates a parse error for the given vocabulary and raw value.
    #[must_use]
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}
