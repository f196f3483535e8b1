use thiserror::Error;

/// Failure kinds detected while validating a request or building its statement.
///
/// These are raised through [`crate::Error`] (`anyhow`) like any other error; callers that
/// need to react to a specific kind can recover it with `error.downcast_ref::<StatementError>()`.
/// Errors coming from the driver are never converted into this type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatementError {
    /// A required argument (table name, qualifiers, aggregated field) is missing or blank.
    #[error("The argument `{0}` cannot be null, empty or whitespace")]
    ArgumentNull(&'static str),
    /// No field is left to be written.
    #[error("The list of fields cannot be null or empty")]
    EmptyFields,
    /// Declared metadata disagrees with the authoritative column metadata.
    #[error("{0}")]
    InvalidOperation(String),
    /// Qualifiers not covered by the target fields.
    #[error("Invalid qualifiers, the following fields are not part of the target: {}", .0.join(", "))]
    InvalidQualifiers(Vec<String>),
    /// The dialect lacks a capability the request needs.
    #[error("{0}")]
    NotSupported(String),
    /// A key field is required but none was found.
    #[error("No primary, identity or qualifier field was found for `{0}`")]
    KeyFieldNotFound(String),
}
