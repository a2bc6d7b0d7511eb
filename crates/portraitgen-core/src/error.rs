use thiserror::Error;

use crate::validation::ValidationReport;

/// Errors raised while building a template store.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A string-encoded constraint entry could not be parsed.
    #[error("malformed constraint entry '{entry}': {reason}")]
    MalformedEntry { entry: String, reason: String },
    /// The assembled template violates internal invariants.
    #[error("invalid template: {0}")]
    Invalid(ValidationReport),
}

/// Convenience alias for template construction results.
pub type Result<T> = std::result::Result<T, TemplateError>;
