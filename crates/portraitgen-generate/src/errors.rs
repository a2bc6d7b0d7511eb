use thiserror::Error;

use portraitgen_core::TemplateError;

/// Errors raised while resolving one entity's selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("unknown {category} option '{key}'")]
    UnknownOption { category: String, key: String },
    #[error("conflicting options: {0}")]
    Conflict(String),
    #[error("no options available for {0}")]
    EmptyPool(String),
}

impl SelectionError {
    pub fn unknown(category: &str, key: &str) -> Self {
        SelectionError::UnknownOption {
            category: category.to_string(),
            key: key.to_string(),
        }
    }

    /// Stable code used in batch reports.
    pub fn code(&self) -> &'static str {
        match self {
            SelectionError::UnknownOption { .. } => "unknown_option",
            SelectionError::Conflict(_) => "conflict",
            SelectionError::EmptyPool(_) => "empty_pool",
        }
    }
}

/// Errors emitted by batch generation and the CSV sink.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
