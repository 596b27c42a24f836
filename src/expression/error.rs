//! Error types for filter compilation.

use thiserror::Error;

/// Errors that can occur while flattening, extracting or compiling a filter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// The expression uses a construct outside the supported grammar subset.
    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),

    /// A field referenced by the filter is not declared by the target type.
    #[error("Field '{field}' cannot be resolved on {target}")]
    UnresolvedField { field: String, target: String },
}

impl FilterError {
    pub fn unsupported(message: impl Into<String>) -> Self {
        FilterError::UnsupportedExpression(message.into())
    }
}

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;
