//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent invalid input to tree construction or search.
///
/// A search that finds nothing is not an error; see [`crate::domain::SearchMiss`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("value {value} out of range: must be between 1 and {max}")]
    ValueOutOfRange { value: i64, max: u32 },

    #[error("value list is empty")]
    EmptyInput,

    #[error("root value must not be None")]
    MissingRoot,

    #[error("invalid token '{token}' at position {position}")]
    InvalidToken { position: usize, token: String },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("node index not part of this tree")]
    DanglingIndex,
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
