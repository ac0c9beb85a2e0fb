use thiserror::Error;

/// Caller mistakes in a lookup or query, as opposed to storage failures.
///
/// The HTTP layer maps `InvalidInput` variants to 400 and `NotFound`
/// variants to 404; anything else becomes a 500.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("unknown difficulty '{0}' (expected beginner, intermediate, or advanced)")]
    InvalidDifficulty(String),

    #[error("invalid index key '{0}' (expected A-Z or 0-9)")]
    InvalidIndexKey(String),

    #[error("term not found: {0}")]
    TermNotFound(String),

    #[error("category not found: {0}")]
    CategoryNotFound(String),
}

impl LookupError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LookupError::TermNotFound(_) | LookupError::CategoryNotFound(_)
        )
    }
}
