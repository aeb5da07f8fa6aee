use quadstream_types::TypeError;

/// Errors from backing store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The quad cannot be stored as a fact.
    #[error("invalid quad: {0}")]
    InvalidQuad(#[from] TypeError),

    /// Failure inside the storage backend itself.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
