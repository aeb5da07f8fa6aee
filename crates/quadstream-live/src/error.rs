use std::error::Error as StdError;

use quadstream_store::StoreError;

/// Boxed error raised by an import's own input stream.
pub type SourceError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors produced by the live store.
#[derive(Debug, thiserror::Error)]
pub enum LiveError {
    /// An import was attempted after the store was finalized.
    #[error("attempted to import into a finalized store")]
    Finalized,

    /// The input stream of an import failed. The original error is kept
    /// as-is and can be recovered with [`LiveError::source_error`].
    #[error("import source failed: {0}")]
    Upstream(#[source] SourceError),

    /// The backing store rejected an operation.
    #[error("backing store error: {0}")]
    Store(#[from] StoreError),
}

impl LiveError {
    pub fn is_finalized(&self) -> bool {
        matches!(self, Self::Finalized)
    }

    /// The input stream's own error, for [`LiveError::Upstream`].
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            Self::Upstream(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the live crate.
pub type LiveResult<T> = std::result::Result<T, LiveError>;
