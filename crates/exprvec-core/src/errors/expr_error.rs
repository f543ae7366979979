use super::{CacheError, CodecError, MaskingError, RebuildError, StorageError};

/// Top-level error for every operation in the engine.
#[derive(Debug, thiserror::Error)]
pub enum ExprError {
    #[error("codec error: {0}")]
    CodecError(#[from] CodecError),

    #[error("masking error: {0}")]
    MaskingError(#[from] MaskingError),

    #[error("rebuild error: {0}")]
    RebuildError(#[from] RebuildError),

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("cache error: {0}")]
    CacheError(#[from] CacheError),

    #[error("operation cancelled: {operation}")]
    Cancelled { operation: String },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },
}

impl ExprError {
    /// Whether the error came from the backing store. Store failures are the
    /// only class a caller may reasonably retry.
    pub fn is_store_error(&self) -> bool {
        matches!(self, ExprError::StorageError(_))
    }
}
