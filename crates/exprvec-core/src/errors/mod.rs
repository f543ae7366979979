mod cache_error;
mod codec_error;
mod expr_error;
mod masking_error;
mod rebuild_error;
mod storage_error;

pub use cache_error::CacheError;
pub use codec_error::CodecError;
pub use expr_error::ExprError;
pub use masking_error::MaskingError;
pub use rebuild_error::RebuildError;
pub use storage_error::StorageError;

/// Convenience alias used across the workspace.
pub type ExprResult<T> = Result<T, ExprError>;
