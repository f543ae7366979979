use crate::models::PrimitiveType;

/// Binary vector codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed {primitive} vector: {reason}")]
    MalformedVector {
        primitive: PrimitiveType,
        reason: String,
    },

    #[error("vector type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: PrimitiveType,
        actual: PrimitiveType,
    },

    #[error("{primitive} values cannot be read as numbers")]
    NotNumeric { primitive: PrimitiveType },
}
