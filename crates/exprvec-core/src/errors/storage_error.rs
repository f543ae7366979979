/// Backing-store errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: u32, reason: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("corrupt vector blob: {details}")]
    Corruption { details: String },

    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },
}
