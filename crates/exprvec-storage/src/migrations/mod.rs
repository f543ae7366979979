//! Ordered, idempotent schema migrations tracked in `schema_version`.

mod v001_entities;
mod v002_vectors;

use rusqlite::Connection;
use tracing::info;

use exprvec_core::errors::{ExprResult, StorageError};

use crate::to_storage_err;

type Migration = fn(&Connection) -> ExprResult<()>;

const MIGRATIONS: &[(u32, &str, Migration)] = &[
    (1, "entities", v001_entities::migrate),
    (2, "vectors", v002_vectors::migrate),
];

/// Highest schema version this build knows.
pub const LATEST_VERSION: u32 = 2;

/// Apply every migration newer than the recorded version. Each runs in its
/// own transaction together with its `schema_version` row.
pub fn run_migrations(conn: &Connection) -> ExprResult<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version     INTEGER PRIMARY KEY,
            applied_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    let current = current_version(conn)?;
    let mut applied = current;
    for &(version, name, migrate) in MIGRATIONS {
        if version <= current {
            continue;
        }
        let failed = |reason: String| StorageError::MigrationFailed { version, reason };

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| failed(e.to_string()))?;
        migrate(&tx).map_err(|e| failed(e.to_string()))?;
        tx.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [version],
        )
        .map_err(|e| failed(e.to_string()))?;
        tx.commit().map_err(|e| failed(e.to_string()))?;

        info!(version, name, "applied schema migration");
        applied = version;
    }
    Ok(applied)
}

/// The recorded schema version, 0 on a fresh database.
pub fn current_version(conn: &Connection) -> ExprResult<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}
