//! PRAGMA configuration applied to every SQLite connection.

use rusqlite::Connection;

use exprvec_core::errors::ExprResult;

use crate::to_storage_err;

/// Pragmas for the write connection: WAL, NORMAL sync, foreign keys.
pub fn apply_pragmas(conn: &Connection, busy_timeout_ms: u32) -> ExprResult<()> {
    conn.execute_batch(&format!(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA mmap_size = 268435456;
        PRAGMA cache_size = -64000;
        PRAGMA busy_timeout = {busy_timeout_ms};
        PRAGMA foreign_keys = ON;
        "
    ))
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Pragmas for pooled readers. Readers never write.
pub fn apply_read_pragmas(conn: &Connection, busy_timeout_ms: u32) -> ExprResult<()> {
    conn.execute_batch(&format!(
        "
        PRAGMA query_only = ON;
        PRAGMA mmap_size = 268435456;
        PRAGMA cache_size = -16000;
        PRAGMA busy_timeout = {busy_timeout_ms};
        "
    ))
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Whether WAL journaling is active on a connection.
pub fn verify_wal_mode(conn: &Connection) -> ExprResult<bool> {
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}
