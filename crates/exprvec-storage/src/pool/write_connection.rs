//! The single write connection. Writes are serialized on its mutex.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use exprvec_core::errors::ExprResult;

use super::pragmas::apply_pragmas;
use crate::to_storage_err;

pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    pub fn open(path: &Path, busy_timeout_ms: u32) -> ExprResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, busy_timeout_ms)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> ExprResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, 0)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` holding the write lock.
    pub fn with_conn<F, T>(&self, f: F) -> ExprResult<T>
    where
        F: FnOnce(&Connection) -> ExprResult<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|e| to_storage_err(format!("write connection lock poisoned: {e}")))?;
        f(&guard)
    }
}
