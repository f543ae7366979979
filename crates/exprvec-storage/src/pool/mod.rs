//! Connection pool: one writer, many readers.

pub mod pragmas;
pub mod read_pool;
pub mod write_connection;

use std::path::{Path, PathBuf};

use exprvec_core::config::StorageConfig;
use exprvec_core::errors::ExprResult;

pub use read_pool::ReadPool;
pub use write_connection::WriteConnection;

pub struct ConnectionPool {
    pub writer: WriteConnection,
    /// `None` in memory: a second in-memory connection would be a separate
    /// database, so reads go through the writer.
    pub readers: Option<ReadPool>,
    pub db_path: Option<PathBuf>,
}

impl ConnectionPool {
    /// The writer opens (and creates) the file before readers attach to it.
    pub fn open(path: &Path, config: &StorageConfig) -> ExprResult<Self> {
        let writer = WriteConnection::open(path, config.busy_timeout_ms)?;
        let readers = ReadPool::open(path, config.read_pool_size, config.busy_timeout_ms)?;
        Ok(Self {
            writer,
            readers: Some(readers),
            db_path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> ExprResult<Self> {
        Ok(Self {
            writer: WriteConnection::open_in_memory()?,
            readers: None,
            db_path: None,
        })
    }
}
