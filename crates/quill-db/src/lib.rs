pub mod migrations;
pub mod models;
pub mod queries;

use std::path::Path;

use r2d2_sqlite::SqliteConnectionManager;
use thiserror::Error;
use tracing::info;

/// One pooled connection, checked out for the duration of a single request.
/// Dropping the handle returns it to the pool on every exit path.
pub type DbConn = r2d2::PooledConnection<SqliteConnectionManager>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("row already exists")]
    Conflict,
    #[error("row not found")]
    NotFound,
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Pool(#[from] r2d2::Error),
}

pub struct Database {
    pool: r2d2::Pool<SqliteConnectionManager>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            // WAL mode for concurrent reads; writers queue on the busy
            // timeout instead of failing immediately.
            conn.busy_timeout(std::time::Duration::from_secs(5))?;
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "foreign_keys", "ON")
        });
        let pool = r2d2::Pool::builder().build(manager)?;

        let conn = pool.get()?;
        migrations::run(&conn)?;

        info!("database opened at {}", path.display());
        Ok(Self { pool })
    }

    /// Check a connection out of the pool. Callers hold at most one handle
    /// per request and share it across every query in that request.
    pub fn acquire(&self) -> Result<DbConn, StoreError> {
        Ok(self.pool.get()?)
    }
}
