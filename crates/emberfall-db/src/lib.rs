pub mod error;
pub mod migrations;
pub mod models;
pub mod queries;

pub use error::{DbError, Result};

use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_POOL_SIZE: usize = 4;
pub const MAX_POOL_SIZE: usize = 32;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the account/character store: one writer connection plus a
/// bounded pool of read-only connections picked round-robin.
///
/// Constructed once at startup and shared through the HTTP state; call
/// [`Database::close`] on shutdown to release every connection.
pub struct Database {
    path: PathBuf,
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    reader_idx: AtomicUsize,
}

impl Database {
    /// Open from a connection string: a filesystem path, optionally prefixed
    /// with `sqlite://` or `sqlite:`.
    pub fn connect(url: &str, pool_size: usize) -> Result<Self> {
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        Self::open(Path::new(path), pool_size)
    }

    pub fn open(path: &Path, pool_size: usize) -> Result<Self> {
        let pool_size = pool_size.clamp(1, MAX_POOL_SIZE);

        let writer = Connection::open(path)?;

        // WAL mode so readers never wait on the writer
        writer.pragma_update(None, "journal_mode", "WAL")?;
        writer.pragma_update(None, "foreign_keys", "ON")?;
        writer.busy_timeout(BUSY_TIMEOUT)?;

        migrations::run(&writer)?;

        let mut readers = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            conn.busy_timeout(BUSY_TIMEOUT)?;
            readers.push(Mutex::new(conn));
        }

        info!(
            "Database opened at {} (1 writer + {} readers)",
            path.display(),
            pool_size
        );
        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(writer),
            readers,
            reader_idx: AtomicUsize::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pool_size(&self) -> usize {
        self.readers.len()
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let idx = self.reader_idx.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[idx]
            .lock()
            .map_err(|e| DbError::Pool(format!("reader {idx}: {e}")))?;
        f(&conn)
    }

    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .writer
            .lock()
            .map_err(|e| DbError::Pool(format!("writer: {e}")))?;
        f(&conn)
    }

    /// Cheap liveness probe used by the health route.
    pub fn ping(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
    }

    /// Close every connection. Readers are closed first, then the writer, so
    /// the WAL is checkpointed by the last connection out.
    pub fn close(self) -> Result<()> {
        let mut first_err = None;

        for (idx, reader) in self.readers.into_iter().enumerate() {
            let conn = reader
                .into_inner()
                .map_err(|e| DbError::Pool(format!("reader {idx}: {e}")))?;
            if let Err((_, e)) = conn.close() {
                warn!("Failed to close reader connection {}: {}", idx, e);
                first_err.get_or_insert(DbError::from(e));
            }
        }

        let writer = self
            .writer
            .into_inner()
            .map_err(|e| DbError::Pool(format!("writer: {e}")))?;
        if let Err((_, e)) = writer.close() {
            warn!("Failed to close writer connection: {}", e);
            first_err.get_or_insert(DbError::from(e));
        }

        match first_err {
            Some(e) => Err(e),
            None => {
                info!("Database at {} closed", self.path.display());
                Ok(())
            }
        }
    }
}
