//! SQLite database with a concurrent read pool and a serialized writer

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::{debug, trace};

use crate::config::SqliteDatabaseConfig;
use crate::error::{Error, Result};
use crate::write_guard::WriteGuard;

/// SQLite database with connection pooling for concurrent reads and exclusive writes.
///
/// ## Architecture
///
/// The database maintains two connection pools:
/// - **`read_pool`**: read-only connections for concurrent reads
/// - **`write_conn`**: single-connection pool for exclusive write access (max_connections=1)
///
/// ## State Management
///
/// - **`wal_initialized`**: whether WAL journal mode has been enabled (set on first write)
/// - **`closed`**: prevents use after the database has been closed
/// - **`path`**: database file path for cleanup
#[derive(Debug)]
pub struct SqliteDatabase {
   read_pool: Pool<Sqlite>,
   write_conn: Pool<Sqlite>,
   wal_initialized: AtomicBool,
   closed: AtomicBool,
   path: PathBuf,
}

impl SqliteDatabase {
   /// Open (creating if necessary) the database at `path`.
   ///
   /// The writer pool connects eagerly so the file exists before any reader
   /// opens it; the read pool connects lazily.
   pub async fn connect(
      path: impl AsRef<Path>,
      custom_config: Option<SqliteDatabaseConfig>,
   ) -> Result<Arc<Self>> {
      let config = custom_config.unwrap_or_default();
      let path = path.as_ref().to_path_buf();

      if let Some(parent) = path.parent()
         && !parent.as_os_str().is_empty()
      {
         std::fs::create_dir_all(parent)?;
      }

      let write_options = SqliteConnectOptions::new()
         .filename(&path)
         .create_if_missing(true)
         .busy_timeout(config.busy_timeout);

      let write_conn = SqlitePoolOptions::new()
         .max_connections(1)
         .idle_timeout(Some(config.idle_timeout))
         .connect_with(write_options)
         .await?;

      let read_options = SqliteConnectOptions::new()
         .filename(&path)
         .read_only(true)
         .busy_timeout(config.busy_timeout);

      let read_pool = SqlitePoolOptions::new()
         .max_connections(config.max_read_connections.max(1))
         .idle_timeout(Some(config.idle_timeout))
         .connect_lazy_with(read_options);

      debug!(
         path = %path.display(),
         max_read_connections = config.max_read_connections,
         "opened sqlite database"
      );

      Ok(Arc::new(Self {
         read_pool,
         write_conn,
         wal_initialized: AtomicBool::new(false),
         closed: AtomicBool::new(false),
         path,
      }))
   }

   /// Path of the underlying database file
   pub fn path(&self) -> &Path {
      &self.path
   }

   /// Read-only pool for queries
   pub fn read_pool(&self) -> Result<&Pool<Sqlite>> {
      self.ensure_open()?;
      Ok(&self.read_pool)
   }

   /// Acquire the single writer connection.
   ///
   /// Waits until any other holder drops its [`WriteGuard`]. The first
   /// acquisition switches the database to WAL so readers are not blocked by
   /// the writer.
   pub async fn acquire_writer(&self) -> Result<WriteGuard> {
      self.ensure_open()?;

      let mut conn = self.write_conn.acquire().await?;

      if !self.wal_initialized.load(Ordering::Acquire) {
         sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&mut *conn)
            .await?;
         self.wal_initialized.store(true, Ordering::Release);
         debug!(path = %self.path.display(), "enabled WAL journal mode");
      }

      trace!("acquired writer");
      Ok(WriteGuard::new(conn))
   }

   /// Close both pools. Closing twice is a no-op.
   pub async fn close(&self) -> Result<()> {
      if self.closed.swap(true, Ordering::AcqRel) {
         return Ok(());
      }

      self.read_pool.close().await;
      self.write_conn.close().await;
      debug!(path = %self.path.display(), "closed sqlite database");
      Ok(())
   }

   /// Close the database and delete its file along with WAL side files
   pub async fn remove(&self) -> Result<()> {
      self.close().await?;

      let mut wal = self.path.clone().into_os_string();
      wal.push("-wal");
      let mut shm = self.path.clone().into_os_string();
      shm.push("-shm");

      for file in [self.path.clone(), PathBuf::from(wal), PathBuf::from(shm)] {
         match std::fs::remove_file(&file) {
            Ok(()) => trace!(file = %file.display(), "removed database file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::Io(e)),
         }
      }

      Ok(())
   }

   fn ensure_open(&self) -> Result<()> {
      if self.closed.load(Ordering::Acquire) {
         return Err(Error::DatabaseClosed);
      }
      Ok(())
   }
}
