//! Error types for sqlx-sqlite-conn-mgr

use thiserror::Error;

/// Errors raised while opening, using or tearing down a [`SqliteDatabase`](crate::SqliteDatabase)
#[derive(Error, Debug)]
pub enum Error {
   /// Filesystem error while creating or removing database files
   #[error("IO error: {0}")]
   Io(#[from] std::io::Error),

   /// Error reported by sqlx (connect, acquire or pragma execution)
   #[error("Sqlx error: {0}")]
   Sqlx(#[from] sqlx::Error),

   /// The database was closed and can no longer hand out connections
   #[error("Database has been closed")]
   DatabaseClosed,
}

/// Result alias for connection manager operations
pub type Result<T> = std::result::Result<T, Error>;
