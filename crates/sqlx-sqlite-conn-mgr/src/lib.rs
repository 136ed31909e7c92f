//! # sqlx-sqlite-conn-mgr
//!
//! The backing store used by the cursor pagination engine: a thin wrapper
//! around SQLx that keeps reads and writes on separate SQLite pools.
//!
//! ## Core Types
//!
//! - **[`SqliteDatabase`]**: Database handle with a read pool and a single writer
//! - **[`SqliteDatabaseConfig`]**: Pool sizing and timeouts
//! - **[`WriteGuard`]**: Exclusive access to the writer connection
//! - **[`Error`]**: Error type for database operations
//!
//! ## Architecture
//!
//! - **Read pool**: read-only connections (default 6) used by pagination queries,
//!   anchor lookups, counts and schema introspection
//! - **Writer**: single-connection pool so writes are serialized
//! - **Lazy WAL mode**: enabled the first time the writer is acquired

mod config;
mod database;
mod error;
mod write_guard;

pub use config::SqliteDatabaseConfig;
pub use database::SqliteDatabase;
pub use error::{Error, Result};
pub use write_guard::WriteGuard;
