//! Configuration for SQLite database connection pools

use std::time::Duration;

/// Configuration for [`SqliteDatabase`](crate::SqliteDatabase) pools
///
/// # Examples
///
/// ```
/// use sqlx_sqlite_conn_mgr::SqliteDatabaseConfig;
/// use std::time::Duration;
///
/// let config = SqliteDatabaseConfig {
///     max_read_connections: 2,
///     ..Default::default()
/// };
/// assert_eq!(config.idle_timeout, Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct SqliteDatabaseConfig {
   /// Maximum number of concurrent read connections
   ///
   /// Every pagination call runs its page query, anchor lookup and count on
   /// this pool.
   ///
   /// Default: 6
   pub max_read_connections: u32,

   /// Idle timeout for both read and write connections
   ///
   /// Default: 30 seconds
   pub idle_timeout: Duration,

   /// How long a connection waits on a locked database before failing
   ///
   /// Default: 5 seconds
   pub busy_timeout: Duration,
}

impl Default for SqliteDatabaseConfig {
   fn default() -> Self {
      Self {
         max_read_connections: 6,
         idle_timeout: Duration::from_secs(30),
         busy_timeout: Duration::from_secs(5),
      }
   }
}
