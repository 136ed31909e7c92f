use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx_sqlite_conn_mgr::{SqliteDatabase, SqliteDatabaseConfig};

use crate::builders::{PaginateBuilder, count};
use crate::config::PaginationConfig;
use crate::decode::{SqlValue, decode_rows};
use crate::{Error, Record, Scope};

/// Result returned from write operations (e.g. INSERT, UPDATE, DELETE).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteQueryResult {
   /// The number of rows affected by the write operation.
   pub rows_affected: u64,
   /// The last inserted row ID (SQLite ROWID).
   pub last_insert_id: i64,
}

/// Handle callers use to paginate scopes over a SQLite database.
#[derive(Clone)]
pub struct DatabaseWrapper {
   inner: Arc<SqliteDatabase>,
   config: PaginationConfig,
}

impl DatabaseWrapper {
   /// Connect to a SQLite database via the connection manager
   pub async fn connect(
      path: impl AsRef<Path>,
      custom_config: Option<SqliteDatabaseConfig>,
   ) -> Result<Self, Error> {
      let db = SqliteDatabase::connect(path, custom_config).await?;

      Ok(Self {
         inner: db,
         config: PaginationConfig::default(),
      })
   }

   /// Replace the page size limits used by [`paginate`](Self::paginate).
   pub fn with_pagination_config(mut self, config: PaginationConfig) -> Self {
      self.config = config;
      self
   }

   /// The underlying connection manager database
   pub fn inner(&self) -> &Arc<SqliteDatabase> {
      &self.inner
   }

   /// Execute a write query (INSERT/UPDATE/DELETE)
   pub async fn execute(
      &self,
      query: String,
      values: Vec<JsonValue>,
   ) -> Result<WriteQueryResult, Error> {
      let mut writer = self.inner.acquire_writer().await?;

      let mut q = sqlx::query(&query);
      for value in values {
         q = bind_value(q, SqlValue::from(value));
      }

      let result = q.execute(&mut *writer).await?;
      Ok(WriteQueryResult {
         rows_affected: result.rows_affected(),
         last_insert_id: result.last_insert_rowid(),
      })
   }

   /// Execute a SELECT query, returning every row
   pub async fn fetch_all(
      &self,
      query: String,
      values: Vec<JsonValue>,
   ) -> Result<Vec<Record>, Error> {
      let pool = self.inner.read_pool()?;

      let mut q = sqlx::query(&query);
      for value in values {
         q = bind_value(q, SqlValue::from(value));
      }

      let rows = q.fetch_all(pool).await?;
      decode_rows(rows)
   }

   /// Start a cursor-paginated read over `scope`.
   ///
   /// # Example
   ///
   /// ```no_run
   /// use cursor_pagination::{DatabaseWrapper, OrderColumn, Scope};
   ///
   /// # async fn run(db: DatabaseWrapper, after: Option<String>) -> cursor_pagination::Result<()> {
   /// let mut builder = db
   ///    .paginate(Scope::table("users"))
   ///    .order(OrderColumn::asc("created_at"))
   ///    .limit(20);
   /// if let Some(cursor) = after {
   ///    builder = builder.after(cursor);
   /// }
   /// let page = builder.await?;
   /// println!("{} of {}", page.results.len(), page.total_count);
   /// # Ok(())
   /// # }
   /// ```
   pub fn paginate(&self, scope: Scope) -> PaginateBuilder {
      PaginateBuilder::new(Arc::clone(&self.inner), scope, self.config)
   }

   /// Number of records in `scope`, ignoring any pagination window.
   pub async fn total_count(&self, scope: &Scope) -> Result<u64, Error> {
      scope.validate()?;
      let pool = self.inner.read_pool()?;
      count(pool, scope).await
   }

   /// Close the database connection
   pub async fn close(self) -> Result<(), Error> {
      self.inner.close().await?;
      Ok(())
   }

   /// Close the database connection and remove all database files
   pub async fn remove(self) -> Result<(), Error> {
      self.inner.remove().await?;
      Ok(())
   }
}

/// Bind a value to a SQLx query with its SQLite storage class
pub(crate) fn bind_value<'a>(
   query: sqlx::query::Query<'a, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'a>>,
   value: SqlValue,
) -> sqlx::query::Query<'a, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'a>> {
   match value {
      SqlValue::Null => query.bind(None::<String>),
      SqlValue::Integer(int_val) => query.bind(int_val),
      SqlValue::Real(real_val) => query.bind(real_val),
      SqlValue::Text(text) => query.bind(text),
      SqlValue::Blob(bytes) => query.bind(bytes),
   }
}
