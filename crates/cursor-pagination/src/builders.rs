//! The pagination call: boundary resolution and result window assembly.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use sqlx::{Pool, Row, Sqlite};
use sqlx_sqlite_conn_mgr::SqliteDatabase;
use tracing::{debug, trace, warn};

use crate::config::PaginationConfig;
use crate::cursor::{Cursor, encode_record};
use crate::decode::{SqlValue, decode_rows, row_values};
use crate::order::{OrderSpec, SortKey};
use crate::pagination::{Traversal, build_anchor_query, build_count_query, build_page_query};
use crate::schema::table_columns;
use crate::wrapper::bind_value;
use crate::{Error, Record, Result, Scope};

/// A page of results from cursor pagination.
///
/// Serializes as `{"data": [...], "next_cursor": ..., "prev_cursor": ...,
/// "total_count": ...}`.
#[derive(Debug, Clone, Serialize)]
pub struct PageResult {
   /// The rows in this page, in the requested order
   #[serde(rename = "data")]
   pub results: Vec<Record>,
   /// Cursor of the last row, for `.after()`; `None` at the end of the collection
   pub next_cursor: Option<Cursor>,
   /// Cursor of the first row, for `.before()`; `None` at the start of the collection
   pub prev_cursor: Option<Cursor>,
   /// Size of the filtered scope, independent of the pagination window
   pub total_count: u64,
}

/// Builder for a cursor-paginated read over a [`Scope`].
///
/// Created by [`DatabaseWrapper::paginate`](crate::DatabaseWrapper::paginate)
/// and run by awaiting it.
pub struct PaginateBuilder {
   db: Arc<SqliteDatabase>,
   scope: Scope,
   order: OrderSpec,
   after: Option<Cursor>,
   before: Option<Cursor>,
   limit: Option<usize>,
   config: PaginationConfig,
}

impl PaginateBuilder {
   pub(crate) fn new(db: Arc<SqliteDatabase>, scope: Scope, config: PaginationConfig) -> Self {
      Self {
         db,
         scope,
         order: OrderSpec::default(),
         after: None,
         before: None,
         limit: None,
         config,
      }
   }

   /// Set the ordering. Defaults to primary key, descending.
   pub fn order(mut self, order: impl Into<OrderSpec>) -> Self {
      self.order = order.into();
      self
   }

   /// Fetch the page that follows the record this cursor points to.
   pub fn after(mut self, cursor: impl Into<Cursor>) -> Self {
      self.after = Some(cursor.into());
      self
   }

   /// Fetch the page that precedes the record this cursor points to.
   ///
   /// Rows are returned in the requested order (not reversed).
   pub fn before(mut self, cursor: impl Into<Cursor>) -> Self {
      self.before = Some(cursor.into());
      self
   }

   /// Requested page size; zero means the configured default, and values
   /// above the configured maximum are clamped.
   pub fn limit(mut self, limit: usize) -> Self {
      self.limit = Some(limit);
      self
   }

   /// Override the page size limits for this call.
   pub fn config(mut self, config: PaginationConfig) -> Self {
      self.config = config;
      self
   }

   /// Run the paginated query and return a page of results.
   pub async fn execute(self) -> Result<PageResult> {
      self.scope.validate()?;

      let (cursor, traversal) = match (self.after, self.before) {
         (Some(_), Some(_)) => return Err(Error::ConflictingCursors),
         (Some(cursor), None) => (Some(cursor), Traversal::After),
         (None, Some(cursor)) => (Some(cursor), Traversal::Before),
         (None, None) => (None, Traversal::After),
      };

      let per_page = self.config.per_page(self.limit);
      let pool = self.db.read_pool()?;

      let columns = table_columns(pool, self.scope.table_name())
         .await?
         .ok_or_else(|| {
            Error::InvalidOrderSpecification(format!(
               "table '{}' does not exist",
               self.scope.table_name()
            ))
         })?;
      let keys = self.order.normalize(&self.scope, &columns)?;

      let boundary = match &cursor {
         Some(cursor) => Some(resolve_boundary(pool, &self.scope, &keys, cursor).await?),
         None => None,
      };

      let (sql, values) = build_page_query(
         &self.scope,
         &keys,
         boundary.as_deref(),
         traversal,
         per_page.saturating_add(1),
      );
      debug!(
         table = self.scope.table_name(),
         ?traversal,
         per_page,
         sql = %sql,
         "running page query"
      );

      let mut q = sqlx::query(&sql);
      for value in values {
         q = bind_value(q, value);
      }
      let rows = q.fetch_all(pool).await?;
      let mut results = decode_rows(rows)?;

      // One extra row was requested; its presence means another page exists
      let has_more = results.len() > per_page;
      if has_more {
         results.truncate(per_page);
      }

      // Backward pages come back nearest-first; restore the requested order
      if traversal == Traversal::Before {
         results.reverse();
      }

      let encode = |row: &Record| {
         encode_record(
            row,
            self.scope.record_type_name(),
            self.scope.public_id_column_name(),
         )
      };
      let first_cursor = results.first().map(encode).transpose()?;
      let last_cursor = results.last().map(encode).transpose()?;

      // Past either end the page is empty; point back at the boundary so the
      // caller can still turn around.
      let turn_around = |row_cursor: Option<Cursor>| match &cursor {
         Some(boundary) => row_cursor.or_else(|| Some(boundary.clone())),
         None => None,
      };

      let (next_cursor, prev_cursor) = match traversal {
         Traversal::After => (last_cursor.filter(|_| has_more), turn_around(first_cursor)),
         Traversal::Before => (turn_around(last_cursor), first_cursor.filter(|_| has_more)),
      };

      let total_count = count(pool, &self.scope).await?;

      trace!(
         rows = results.len(),
         has_more,
         total_count,
         "assembled page"
      );

      Ok(PageResult {
         results,
         next_cursor,
         prev_cursor,
         total_count,
      })
   }
}

impl IntoFuture for PaginateBuilder {
   type Output = Result<PageResult>;
   type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

   fn into_future(self) -> Self::IntoFuture {
      Box::pin(self.execute())
   }
}

/// Look up the cursor's record on the unfiltered table and return its sort
/// values, aligned with `keys`.
async fn resolve_boundary(
   pool: &Pool<Sqlite>,
   scope: &Scope,
   keys: &[SortKey],
   cursor: &Cursor,
) -> Result<Vec<SqlValue>> {
   let public_id = cursor.decode(scope.record_type_name())?;

   let sql = build_anchor_query(scope, keys);
   let row = sqlx::query(&sql)
      .bind(public_id.clone())
      .fetch_optional(pool)
      .await?;

   let Some(row) = row else {
      warn!(
         record_type = scope.record_type_name(),
         public_id = %public_id,
         "cursor points at a missing record"
      );
      return Err(Error::RecordNotFound {
         record_type: scope.record_type_name().to_string(),
         public_id,
      });
   };

   row_values(&row)
}

/// Count the filtered scope.
pub(crate) async fn count(pool: &Pool<Sqlite>, scope: &Scope) -> Result<u64> {
   let (sql, values) = build_count_query(scope);

   let mut q = sqlx::query(&sql);
   for value in values {
      q = bind_value(q, value);
   }
   let total: i64 = q.fetch_one(pool).await?.try_get(0)?;

   Ok(u64::try_from(total).unwrap_or_default())
}
