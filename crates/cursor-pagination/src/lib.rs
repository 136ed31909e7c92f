//! # cursor-pagination
//!
//! Keyset pagination over SQLite tables with opaque, record-bound cursors.
//!
//! A page is requested against a [`Scope`] (a table plus caller filters) with
//! an [`OrderSpec`], an optional `after` or `before` [`Cursor`] and a page
//! size. The engine:
//!
//! - appends the primary key as a tiebreaker so the ordering is total
//! - looks up the cursor's record and turns its sort values into a nested
//!   keyset predicate (NULLs sort first ascending, last descending)
//! - fetches one extra row to decide whether another page exists
//! - returns [`PageResult`] with the rows, boundary cursors and the filtered
//!   `total_count`
//!
//! ## Example
//!
//! ```no_run
//! use cursor_pagination::{DatabaseWrapper, OrderColumn, OrderSpec, Scope};
//! use serde_json::json;
//!
//! # async fn run() -> cursor_pagination::Result<()> {
//! let db = DatabaseWrapper::connect("app.db", None).await?;
//!
//! let scope = Scope::table("posts")
//!    .record_type("Post")
//!    .filter("organization_id = ?", vec![json!(7)]);
//!
//! let first = db
//!    .paginate(scope.clone())
//!    .order(OrderSpec::new().then(OrderColumn::desc("published_at")))
//!    .limit(25)
//!    .await?;
//!
//! if let Some(next) = first.next_cursor {
//!    let second = db.paginate(scope).after(next).limit(25).await?;
//!    println!("{}", serde_json::to_string(&second).unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

mod builders;
mod config;
mod cursor;
mod decode;
mod error;
mod order;
mod pagination;
mod schema;
mod scope;
mod sql;
mod wrapper;

pub use builders::{PageResult, PaginateBuilder};
pub use config::PaginationConfig;
pub use cursor::Cursor;
pub use error::{Error, Result};
pub use order::{OrderColumn, OrderSpec, SortDirection};
pub use scope::{Filter, Scope};
pub use sqlx_sqlite_conn_mgr::SqliteDatabaseConfig;
pub use wrapper::{DatabaseWrapper, WriteQueryResult};

/// A decoded row: column name to JSON value, in select-list order.
pub type Record = indexmap::IndexMap<String, serde_json::Value>;
