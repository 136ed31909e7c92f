//! Table schema introspection used to validate order specifications.

use sqlx::{Pool, Row, Sqlite};

use crate::Result;
use crate::sql::quote_identifier;

/// A column as reported by `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ColumnInfo {
   pub name: String,
   pub not_null: bool,
   pub primary_key: bool,
}

impl ColumnInfo {
   /// Whether the column can hold NULL.
   ///
   /// Primary key columns are treated as non-null; SQLite only guarantees
   /// this for `INTEGER PRIMARY KEY`, but a NULL key breaks pagination anyway.
   pub fn nullable(&self) -> bool {
      !self.not_null && !self.primary_key
   }
}

/// Query the columns of `table_name`.
///
/// Returns `None` if the table doesn't exist.
pub(crate) async fn table_columns(
   pool: &Pool<Sqlite>,
   table_name: &str,
) -> Result<Option<Vec<ColumnInfo>>> {
   // PRAGMA table_info returns: cid, name, type, notnull, dflt_value, pk
   let pragma = match table_name.split_once('.') {
      Some((schema, table)) => format!(
         "PRAGMA {}.table_info({})",
         quote_identifier(schema),
         quote_identifier(table)
      ),
      None => format!("PRAGMA table_info({})", quote_identifier(table_name)),
   };

   let rows = sqlx::query(&pragma).fetch_all(pool).await?;

   if rows.is_empty() {
      return Ok(None);
   }

   let mut columns = Vec::with_capacity(rows.len());
   for row in rows {
      let name: String = row.try_get("name")?;
      let not_null: i64 = row.try_get("notnull")?;
      let pk: i64 = row.try_get("pk")?;
      columns.push(ColumnInfo {
         name,
         not_null: not_null != 0,
         primary_key: pk > 0,
      });
   }

   Ok(Some(columns))
}
