//! The record set a pagination call walks over.

use serde_json::Value as JsonValue;

use crate::sql::{quote_identifier, validate_filter, validate_identifier};
use crate::{Error, Result};

/// A filter fragment and its positional bind values.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
   sql: String,
   values: Vec<JsonValue>,
}

/// A base table plus caller filters.
///
/// The engine refines a scope with keyset predicates, ORDER BY and LIMIT.
/// Filters narrow both the page and `total_count`; cursor anchors are always
/// looked up on the unfiltered table.
///
/// # Example
///
/// ```
/// use cursor_pagination::Scope;
/// use serde_json::json;
///
/// let scope = Scope::table("posts")
///    .record_type("Post")
///    .filter("organization_id = ?", vec![json!(7)])
///    .filter("discarded_at IS NULL", vec![]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
   table: String,
   record_type: Option<String>,
   public_id_column: String,
   primary_key: String,
   select: Option<Vec<String>>,
   filters: Vec<Filter>,
}

impl Scope {
   /// Scope over every row of `table`.
   ///
   /// Defaults: record type = table name, public id column `public_id`,
   /// primary key `id`, all columns selected.
   pub fn table(table: impl Into<String>) -> Self {
      Self {
         table: table.into(),
         record_type: None,
         public_id_column: "public_id".into(),
         primary_key: "id".into(),
         select: None,
         filters: Vec::new(),
      }
   }

   /// Namespace used in cursors minted for this scope.
   pub fn record_type(mut self, record_type: impl Into<String>) -> Self {
      self.record_type = Some(record_type.into());
      self
   }

   /// Column holding the externally visible record id.
   pub fn public_id_column(mut self, column: impl Into<String>) -> Self {
      self.public_id_column = column.into();
      self
   }

   /// Unique column used as the ordering tiebreaker.
   pub fn primary_key(mut self, column: impl Into<String>) -> Self {
      self.primary_key = column.into();
      self
   }

   /// Restrict the returned columns. The public id column is always included.
   pub fn select<I, S>(mut self, columns: I) -> Self
   where
      I: IntoIterator<Item = S>,
      S: Into<String>,
   {
      self.select = Some(columns.into_iter().map(Into::into).collect());
      self
   }

   /// Add a boolean filter. Use `?` for each bound value.
   pub fn filter(mut self, sql: impl Into<String>, values: Vec<JsonValue>) -> Self {
      self.filters.push(Filter {
         sql: sql.into(),
         values,
      });
      self
   }

   pub fn table_name(&self) -> &str {
      &self.table
   }

   pub fn record_type_name(&self) -> &str {
      self.record_type.as_deref().unwrap_or(&self.table)
   }

   pub fn public_id_column_name(&self) -> &str {
      &self.public_id_column
   }

   pub fn primary_key_column(&self) -> &str {
      &self.primary_key
   }

   /// Check identifiers and filters before any SQL is built.
   pub(crate) fn validate(&self) -> Result<()> {
      validate_identifier(&self.table)?;
      validate_identifier(&self.public_id_column)?;
      validate_identifier(&self.primary_key)?;

      let record_type = self.record_type_name();
      if record_type.is_empty() || record_type.contains(':') {
         return Err(Error::InvalidRecordType {
            name: record_type.to_string(),
         });
      }

      if let Some(columns) = &self.select {
         for column in columns {
            validate_identifier(column)?;
         }
      }

      for filter in &self.filters {
         validate_filter(&filter.sql, filter.values.len())?;
      }

      Ok(())
   }

   /// Quoted table name for interpolation.
   pub(crate) fn from_sql(&self) -> String {
      quote_identifier(&self.table)
   }

   /// Column list for the page query.
   pub(crate) fn projection(&self) -> String {
      match &self.select {
         None => "*".to_string(),
         Some(columns) => {
            let mut quoted: Vec<String> = columns.iter().map(|c| quote_identifier(c)).collect();
            if !columns.iter().any(|c| c == &self.public_id_column) {
               quoted.push(quote_identifier(&self.public_id_column));
            }
            quoted.join(", ")
         }
      }
   }

   /// Filter fragments, each parenthesized so they can be ANDed safely.
   pub(crate) fn conditions(&self) -> Vec<String> {
      self.filters.iter().map(|f| format!("({})", f.sql.trim())).collect()
   }

   /// Filter bind values in placeholder order.
   pub(crate) fn values(&self) -> Vec<JsonValue> {
      self
         .filters
         .iter()
         .flat_map(|f| f.values.iter().cloned())
         .collect()
   }
}
