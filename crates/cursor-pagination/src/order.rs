//! Order specifications and their normalization into a total order.
//!
//! Callers describe how a page should be sorted with an [`OrderSpec`]: a
//! single column, a list of columns with directions, or just a direction
//! (meaning "by primary key"). Before any query is built the ordering is checked
//! against the table schema and, unless it already contains a unique column,
//! the primary key is appended as a tiebreaker so that rows with equal sort
//! values still have a well-defined position between pages.
//!
//! # Example
//!
//! ```
//! use cursor_pagination::{OrderColumn, OrderSpec};
//!
//! let order = OrderSpec::from(vec![
//!    OrderColumn::asc("name"),
//!    OrderColumn::desc("created_at"),
//! ]);
//! assert_eq!(order.columns().len(), 2);
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::schema::ColumnInfo;
use crate::sql::validate_identifier;
use crate::{Error, Result, Scope};

/// Sort direction for an order column.
///
/// Defaults to descending: most-recent-first is the common case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
   /// Ascending order (smallest first)
   Asc,
   /// Descending order (largest first)
   #[default]
   Desc,
}

impl SortDirection {
   /// Return the opposite sort direction.
   pub fn reversed(self) -> Self {
      match self {
         SortDirection::Asc => SortDirection::Desc,
         SortDirection::Desc => SortDirection::Asc,
      }
   }

   pub(crate) fn as_sql(self) -> &'static str {
      match self {
         SortDirection::Asc => "ASC",
         SortDirection::Desc => "DESC",
      }
   }
}

/// One column of an order specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderColumn {
   /// Column name on the scope's table
   pub name: String,
   /// Sort direction for this column
   #[serde(default)]
   pub direction: SortDirection,
}

impl OrderColumn {
   /// Create an order column with an explicit direction.
   pub fn new(name: impl Into<String>, direction: SortDirection) -> Self {
      Self {
         name: name.into(),
         direction,
      }
   }

   /// Create an order column with ascending sort direction.
   pub fn asc(name: impl Into<String>) -> Self {
      Self::new(name, SortDirection::Asc)
   }

   /// Create an order column with descending sort direction.
   pub fn desc(name: impl Into<String>) -> Self {
      Self::new(name, SortDirection::Desc)
   }
}

/// Caller-supplied ordering, first column is the primary sort key.
///
/// An empty ordering sorts by primary key in [`OrderSpec::direction`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
   columns: Vec<OrderColumn>,
   direction: SortDirection,
}

impl OrderSpec {
   /// Order by primary key, descending.
   pub fn new() -> Self {
      Self::default()
   }

   /// Order by primary key in the given direction.
   pub fn by_primary_key(direction: SortDirection) -> Self {
      Self {
         columns: Vec::new(),
         direction,
      }
   }

   /// Append a column with lower precedence than those already present.
   pub fn then(mut self, column: OrderColumn) -> Self {
      self.columns.push(column);
      self
   }

   /// The explicit columns, in precedence order.
   pub fn columns(&self) -> &[OrderColumn] {
      &self.columns
   }

   /// Direction used for the primary key when no columns are given.
   pub fn direction(&self) -> SortDirection {
      self.direction
   }

   /// Validate against the table schema and append the tiebreaker.
   ///
   /// The primary key is appended unless the ordering already includes it or the
   /// public id column. Its direction matches the last explicit column, or
   /// the ordering's own direction when there are none.
   pub(crate) fn normalize(&self, scope: &Scope, columns: &[ColumnInfo]) -> Result<Vec<SortKey>> {
      let lookup = |name: &str| columns.iter().find(|c| c.name == name);

      let mut keys = Vec::with_capacity(self.columns.len() + 1);
      let mut seen = HashSet::new();

      for column in &self.columns {
         validate_identifier(&column.name)?;

         if !seen.insert(column.name.as_str()) {
            return Err(Error::InvalidOrderSpecification(format!(
               "column '{}' appears more than once",
               column.name
            )));
         }

         let info = lookup(&column.name).ok_or_else(|| {
            Error::InvalidOrderSpecification(format!(
               "unknown column '{}' on '{}'",
               column.name,
               scope.table_name()
            ))
         })?;

         keys.push(SortKey {
            name: column.name.clone(),
            direction: column.direction,
            nullable: info.nullable(),
         });
      }

      let unique = [scope.primary_key_column(), scope.public_id_column_name()];
      if !keys.iter().any(|k| unique.contains(&k.name.as_str())) {
         let primary_key = scope.primary_key_column();
         let info = lookup(primary_key).ok_or_else(|| {
            Error::InvalidOrderSpecification(format!(
               "tiebreaker column '{}' does not exist on '{}'",
               primary_key,
               scope.table_name()
            ))
         })?;

         let direction = keys.last().map_or(self.direction, |k| k.direction);
         keys.push(SortKey {
            name: primary_key.to_string(),
            direction,
            nullable: info.nullable(),
         });
      }

      Ok(keys)
   }
}

impl From<OrderColumn> for OrderSpec {
   fn from(column: OrderColumn) -> Self {
      Self::new().then(column)
   }
}

impl From<Vec<OrderColumn>> for OrderSpec {
   fn from(columns: Vec<OrderColumn>) -> Self {
      Self {
         columns,
         direction: SortDirection::default(),
      }
   }
}

impl From<SortDirection> for OrderSpec {
   fn from(direction: SortDirection) -> Self {
      Self::by_primary_key(direction)
   }
}

/// A column of the normalized, total ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SortKey {
   pub name: String,
   pub direction: SortDirection,
   pub nullable: bool,
}

impl SortKey {
   pub fn reversed(&self) -> Self {
      Self {
         name: self.name.clone(),
         direction: self.direction.reversed(),
         nullable: self.nullable,
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   fn users_columns() -> Vec<ColumnInfo> {
      let column = |name: &str, not_null: bool, primary_key: bool| ColumnInfo {
         name: name.into(),
         not_null,
         primary_key,
      };
      vec![
         column("id", false, true),
         column("public_id", true, false),
         column("name", true, false),
         column("created_at", true, false),
         column("onboarded_at", false, false),
      ]
   }

   fn names(keys: &[SortKey]) -> Vec<(&str, SortDirection)> {
      keys.iter().map(|k| (k.name.as_str(), k.direction)).collect()
   }

   #[test]
   fn empty_spec_orders_by_primary_key_descending() {
      let keys = OrderSpec::new()
         .normalize(&Scope::table("users"), &users_columns())
         .unwrap();
      assert_eq!(names(&keys), vec![("id", SortDirection::Desc)]);
   }

   #[test]
   fn bare_direction_orders_by_primary_key() {
      let keys = OrderSpec::from(SortDirection::Asc)
         .normalize(&Scope::table("users"), &users_columns())
         .unwrap();
      assert_eq!(names(&keys), vec![("id", SortDirection::Asc)]);
   }

   #[test]
   fn tiebreaker_follows_last_direction() {
      let keys = OrderSpec::from(vec![
         OrderColumn::asc("name"),
         OrderColumn::desc("created_at"),
      ])
      .normalize(&Scope::table("users"), &users_columns())
      .unwrap();

      assert_eq!(
         names(&keys),
         vec![
            ("name", SortDirection::Asc),
            ("created_at", SortDirection::Desc),
            ("id", SortDirection::Desc),
         ]
      );
   }

   #[test]
   fn unique_column_suppresses_tiebreaker() {
      let scope = Scope::table("users");

      let keys = OrderSpec::from(vec![OrderColumn::asc("name"), OrderColumn::asc("id")])
         .normalize(&scope, &users_columns())
         .unwrap();
      assert_eq!(keys.len(), 2);

      let keys = OrderSpec::from(OrderColumn::desc("public_id"))
         .normalize(&scope, &users_columns())
         .unwrap();
      assert_eq!(names(&keys), vec![("public_id", SortDirection::Desc)]);
   }

   #[test]
   fn records_nullability() {
      let keys = OrderSpec::from(OrderColumn::desc("onboarded_at"))
         .normalize(&Scope::table("users"), &users_columns())
         .unwrap();
      assert!(keys[0].nullable);
      assert!(!keys[1].nullable);
   }

   #[test]
   fn unknown_column_is_rejected() {
      let err = OrderSpec::from(OrderColumn::asc("score"))
         .normalize(&Scope::table("users"), &users_columns())
         .unwrap_err();
      assert!(matches!(err, Error::InvalidOrderSpecification(_)));
      assert!(err.to_string().contains("score"));
   }

   #[test]
   fn duplicate_column_is_rejected() {
      let err = OrderSpec::from(vec![OrderColumn::asc("name"), OrderColumn::desc("name")])
         .normalize(&Scope::table("users"), &users_columns())
         .unwrap_err();
      assert!(matches!(err, Error::InvalidOrderSpecification(_)));
   }

   #[test]
   fn unsafe_column_name_is_rejected() {
      let err = OrderSpec::from(OrderColumn::asc("name; DROP TABLE users"))
         .normalize(&Scope::table("users"), &users_columns())
         .unwrap_err();
      assert!(matches!(err, Error::InvalidColumnName { .. }));
   }

   #[test]
   fn missing_tiebreaker_column_is_rejected() {
      let scope = Scope::table("users").primary_key("uuid");
      let err = OrderSpec::from(OrderColumn::asc("name"))
         .normalize(&scope, &users_columns())
         .unwrap_err();
      assert!(err.to_string().contains("uuid"));
   }

   #[test]
   fn sort_direction_reversed() {
      assert_eq!(SortDirection::Asc.reversed(), SortDirection::Desc);
      assert_eq!(SortDirection::Desc.reversed(), SortDirection::Asc);
   }

   #[test]
   fn sort_direction_serde_is_lowercase() {
      assert_eq!(
         serde_json::to_string(&SortDirection::Asc).unwrap(),
         "\"asc\""
      );
      let desc: SortDirection = serde_json::from_str("\"desc\"").unwrap();
      assert_eq!(desc, SortDirection::Desc);
   }

   #[test]
   fn order_column_direction_defaults_to_desc() {
      let column: OrderColumn = serde_json::from_str(r#"{"name": "created_at"}"#).unwrap();
      assert_eq!(column, OrderColumn::desc("created_at"));
   }
}
