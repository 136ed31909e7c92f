//! Keyset predicate and query generation.
//!
//! Instead of skipping rows with OFFSET, keyset pagination takes the sort
//! values of a boundary row and seeks directly past them. For a total ordering
//! `(c1, …, cn)` and boundary `(v1, …, vn)` the rows strictly after the
//! boundary are
//!
//! ```text
//! c1 ≻ v1 OR (c1 = v1 AND (c2 ≻ v2 OR (c2 = v2 AND (… cn ≻ vn))))
//! ```
//!
//! where `≻` means "sorts after" for that column's direction. The nested form
//! is built recursively and works for any mix of directions without relying
//! on row-value comparison support.
//!
//! For backward pagination all sort directions are reversed internally so the
//! database returns the rows nearest the boundary first; the caller reverses
//! them to restore the requested order.
//!
//! # NULL ordering
//!
//! SQLite sorts NULL before every other value in ascending order and after
//! every value in descending order. Comparisons against nullable columns are
//! written so that they agree with that placement.

use crate::decode::SqlValue;
use crate::order::SortKey;
use crate::sql::quote_identifier;
use crate::{Scope, SortDirection};

/// Which side of the boundary a page is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Traversal {
   /// Rows strictly after the boundary, in the requested order
   After,
   /// Rows strictly before the boundary, fetched in reversed order
   Before,
}

/// Predicate for "sorts strictly after `value`" on one column.
fn strictly_after(key: &SortKey, value: &SqlValue, values: &mut Vec<SqlValue>) -> String {
   let column = quote_identifier(&key.name);

   match (key.direction, value.is_null()) {
      // NULLs come first ascending, so everything non-null is after them
      (SortDirection::Asc, true) => format!("{} IS NOT NULL", column),
      (SortDirection::Asc, false) => {
         values.push(value.clone());
         format!("{} > ?", column)
      }
      // NULLs come last descending, nothing sorts after them
      (SortDirection::Desc, true) => "0".to_string(),
      (SortDirection::Desc, false) => {
         values.push(value.clone());
         if key.nullable {
            format!("({} < ? OR {} IS NULL)", column, column)
         } else {
            format!("{} < ?", column)
         }
      }
   }
}

/// Predicate for "sorts equal to `value`" on one column.
fn equal_to(key: &SortKey, value: &SqlValue, values: &mut Vec<SqlValue>) -> String {
   let column = quote_identifier(&key.name);

   if value.is_null() {
      format!("{} IS NULL", column)
   } else {
      values.push(value.clone());
      format!("{} = ?", column)
   }
}

fn nested_predicate(boundary: &[(&SortKey, &SqlValue)], values: &mut Vec<SqlValue>) -> String {
   let Some(((key, value), rest)) = boundary.split_first() else {
      return "0".to_string();
   };

   let after = strictly_after(key, value, values);
   if rest.is_empty() {
      return after;
   }

   let tie = equal_to(key, value, values);
   let inner = nested_predicate(rest, values);
   format!("{} OR ({} AND ({}))", after, tie, inner)
}

/// Build the keyset WHERE condition selecting rows strictly after `boundary`
/// in the order given by `keys`.
///
/// Returns the SQL fragment (with `?` placeholders) and the bind values in
/// placeholder order.
pub(crate) fn build_boundary_predicate(
   keys: &[SortKey],
   boundary: &[SqlValue],
) -> (String, Vec<SqlValue>) {
   let pairs: Vec<(&SortKey, &SqlValue)> = keys.iter().zip(boundary).collect();
   let mut values = Vec::with_capacity(pairs.len() * 2);
   let sql = nested_predicate(&pairs, &mut values);
   (sql, values)
}

/// Build the ORDER BY clause for the given keys.
pub(crate) fn build_order_by(keys: &[SortKey]) -> String {
   let parts: Vec<String> = keys
      .iter()
      .map(|k| format!("{} {}", quote_identifier(&k.name), k.direction.as_sql()))
      .collect();

   format!("ORDER BY {}", parts.join(", "))
}

/// Build the complete page query for a scope.
///
/// `fetch_limit` is the number of rows to request, normally one more than the
/// page size so the caller can tell whether another page exists. When
/// `traversal` is [`Traversal::Before`] every direction is reversed.
///
/// Returns the final SQL and all bind values: filter values first, then the
/// boundary values.
pub(crate) fn build_page_query(
   scope: &Scope,
   keys: &[SortKey],
   boundary: Option<&[SqlValue]>,
   traversal: Traversal,
   fetch_limit: usize,
) -> (String, Vec<SqlValue>) {
   let effective: Vec<SortKey> = match traversal {
      Traversal::After => keys.to_vec(),
      Traversal::Before => keys.iter().map(SortKey::reversed).collect(),
   };

   let mut conditions = scope.conditions();
   let mut values: Vec<SqlValue> = scope.values().into_iter().map(SqlValue::from).collect();

   if let Some(boundary) = boundary {
      let (predicate, boundary_values) = build_boundary_predicate(&effective, boundary);
      conditions.push(format!("({})", predicate));
      values.extend(boundary_values);
   }

   let mut sql = format!("SELECT {} FROM {}", scope.projection(), scope.from_sql());
   if !conditions.is_empty() {
      sql = format!("{} WHERE {}", sql, conditions.join(" AND "));
   }
   sql = format!("{} {} LIMIT {}", sql, build_order_by(&effective), fetch_limit);

   (sql, values)
}

/// Build the anchor lookup: the sort values of one record by public id.
///
/// Runs against the unfiltered table so that a cursor stays resolvable even
/// if its record no longer matches the scope's filters.
pub(crate) fn build_anchor_query(scope: &Scope, keys: &[SortKey]) -> String {
   let columns: Vec<String> = keys.iter().map(|k| quote_identifier(&k.name)).collect();

   format!(
      "SELECT {} FROM {} WHERE {} = ? LIMIT 1",
      columns.join(", "),
      scope.from_sql(),
      quote_identifier(scope.public_id_column_name())
   )
}

/// Build the count of the filtered scope, ignoring any pagination window.
pub(crate) fn build_count_query(scope: &Scope) -> (String, Vec<SqlValue>) {
   let conditions = scope.conditions();
   let mut sql = format!("SELECT COUNT(*) FROM {}", scope.from_sql());
   if !conditions.is_empty() {
      sql = format!("{} WHERE {}", sql, conditions.join(" AND "));
   }
   (sql, scope.values().into_iter().map(SqlValue::from).collect())
}

#[cfg(test)]
mod tests {
   use super::*;
   use serde_json::{Value as JsonValue, json};

   fn v(values: &[JsonValue]) -> Vec<SqlValue> {
      values.iter().cloned().map(SqlValue::from).collect()
   }

   fn key(name: &str, direction: SortDirection) -> SortKey {
      SortKey {
         name: name.into(),
         direction,
         nullable: false,
      }
   }

   fn asc(name: &str) -> SortKey {
      key(name, SortDirection::Asc)
   }

   fn desc(name: &str) -> SortKey {
      key(name, SortDirection::Desc)
   }

   fn nullable(mut key: SortKey) -> SortKey {
      key.nullable = true;
      key
   }

   // ─── build_boundary_predicate ───

   #[test]
   fn predicate_single_column_asc() {
      let (sql, values) = build_boundary_predicate(&[asc("id")], &v(&[json!(42)]));

      assert_eq!(sql, r#""id" > ?"#);
      assert_eq!(values, v(&[json!(42)]));
   }

   #[test]
   fn predicate_single_column_desc() {
      let (sql, values) = build_boundary_predicate(&[desc("id")], &v(&[json!(42)]));

      assert_eq!(sql, r#""id" < ?"#);
      assert_eq!(values, v(&[json!(42)]));
   }

   #[test]
   fn predicate_two_columns_nests() {
      let (sql, values) = build_boundary_predicate(
         &[asc("name"), asc("id")],
         &v(&[json!("Albus"), json!(1)]),
      );

      assert_eq!(sql, r#""name" > ? OR ("name" = ? AND ("id" > ?))"#);
      assert_eq!(values, v(&[json!("Albus"), json!("Albus"), json!(1)]));
   }

   #[test]
   fn predicate_mixed_directions() {
      let (sql, values) = build_boundary_predicate(
         &[asc("a"), desc("b"), asc("c")],
         &v(&[json!("va"), json!("vb"), json!("vc")]),
      );

      assert_eq!(
         sql,
         r#""a" > ? OR ("a" = ? AND ("b" < ? OR ("b" = ? AND ("c" > ?))))"#
      );
      assert_eq!(
         values,
         v(&[
            json!("va"),
            json!("va"),
            json!("vb"),
            json!("vb"),
            json!("vc"),
         ])
      );
   }

   #[test]
   fn predicate_nullable_desc_includes_nulls_after_value() {
      let (sql, values) = build_boundary_predicate(
         &[nullable(desc("onboarded_at")), desc("id")],
         &v(&[json!("2024-01-01"), json!(3)]),
      );

      assert_eq!(
         sql,
         r#"("onboarded_at" < ? OR "onboarded_at" IS NULL) OR ("onboarded_at" = ? AND ("id" < ?))"#
      );
      assert_eq!(values, v(&[json!("2024-01-01"), json!("2024-01-01"), json!(3)]));
   }

   #[test]
   fn predicate_null_boundary_value() {
      let (sql, values) = build_boundary_predicate(
         &[nullable(asc("onboarded_at")), asc("id")],
         &v(&[JsonValue::Null, json!(3)]),
      );
      assert_eq!(
         sql,
         r#""onboarded_at" IS NOT NULL OR ("onboarded_at" IS NULL AND ("id" > ?))"#
      );
      assert_eq!(values, v(&[json!(3)]));

      let (sql, values) = build_boundary_predicate(
         &[nullable(desc("onboarded_at")), desc("id")],
         &v(&[JsonValue::Null, json!(3)]),
      );
      assert_eq!(sql, r#"0 OR ("onboarded_at" IS NULL AND ("id" < ?))"#);
      assert_eq!(values, v(&[json!(3)]));
   }

   #[test]
   fn predicate_keeps_blob_boundary_binary() {
      let uuid = SqlValue::Blob(vec![0x01, 0xff]);
      let (sql, values) = build_boundary_predicate(
         &[asc("name"), asc("uuid")],
         &[SqlValue::Text("a".into()), uuid.clone()],
      );

      assert_eq!(sql, r#""name" > ? OR ("name" = ? AND ("uuid" > ?))"#);
      assert_eq!(values[2], uuid);
   }

   // ─── build_order_by ───

   #[test]
   fn order_by_mixed_directions() {
      let sql = build_order_by(&[asc("name"), desc("created_at"), desc("id")]);

      assert_eq!(sql, r#"ORDER BY "name" ASC, "created_at" DESC, "id" DESC"#);
   }

   // ─── build_page_query ───

   #[test]
   fn page_query_first_page() {
      let scope = Scope::table("users");

      let (sql, values) = build_page_query(&scope, &[asc("id")], None, Traversal::After, 21);

      assert_eq!(sql, r#"SELECT * FROM "users" ORDER BY "id" ASC LIMIT 21"#);
      assert!(values.is_empty());
   }

   #[test]
   fn page_query_with_boundary() {
      let scope = Scope::table("users");

      let (sql, values) = build_page_query(
         &scope,
         &[asc("id")],
         Some(&v(&[json!(100)])[..]),
         Traversal::After,
         21,
      );

      assert_eq!(
         sql,
         r#"SELECT * FROM "users" WHERE ("id" > ?) ORDER BY "id" ASC LIMIT 21"#
      );
      assert_eq!(values, v(&[json!(100)]));
   }

   #[test]
   fn page_query_with_filters_binds_filters_first() {
      let scope = Scope::table("users").filter("name = ?", vec![json!("Albus")]);

      let (sql, values) = build_page_query(
         &scope,
         &[desc("created_at"), desc("id")],
         Some(&v(&[json!("2024-05-01"), json!(9)])[..]),
         Traversal::After,
         3,
      );

      assert_eq!(
         sql,
         r#"SELECT * FROM "users" WHERE (name = ?) AND ("created_at" < ? OR ("created_at" = ? AND ("id" < ?))) ORDER BY "created_at" DESC, "id" DESC LIMIT 3"#
      );
      assert_eq!(
         values,
         v(&[
            json!("Albus"),
            json!("2024-05-01"),
            json!("2024-05-01"),
            json!(9),
         ])
      );
   }

   #[test]
   fn page_query_backward_reverses_everything() {
      let scope = Scope::table("users");

      let (sql, values) = build_page_query(
         &scope,
         &[asc("name"), desc("created_at"), desc("id")],
         Some(&v(&[json!("Ron"), json!("2024-05-01"), json!(4)])[..]),
         Traversal::Before,
         26,
      );

      assert_eq!(
         sql,
         r#"SELECT * FROM "users" WHERE ("name" < ? OR ("name" = ? AND ("created_at" > ? OR ("created_at" = ? AND ("id" > ?))))) ORDER BY "name" DESC, "created_at" ASC, "id" ASC LIMIT 26"#
      );
      assert_eq!(
         values,
         v(&[
            json!("Ron"),
            json!("Ron"),
            json!("2024-05-01"),
            json!("2024-05-01"),
            json!(4),
         ])
      );
   }

   #[test]
   fn page_query_backward_no_boundary() {
      let scope = Scope::table("users");

      let (sql, _) = build_page_query(&scope, &[asc("id")], None, Traversal::Before, 21);

      assert_eq!(sql, r#"SELECT * FROM "users" ORDER BY "id" DESC LIMIT 21"#);
   }

   #[test]
   fn page_query_uses_projection() {
      let scope = Scope::table("users").select(["id", "name"]);

      let (sql, _) = build_page_query(&scope, &[asc("id")], None, Traversal::After, 2);

      assert_eq!(
         sql,
         r#"SELECT "id", "name", "public_id" FROM "users" ORDER BY "id" ASC LIMIT 2"#
      );
   }

   // ─── build_anchor_query / build_count_query ───

   #[test]
   fn anchor_query_ignores_filters() {
      let scope = Scope::table("users")
         .public_id_column("slug")
         .filter("name = ?", vec![json!("Albus")]);

      let sql = build_anchor_query(&scope, &[asc("name"), desc("id")]);

      assert_eq!(
         sql,
         r#"SELECT "name", "id" FROM "users" WHERE "slug" = ? LIMIT 1"#
      );
   }

   #[test]
   fn count_query_keeps_filters() {
      let scope = Scope::table("users")
         .filter("name = ?", vec![json!("Albus")])
         .filter("onboarded_at IS NOT NULL", vec![]);

      let (sql, values) = build_count_query(&scope);

      assert_eq!(
         sql,
         r#"SELECT COUNT(*) FROM "users" WHERE (name = ?) AND (onboarded_at IS NOT NULL)"#
      );
      assert_eq!(values, v(&[json!("Albus")]));
   }

   #[test]
   fn count_query_unfiltered() {
      let (sql, values) = build_count_query(&Scope::table("users"));

      assert_eq!(sql, r#"SELECT COUNT(*) FROM "users""#);
      assert!(values.is_empty());
   }
}
