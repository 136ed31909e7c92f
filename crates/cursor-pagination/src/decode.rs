//! SQLite value decoding.
//!
//! Rows returned to callers are converted to JSON. Boundary tuples stay as
//! [`SqlValue`] so they are bound back with the storage class they were read
//! with; SQLite orders values by storage class first, so a BLOB rebound as
//! TEXT would compare below every BLOB in the column.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value as JsonValue;
use sqlx::sqlite::{SqliteRow, SqliteValueRef};
use sqlx::{Column, Decode, Row, Sqlite, TypeInfo, ValueRef};

use crate::{Error, Record, Result};

/// A value in one of SQLite's storage classes.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SqlValue {
   Null,
   Integer(i64),
   Real(f64),
   Text(String),
   Blob(Vec<u8>),
}

impl SqlValue {
   pub fn is_null(&self) -> bool {
      matches!(self, SqlValue::Null)
   }

   /// Read a raw value by its storage class.
   pub fn from_raw(value: SqliteValueRef<'_>) -> Result<Self> {
      if value.is_null() {
         return Ok(SqlValue::Null);
      }

      let type_name = value.type_info().name().to_uppercase();

      match type_name.as_str() {
         "INTEGER" | "INT" | "BIGINT" | "BOOLEAN" => Ok(SqlValue::Integer(decode(value)?)),
         "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => Ok(SqlValue::Real(decode(value)?)),
         "TEXT" | "DATETIME" | "DATE" | "TIME" => Ok(SqlValue::Text(decode(value)?)),
         "BLOB" => Ok(SqlValue::Blob(decode(value)?)),
         "NULL" => Ok(SqlValue::Null),
         other => Err(Error::UnsupportedDatatype(other.to_string())),
      }
   }

   /// JSON form returned to callers. BLOBs become standard base64 text.
   pub fn into_json(self) -> JsonValue {
      match self {
         SqlValue::Null => JsonValue::Null,
         SqlValue::Integer(int_val) => JsonValue::from(int_val),
         SqlValue::Real(real_val) => serde_json::Number::from_f64(real_val)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
         SqlValue::Text(text) => JsonValue::String(text),
         SqlValue::Blob(bytes) => JsonValue::String(STANDARD.encode(bytes)),
      }
   }
}

impl From<JsonValue> for SqlValue {
   fn from(value: JsonValue) -> Self {
      match value {
         JsonValue::Null => SqlValue::Null,
         JsonValue::Bool(flag) => SqlValue::Integer(i64::from(flag)),
         JsonValue::String(text) => SqlValue::Text(text),
         JsonValue::Number(number) => {
            // Preserve integer precision by binding as i64 when possible
            if let Some(int_val) = number.as_i64() {
               SqlValue::Integer(int_val)
            } else {
               // Too large for SQLite's INTEGER; fall back to REAL
               SqlValue::Real(number.as_f64().unwrap_or_default())
            }
         }
         // Arrays and objects are stored as JSON text
         other => SqlValue::Text(other.to_string()),
      }
   }
}

fn decode<'r, T: Decode<'r, Sqlite>>(value: SqliteValueRef<'r>) -> Result<T> {
   T::decode(value).map_err(|e| Error::Sqlx(sqlx::Error::Decode(e)))
}

/// Decode rows into column-ordered JSON objects.
pub(crate) fn decode_rows(rows: Vec<SqliteRow>) -> Result<Vec<Record>> {
   let mut records = Vec::with_capacity(rows.len());
   for row in rows {
      let mut record = Record::default();
      for (i, column) in row.columns().iter().enumerate() {
         let value = SqlValue::from_raw(row.try_get_raw(i)?)?;
         record.insert(column.name().to_string(), value.into_json());
      }
      records.push(record);
   }
   Ok(records)
}

/// Decode the values of a row positionally, keeping their storage class.
pub(crate) fn row_values(row: &SqliteRow) -> Result<Vec<SqlValue>> {
   (0..row.columns().len())
      .map(|i| SqlValue::from_raw(row.try_get_raw(i)?))
      .collect()
}
