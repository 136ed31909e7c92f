//! Opaque pagination cursors.
//!
//! A cursor names exactly one record: the record type (so tokens minted for
//! one endpoint are rejected by another) and that record's public id. It never
//! carries a position or ordering values; the boundary is looked up fresh on
//! every request.
//!
//! The token is the URL-safe, unpadded base64 encoding of
//! `<record_type>:<public_id>`.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{Error, Record, Result};

const SEPARATOR: char = ':';

/// An opaque token pointing at one record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
   /// Encode a cursor for the record of `record_type` with the given public id.
   pub fn encode(record_type: &str, public_id: &str) -> Result<Self> {
      if record_type.is_empty() || record_type.contains(SEPARATOR) {
         return Err(Error::InvalidRecordType {
            name: record_type.to_string(),
         });
      }
      if public_id.is_empty() {
         return Err(invalid("record has an empty public id"));
      }

      let payload = format!("{}{}{}", record_type, SEPARATOR, public_id);
      Ok(Self(URL_SAFE_NO_PAD.encode(payload)))
   }

   /// Decode the cursor back to a public id, checking that it was minted for
   /// `expected_record_type`.
   pub fn decode(&self, expected_record_type: &str) -> Result<String> {
      let bytes = URL_SAFE_NO_PAD
         .decode(self.0.trim())
         .map_err(|e| invalid(format!("not a valid token ({})", e)))?;
      let payload = String::from_utf8(bytes).map_err(|_| invalid("token is not UTF-8"))?;

      let Some((record_type, public_id)) = payload.split_once(SEPARATOR) else {
         return Err(invalid("token has no record type"));
      };
      if record_type != expected_record_type {
         return Err(invalid(format!(
            "token belongs to '{}', expected '{}'",
            record_type, expected_record_type
         )));
      }
      if public_id.is_empty() {
         return Err(invalid("token has an empty public id"));
      }

      Ok(public_id.to_string())
   }

   /// The token as sent to and received from clients.
   pub fn as_str(&self) -> &str {
      &self.0
   }

   /// Consume the cursor, returning the token string.
   pub fn into_string(self) -> String {
      self.0
   }
}

impl fmt::Display for Cursor {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(&self.0)
   }
}

impl From<String> for Cursor {
   fn from(token: String) -> Self {
      Self(token)
   }
}

impl From<&str> for Cursor {
   fn from(token: &str) -> Self {
      Self(token.to_string())
   }
}

/// Encode the cursor for a decoded result row.
pub(crate) fn encode_record(
   record: &Record,
   record_type: &str,
   public_id_column: &str,
) -> Result<Cursor> {
   let public_id = match record.get(public_id_column) {
      Some(JsonValue::String(id)) => id.clone(),
      Some(JsonValue::Number(id)) => id.to_string(),
      Some(JsonValue::Null) | None => {
         return Err(invalid(format!(
            "record has no '{}' to encode",
            public_id_column
         )));
      }
      Some(other) => {
         return Err(invalid(format!(
            "'{}' is not a scalar identifier: {}",
            public_id_column, other
         )));
      }
   };

   Cursor::encode(record_type, &public_id)
}

fn invalid(reason: impl Into<String>) -> Error {
   Error::InvalidCursor {
      reason: reason.into(),
   }
}
