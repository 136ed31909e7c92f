/// Result type alias for pagination operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cursor pagination.
///
/// Cursor problems (`InvalidCursor`, `RecordNotFound`, `ConflictingCursors`)
/// come from request input and should be reported to the client. Everything
/// else is either a programming error in how a scope or ordering was built, or
/// a backing-store failure that is passed through unchanged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Error from SQLx operations.
   #[error(transparent)]
   Sqlx(#[from] sqlx::Error),

   /// Error from the connection manager.
   #[error(transparent)]
   ConnectionManager(#[from] sqlx_sqlite_conn_mgr::Error),

   /// Cursor token is malformed, belongs to another record type, or a record
   /// has no public id to encode.
   #[error("invalid cursor: {reason}")]
   InvalidCursor { reason: String },

   /// Cursor decoded cleanly but its record no longer exists.
   #[error("no {record_type} record found for cursor id '{public_id}'")]
   RecordNotFound {
      record_type: String,
      public_id: String,
   },

   /// Ordering references a column the table does not have, or repeats one.
   #[error("invalid order specification: {0}")]
   InvalidOrderSpecification(String),

   /// Identifier contains characters that are unsafe to interpolate.
   ///
   /// Table and column names are a name or `schema.name`, each segment
   /// matching `[a-zA-Z_][a-zA-Z0-9_]*`.
   #[error("invalid identifier '{name}': expected name or schema.name of [a-zA-Z_][a-zA-Z0-9_]*")]
   InvalidColumnName { name: String },

   /// Record type used as the cursor namespace is empty or contains `:`.
   #[error("invalid record type '{name}'")]
   InvalidRecordType { name: String },

   /// Scope filter fragment is not a standalone boolean expression.
   #[error("invalid scope filter: {0}")]
   InvalidFilter(String),

   /// Scope filter placeholder count does not match its bound values.
   #[error("scope filter has {placeholders} placeholders but {values} bound values")]
   FilterBindMismatch { placeholders: usize, values: usize },

   /// Cannot provide both `after` and `before` cursors.
   #[error("cannot provide both 'after' and 'before' cursors")]
   ConflictingCursors,

   /// SQLite type that cannot be mapped to JSON.
   #[error("unsupported datatype: {0}")]
   UnsupportedDatatype(String),
}

impl Error {
   /// Extract a structured error code from the error type.
   pub fn error_code(&self) -> String {
      match self {
         Error::Sqlx(e) => {
            if let Some(code) = e.as_database_error().and_then(|db_err| db_err.code()) {
               return format!("SQLITE_{}", code);
            }
            "SQLX_ERROR".to_string()
         }
         Error::ConnectionManager(_) => "CONNECTION_ERROR".to_string(),
         Error::InvalidCursor { .. } => "INVALID_CURSOR".to_string(),
         Error::RecordNotFound { .. } => "RECORD_NOT_FOUND".to_string(),
         Error::InvalidOrderSpecification(_) => "INVALID_ORDER_SPECIFICATION".to_string(),
         Error::InvalidColumnName { .. } => "INVALID_COLUMN_NAME".to_string(),
         Error::InvalidRecordType { .. } => "INVALID_RECORD_TYPE".to_string(),
         Error::InvalidFilter(_) => "INVALID_FILTER".to_string(),
         Error::FilterBindMismatch { .. } => "FILTER_BIND_MISMATCH".to_string(),
         Error::ConflictingCursors => "CONFLICTING_CURSORS".to_string(),
         Error::UnsupportedDatatype(_) => "UNSUPPORTED_DATATYPE".to_string(),
      }
   }

   /// Whether the error was caused by request input (a 4xx for HTTP callers).
   ///
   /// A stale cursor is a client error: the caller should restart pagination.
   pub fn is_client_error(&self) -> bool {
      matches!(
         self,
         Error::InvalidCursor { .. } | Error::RecordNotFound { .. } | Error::ConflictingCursors
      )
   }
}
