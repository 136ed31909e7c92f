//! Identifier safety and scanning of caller-supplied SQL fragments.

use crate::Error;

/// Validate that an identifier is safe for SQL interpolation.
///
/// Accepts a plain name or a `schema.name` pair, each segment matching
/// `[a-zA-Z_][a-zA-Z0-9_]*`.
pub(crate) fn validate_identifier(name: &str) -> Result<(), Error> {
   let valid_segment = |segment: &str| {
      let mut chars = segment.chars();
      matches!(chars.next(), Some(first) if first.is_ascii_alphabetic() || first == '_')
         && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
   };

   let segments: Vec<&str> = name.split('.').collect();
   if segments.len() > 2 || !segments.iter().all(|segment| valid_segment(segment)) {
      return Err(Error::InvalidColumnName {
         name: name.to_string(),
      });
   }

   Ok(())
}

/// Quote an identifier with double quotes, one segment at a time.
///
/// `main.users` becomes `"main"."users"`. Any embedded double quotes are
/// doubled per SQL standard (`"` → `""`).
pub(crate) fn quote_identifier(name: &str) -> String {
   name
      .split('.')
      .map(|segment| format!("\"{}\"", segment.replace('"', "\"\"")))
      .collect::<Vec<_>>()
      .join(".")
}

/// What the scanner found in a filter fragment.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct FragmentShape {
   /// Number of `?` placeholders outside literals and comments
   pub placeholders: usize,
   /// First top-level clause keyword that the engine owns (ORDER BY, LIMIT)
   pub forbidden_clause: Option<&'static str>,
   /// A `;` appeared outside literals and comments
   pub statement_separator: bool,
   /// Parentheses did not pair up
   pub unbalanced: bool,
}

/// Check whether `keyword` appears as a standalone keyword at position `i`
/// in the uppercased byte slice `bytes`.
///
/// "Standalone" means the character before and after the keyword (if present)
/// is not an identifier character (`[A-Z0-9_]`).
fn is_keyword_at(bytes: &[u8], i: usize, keyword: &[u8]) -> bool {
   let len = bytes.len();
   let klen = keyword.len();
   if i + klen > len || &bytes[i..i + klen] != keyword {
      return false;
   }
   let before_ok = i == 0 || (!bytes[i - 1].is_ascii_alphanumeric() && bytes[i - 1] != b'_');
   let after_ok =
      i + klen >= len || (!bytes[i + klen].is_ascii_alphanumeric() && bytes[i + klen] != b'_');

   before_ok && after_ok
}

/// Advance past a quoted literal or identifier, honoring doubled-quote escapes.
fn skip_quoted(bytes: &[u8], i: usize, quote: u8) -> usize {
   let len = bytes.len();
   let mut j = i + 1;
   while j < len {
      if bytes[j] == quote {
         if j + 1 < len && bytes[j + 1] == quote {
            j += 2;
            continue;
         }
         return j;
      }
      j += 1;
   }
   j // unterminated
}

/// Advance past a `--` line comment (until newline or end).
fn skip_line_comment(bytes: &[u8], i: usize) -> usize {
   let mut j = i + 2;
   while j < bytes.len() && bytes[j] != b'\n' {
      j += 1;
   }
   j
}

/// Advance past a `/* … */` block comment.
fn skip_block_comment(bytes: &[u8], i: usize) -> usize {
   let len = bytes.len();
   let mut j = i + 2;
   while j + 1 < len {
      if bytes[j] == b'*' && bytes[j + 1] == b'/' {
         return j + 1;
      }
      j += 1;
   }
   len.saturating_sub(1) // unterminated
}

/// Scan a filter fragment, skipping string literals, quoted identifiers and
/// comments.
pub(crate) fn inspect_fragment(fragment: &str) -> FragmentShape {
   let upper = fragment.to_uppercase();
   let bytes = upper.as_bytes();
   let len = bytes.len();
   let mut shape = FragmentShape::default();
   let mut depth: i32 = 0;
   let mut i = 0;

   while i < len {
      match bytes[i] {
         b'(' => depth += 1,
         b')' => {
            depth -= 1;
            if depth < 0 {
               shape.unbalanced = true;
            }
         }
         b'\'' => i = skip_quoted(bytes, i, b'\''),
         b'"' => i = skip_quoted(bytes, i, b'"'),
         b'-' if i + 1 < len && bytes[i + 1] == b'-' => i = skip_line_comment(bytes, i),
         b'/' if i + 1 < len && bytes[i + 1] == b'*' => i = skip_block_comment(bytes, i),
         b'?' => shape.placeholders += 1,
         b';' => shape.statement_separator = true,
         _ if depth == 0 && shape.forbidden_clause.is_none() => {
            if is_keyword_at(bytes, i, b"ORDER BY") {
               shape.forbidden_clause = Some("ORDER BY");
            } else if is_keyword_at(bytes, i, b"LIMIT") {
               shape.forbidden_clause = Some("LIMIT");
            }
         }
         _ => {}
      }
      i += 1;
   }

   if depth != 0 {
      shape.unbalanced = true;
   }

   shape
}

/// Validate a filter fragment and its bind values.
///
/// Fragments are ANDed into a WHERE clause the engine owns, so they must be a
/// single balanced boolean expression without ORDER BY, LIMIT or statement
/// separators, and every `?` must have a value.
pub(crate) fn validate_filter(fragment: &str, value_count: usize) -> Result<(), Error> {
   if fragment.trim().is_empty() {
      return Err(Error::InvalidFilter("filter is empty".into()));
   }

   let shape = inspect_fragment(fragment);

   if let Some(clause) = shape.forbidden_clause {
      return Err(Error::InvalidFilter(format!(
         "filter must not contain a top-level {} clause (it is added automatically)",
         clause
      )));
   }
   if shape.statement_separator {
      return Err(Error::InvalidFilter(
         "filter must not contain ';'".into(),
      ));
   }
   if shape.unbalanced {
      return Err(Error::InvalidFilter("unbalanced parentheses".into()));
   }
   if shape.placeholders != value_count {
      return Err(Error::FilterBindMismatch {
         placeholders: shape.placeholders,
         values: value_count,
      });
   }

   Ok(())
}

#[cfg(test)]
mod tests {
   use super::*;

   // ─── validate_identifier ───

   #[test]
   fn identifier_valid_simple() {
      assert!(validate_identifier("id").is_ok());
      assert!(validate_identifier("created_at").is_ok());
      assert!(validate_identifier("_private").is_ok());
      assert!(validate_identifier("col_123").is_ok());
      assert!(validate_identifier("main.users").is_ok());
   }

   #[test]
   fn identifier_rejects_empty_or_extra_segments() {
      assert!(validate_identifier("main.").is_err());
      assert!(validate_identifier(".users").is_err());
      assert!(validate_identifier("a..b").is_err());
      assert!(validate_identifier("a.b.c").is_err());
      assert!(validate_identifier("main.1users").is_err());
   }

   #[test]
   fn identifier_rejects_empty() {
      assert!(validate_identifier("").is_err());
   }

   #[test]
   fn identifier_rejects_injection() {
      assert!(validate_identifier("id; DROP TABLE users --").is_err());
      assert!(validate_identifier("id)--").is_err());
      assert!(validate_identifier("1bad").is_err());
      assert!(validate_identifier("col name").is_err());
   }

   // ─── quote_identifier ───

   #[test]
   fn quote_identifier_simple() {
      assert_eq!(quote_identifier("id"), r#""id""#);
      assert_eq!(quote_identifier("foo\"bar"), r#""foo""bar""#);
   }

   #[test]
   fn quote_identifier_quotes_each_segment() {
      assert_eq!(quote_identifier("main.users"), r#""main"."users""#);
   }

   // ─── inspect_fragment ───

   #[test]
   fn counts_placeholders_at_any_depth() {
      let shape = inspect_fragment("name = ? AND (org_id = ? OR org_id IN (?, ?))");
      assert_eq!(shape.placeholders, 4);
      assert!(!shape.unbalanced);
      assert_eq!(shape.forbidden_clause, None);
   }

   #[test]
   fn ignores_placeholders_in_literals_and_comments() {
      let shape = inspect_fragment("name = 'who?' AND \"odd?col\" = ? -- why?\n/* ? */");
      assert_eq!(shape.placeholders, 1);
   }

   #[test]
   fn detects_top_level_order_by_and_limit() {
      assert_eq!(
         inspect_fragment("archived = 0 ORDER BY id").forbidden_clause,
         Some("ORDER BY")
      );
      assert_eq!(
         inspect_fragment("archived = 0 limit 10").forbidden_clause,
         Some("LIMIT")
      );
   }

   #[test]
   fn allows_limit_inside_subquery() {
      let shape = inspect_fragment("id IN (SELECT user_id FROM members ORDER BY id LIMIT 5)");
      assert_eq!(shape.forbidden_clause, None);
   }

   #[test]
   fn ignores_keywords_in_escaped_single_quotes() {
      let shape = inspect_fragment("name = 'order''s ORDER BY clause'");
      assert_eq!(shape.forbidden_clause, None);
   }

   #[test]
   fn keyword_must_stand_alone() {
      assert_eq!(inspect_fragment("limited = 1").forbidden_clause, None);
      assert_eq!(inspect_fragment("no_limit = 1").forbidden_clause, None);
   }

   #[test]
   fn detects_unbalanced_parentheses() {
      assert!(inspect_fragment("(a = 1").unbalanced);
      assert!(inspect_fragment("a = 1) OR (1 = 1").unbalanced);
      assert!(!inspect_fragment("a = ')'").unbalanced);
   }

   #[test]
   fn detects_statement_separator() {
      assert!(inspect_fragment("1 = 1; DROP TABLE users").statement_separator);
      assert!(!inspect_fragment("name = ';'").statement_separator);
   }

   // ─── validate_filter ───

   #[test]
   fn validate_filter_accepts_matching_binds() {
      assert!(validate_filter("name = ? AND archived = ?", 2).is_ok());
      assert!(validate_filter("archived = 0", 0).is_ok());
   }

   #[test]
   fn validate_filter_rejects_bind_mismatch() {
      let err = validate_filter("name = ?", 2).unwrap_err();
      assert!(matches!(
         err,
         Error::FilterBindMismatch {
            placeholders: 1,
            values: 2,
         }
      ));
   }

   #[test]
   fn validate_filter_rejects_engine_clauses() {
      assert!(matches!(
         validate_filter("1 = 1 LIMIT 3", 0),
         Err(Error::InvalidFilter(_))
      ));
      assert!(matches!(
         validate_filter("   ", 0),
         Err(Error::InvalidFilter(_))
      ));
   }
}
