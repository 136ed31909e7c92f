//! Page size configuration

use serde::{Deserialize, Serialize};

/// Largest page size whose look-ahead row still fits SQLite's signed LIMIT.
const PAGE_SIZE_CEILING: usize = (i64::MAX - 1) as usize;

/// Page size limits applied to every pagination call.
///
/// # Examples
///
/// ```
/// use cursor_pagination::PaginationConfig;
///
/// let config = PaginationConfig::default();
/// assert_eq!(config.per_page(None), 50);
/// assert_eq!(config.per_page(Some(500)), 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
   /// Page size used when the caller asks for none (or for zero rows)
   ///
   /// Default: 50
   pub default_per_page: usize,

   /// Upper bound on the page size; larger requests are clamped. Values
   /// beyond what SQLite's LIMIT accepts are capped.
   ///
   /// Default: 100
   pub max_per_page: usize,
}

impl Default for PaginationConfig {
   fn default() -> Self {
      Self {
         default_per_page: 50,
         max_per_page: 100,
      }
   }
}

impl PaginationConfig {
   /// Effective page size for a requested limit.
   pub fn per_page(&self, requested: Option<usize>) -> usize {
      let max = self.max_per_page.clamp(1, PAGE_SIZE_CEILING);
      match requested {
         None | Some(0) => self.default_per_page.clamp(1, max),
         Some(n) => n.min(max),
      }
   }
}
