// storefront/src/models/page.rs

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
  pub page: Option<i64>,
  pub limit: Option<i64>,
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  pub page: i64,
  pub limit: i64,
}

impl PageRequest {
  /// Rows to skip. Saturates, so a huge `page` reads past the end instead of
  /// overflowing.
  pub fn offset(&self) -> i64 {
    (self.page - 1).saturating_mul(self.limit)
  }
}

impl From<&PageQuery> for PageRequest {
  fn from(q: &PageQuery) -> Self {
    PageRequest {
      page: q.page.filter(|p| *p >= 1).unwrap_or(1),
      limit: q.limit.filter(|l| *l >= 1).unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT),
    }
  }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Pagination {
  pub page: i64,
  pub limit: i64,
  pub total: i64,
  pub pages: i64,
}

impl Pagination {
  pub fn new(req: PageRequest, total: i64) -> Self {
    Pagination {
      page: req.page,
      limit: req.limit,
      total,
      pages: (total + req.limit - 1) / req.limit,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub total: i64,
}
