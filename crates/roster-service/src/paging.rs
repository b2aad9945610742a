//! Raw paging parameters as they arrive on a query string.

use std::str::FromStr;

use roster_core::{
  Result,
  page::{PageRequest, SortOrder, parse_sort},
};
use serde::Deserialize;

/// `?page=&size=&sort=` before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
  pub page: Option<u32>,
  pub size: Option<u32>,
  /// `field[,asc|desc][;field[,dir]]...`
  pub sort: Option<String>,
}

impl PageParams {
  /// Parse the sort expression and build a clamped request, falling back to
  /// `default_sort` when no sort is given.
  pub fn into_request<F: FromStr>(
    self,
    default_sort: impl FnOnce() -> Vec<SortOrder<F>>,
  ) -> Result<PageRequest<F>> {
    let sort = match self.sort.as_deref() {
      Some(expr) => parse_sort(expr)?,
      None => Vec::new(),
    };
    Ok(PageRequest::new(self.page, self.size, sort, default_sort))
  }
}
