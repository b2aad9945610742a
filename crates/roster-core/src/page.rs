//! Paging and ordering requests, and the page of results a store returns.

use std::str::FromStr;

use serde::Serialize;

use crate::{Error, Result};

pub const DEFAULT_PAGE_SIZE: u32 = 5;
pub const MAX_PAGE_SIZE: u32 = 100;

// ─── Sorting ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Asc,
  Desc,
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder<F> {
  pub field:     F,
  pub direction: Direction,
}

impl<F> SortOrder<F> {
  pub fn asc(field: F) -> Self { Self { field, direction: Direction::Asc } }

  pub fn desc(field: F) -> Self { Self { field, direction: Direction::Desc } }
}

/// Parse a sort expression of the form `field[,asc|desc][;field[,dir]]...`.
///
/// A missing direction means ascending. Blank input yields no orders.
pub fn parse_sort<F: FromStr>(expr: &str) -> Result<Vec<SortOrder<F>>> {
  expr
    .split(';')
    .map(str::trim)
    .filter(|term| !term.is_empty())
    .map(|term| {
      let (name, dir) = match term.split_once(',') {
        Some((name, dir)) => (name.trim(), dir.trim()),
        None => (term, ""),
      };
      let field = F::from_str(name)
        .map_err(|_| Error::Validation(format!("unknown sort field: {name:?}")))?;
      let direction = match dir.to_ascii_lowercase().as_str() {
        "" | "asc" => Direction::Asc,
        "desc" => Direction::Desc,
        other => {
          return Err(Error::Validation(format!("unknown sort direction: {other:?}")));
        }
      };
      Ok(SortOrder { field, direction })
    })
    .collect()
}

// ─── Page request ────────────────────────────────────────────────────────────

/// Which slice of a result set to return and in what order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest<F> {
  /// Zero-based page index.
  pub page: u32,
  /// Always within `1..=MAX_PAGE_SIZE`.
  pub size: u32,
  /// Backends append an id tie-break after these.
  pub sort: Vec<SortOrder<F>>,
}

impl<F> PageRequest<F> {
  /// Build a request, clamping `size` into range and falling back to
  /// `default_sort` when `sort` is empty.
  pub fn new(
    page: Option<u32>,
    size: Option<u32>,
    sort: Vec<SortOrder<F>>,
    default_sort: impl FnOnce() -> Vec<SortOrder<F>>,
  ) -> Self {
    let size = size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let sort = if sort.is_empty() { default_sort() } else { sort };
    Self { page: page.unwrap_or(0), size, sort }
  }

  pub fn offset(&self) -> u64 { u64::from(self.page) * u64::from(self.size) }
}

// ─── Page ────────────────────────────────────────────────────────────────────

/// One page of results plus totals for the whole result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
  pub items:       Vec<T>,
  pub page:        u32,
  pub size:        u32,
  pub total_items: u64,
  pub total_pages: u32,
}

impl<T> Page<T> {
  pub fn new<F>(items: Vec<T>, request: &PageRequest<F>, total_items: u64) -> Self {
    let total_pages = total_items.div_ceil(u64::from(request.size));
    Self {
      items,
      page: request.page,
      size: request.size,
      total_items,
      total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
    }
  }

  /// A page with no items and zero totals.
  pub fn empty<F>(request: &PageRequest<F>) -> Self { Self::new(Vec::new(), request, 0) }

  pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
    Page {
      items:       self.items.into_iter().map(f).collect(),
      page:        self.page,
      size:        self.size,
      total_items: self.total_items,
      total_pages: self.total_pages,
    }
  }
}
