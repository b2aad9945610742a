//! Error types for `roster-core`.
//!
//! These are the error kinds every layer above the store speaks. Storage
//! backends convert their own errors into [`Error`]; constraint violations
//! detected at commit time become [`Error::Conflict`], exactly like a failed
//! pre-check.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A required field is missing or blank, a value is out of bounds, or a
  /// patch tried to clear a field that cannot be cleared.
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("not found: {0}")]
  NotFound(String),

  /// A uniqueness or one-to-one invariant would be violated.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Convert a backend error into a core error.
  ///
  /// Handy as `.map_err(Error::store)` since `?` cannot pick the target type
  /// through a generic `Into` bound.
  pub fn store<E: Into<Error>>(err: E) -> Self { err.into() }

  /// Stable machine-readable code, used in response envelopes.
  pub fn code(&self) -> &'static str {
    match self {
      Self::Validation(_) => "VALIDATION_ERROR",
      Self::NotFound(_) => "NOT_FOUND",
      Self::Conflict(_) => "CONFLICT",
      Self::Store(_) => "INTERNAL_ERROR",
    }
  }

  /// The message without the kind prefix added by `Display`.
  pub fn message(&self) -> String {
    match self {
      Self::Validation(m) | Self::NotFound(m) | Self::Conflict(m) => m.clone(),
      Self::Store(e) => e.to_string(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
