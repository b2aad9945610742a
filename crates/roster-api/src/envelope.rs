//! The uniform response body.
//!
//! ```json
//! { "success": true, "data": { ... }, "timestamp": "2024-06-01T10:00:00Z" }
//! { "success": false, "error": { "code": "NOT_FOUND", "message": "...", "path": "/api/v1/persons/..." }, "timestamp": "..." }
//! ```
//!
//! Exactly one of `data` and `error` is present.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
  pub success:   bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data:      Option<T>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:     Option<ErrorBody>,
  pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
  pub code:    &'static str,
  pub message: String,
  /// Request path that produced the error.
  pub path:    String,
}

impl<T> AppResponse<T> {
  pub fn ok(data: T) -> Self {
    Self { success: true, data: Some(data), error: None, timestamp: Utc::now() }
  }
}

impl AppResponse<()> {
  pub fn failure(error: ErrorBody) -> Self {
    Self { success: false, data: None, error: Some(error), timestamp: Utc::now() }
  }
}
