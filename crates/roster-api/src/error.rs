//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::envelope::{AppResponse, ErrorBody};

/// An error returned by an API handler. Rendered as a failure envelope.
#[derive(Debug, Error)]
pub enum ApiError {
  /// A service call failed.
  #[error("{source}")]
  Service { source: roster_core::Error, path: String },

  /// The request could not be decoded: bad JSON, query string or path.
  #[error("bad request: {message}")]
  Malformed { message: String, path: String },

  /// No route matches the request path.
  #[error("no route for {path}")]
  NoRoute { path: String },

  /// The path exists but not for this method.
  #[error("method not allowed on {path}")]
  MethodNotAllowed { path: String },
}

impl ApiError {
  /// Attach the request path to a service error, for use with `map_err`.
  pub fn at(path: &str) -> impl FnOnce(roster_core::Error) -> Self + '_ {
    move |source| Self::Service { source, path: path.to_owned() }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::Service { source, .. } => match source {
        roster_core::Error::Validation(_) => StatusCode::BAD_REQUEST,
        roster_core::Error::NotFound(_) => StatusCode::NOT_FOUND,
        roster_core::Error::Conflict(_) => StatusCode::CONFLICT,
        roster_core::Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
      Self::Malformed { .. } => StatusCode::BAD_REQUEST,
      Self::NoRoute { .. } => StatusCode::NOT_FOUND,
      Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
    }
  }

  fn body(self) -> ErrorBody {
    match self {
      Self::Service { source: roster_core::Error::Store(err), path } => {
        tracing::error!(error = %err, %path, "store failure");
        ErrorBody { code: "INTERNAL_ERROR", message: "Internal server error".into(), path }
      }
      Self::Service { source, path } => {
        ErrorBody { code: source.code(), message: source.message(), path }
      }
      Self::Malformed { message, path } => ErrorBody { code: "BAD_REQUEST", message, path },
      Self::NoRoute { path } => {
        ErrorBody { code: "NOT_FOUND", message: format!("No route for {path}"), path }
      }
      Self::MethodNotAllowed { path } => ErrorBody {
        code: "METHOD_NOT_ALLOWED",
        message: "Method not allowed".into(),
        path,
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    (status, Json(AppResponse::failure(self.body()))).into_response()
  }
}
