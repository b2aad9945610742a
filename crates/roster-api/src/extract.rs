//! Extractors whose rejections render as failure envelopes.
//!
//! They wrap axum's own `Json`, `Query` and `Path` and turn a rejection into
//! [`ApiError::Malformed`] carrying the original request path.

use axum::{
  Json,
  extract::{FromRequest, FromRequestParts, OriginalUri, Path, Query, Request},
  http::{Uri, request::Parts},
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// The path the client asked for, before any `nest` stripped a prefix.
fn request_path(original: Option<&OriginalUri>, uri: &Uri) -> String {
  original.map_or(uri, |o| &o.0).path().to_owned()
}

fn malformed(rejection: impl std::fmt::Display, path: String) -> ApiError {
  ApiError::Malformed { message: rejection.to_string(), path }
}

/// JSON request body.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
  S: Send + Sync,
  T: DeserializeOwned,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let path = request_path(req.extensions().get::<OriginalUri>(), req.uri());
    match Json::<T>::from_request(req, state).await {
      Ok(Json(value)) => Ok(Self(value)),
      Err(rejection) => Err(malformed(rejection, path)),
    }
  }
}

/// Query-string parameters.
pub struct AppQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for AppQuery<T>
where
  S: Send + Sync,
  T: DeserializeOwned,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    match Query::<T>::from_request_parts(parts, state).await {
      Ok(Query(value)) => Ok(Self(value)),
      Err(rejection) => {
        let path = request_path(parts.extensions.get::<OriginalUri>(), &parts.uri);
        Err(malformed(rejection, path))
      }
    }
  }
}

/// Path parameters.
pub struct AppPath<T>(pub T);

impl<S, T> FromRequestParts<S> for AppPath<T>
where
  S: Send + Sync,
  T: DeserializeOwned + Send,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    match Path::<T>::from_request_parts(parts, state).await {
      Ok(Path(value)) => Ok(Self(value)),
      Err(rejection) => {
        let path = request_path(parts.extensions.get::<OriginalUri>(), &parts.uri);
        Err(malformed(rejection, path))
      }
    }
  }
}
