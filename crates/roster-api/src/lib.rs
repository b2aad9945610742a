//! JSON REST API for Roster.
//!
//! Exposes an axum [`Router`] backed by any [`roster_core::store::RosterStore`].
//! Every response body is an [`envelope::AppResponse`]; TLS, auth and
//! request tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/v1", roster_api::api_router(store.clone()))
//! ```

pub mod envelope;
pub mod error;
pub mod extract;
pub mod persons;
pub mod students;

use std::sync::Arc;

use axum::{
  Router,
  extract::OriginalUri,
  routing::{get, post},
};
use roster_core::store::RosterStore;
use roster_service::{PersonService, StudentService};
use uuid::Uuid;

pub use error::ApiError;

/// Shared handler state: one service per resource over the same store.
pub struct ApiState<S> {
  pub persons:  PersonService<S>,
  pub students: StudentService<S>,
}

impl<S: RosterStore> ApiState<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self {
      persons:  PersonService::new(Arc::clone(&store)),
      students: StudentService::new(store),
    }
  }
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { persons: self.persons.clone(), students: self.students.clone() }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RosterStore + 'static,
{
  Router::new()
    // Persons
    .route("/persons", get(persons::list::<S>).post(persons::create::<S>))
    .route("/persons/search", get(persons::search::<S>))
    .route("/persons/list-by-ids", post(persons::list_by_ids::<S>))
    .route("/persons/by-phone", get(persons::by_phone::<S>))
    .route(
      "/persons/{id}",
      get(persons::get_one::<S>)
        .patch(persons::patch_one::<S>)
        .delete(persons::delete_one::<S>),
    )
    // Students
    .route("/students", get(students::list::<S>).post(students::create::<S>))
    .route("/students/search", get(students::search::<S>))
    .route("/students/by-year", get(students::by_year::<S>))
    .route("/students/stats/count-by-year", get(students::count_by_year::<S>))
    .route("/students/by-student-code", get(students::by_student_code::<S>))
    .route("/students/by-phone", get(students::by_phone::<S>))
    .route("/students/by-person", post(students::create_from_person::<S>))
    .route(
      "/students/{id}",
      get(students::get_one::<S>)
        .patch(students::patch_one::<S>)
        .delete(students::delete_one::<S>),
    )
    .method_not_allowed_fallback(method_not_allowed)
    .fallback(no_route)
    .with_state(ApiState::new(store))
}

/// Fallback for unmatched paths. Also usable on a parent router so requests
/// outside the API mount get the same envelope.
pub async fn no_route(OriginalUri(uri): OriginalUri) -> ApiError {
  ApiError::NoRoute { path: uri.path().to_owned() }
}

async fn method_not_allowed(OriginalUri(uri): OriginalUri) -> ApiError {
  ApiError::MethodNotAllowed { path: uri.path().to_owned() }
}

/// `Location` of a newly created resource: the collection path the request
/// was made under, followed by the new id.
fn location(request_path: &str, route_suffix: &str, id: Uuid) -> String {
  let collection = request_path.strip_suffix(route_suffix).unwrap_or(request_path);
  format!("{}/{id}", collection.trim_end_matches('/'))
}

#[cfg(test)]
mod tests;
