//! Handlers for `/persons` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/persons` | `?page=&size=&sort=` |
//! | `GET`    | `/persons/search` | `?name=&phone=&email=&address=&dobFrom=&dobTo=` plus paging |
//! | `POST`   | `/persons/list-by-ids` | Body: JSON array of ids, or `null` |
//! | `GET`    | `/persons/by-phone` | `?phone=` |
//! | `GET`    | `/persons/{id}` | 404 if not found |
//! | `POST`   | `/persons` | 201 with `Location` |
//! | `PATCH`  | `/persons/{id}` | Omitted fields untouched, `null` clears |
//! | `DELETE` | `/persons/{id}` | 204; cascades to the student record |

use axum::{
  Json,
  extract::{OriginalUri, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use roster_core::{page::Page, store::RosterStore};
use roster_service::{
  PageParams,
  person::{
    PersonCreateRequest, PersonDetail, PersonListItem, PersonPatchRequest, PersonSearchRequest,
    default_sort,
  },
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiState,
  envelope::AppResponse,
  error::ApiError,
  extract::{AppJson, AppPath, AppQuery},
  location,
};

type ApiResult<T> = Result<Json<AppResponse<T>>, ApiError>;

// ─── Listing ─────────────────────────────────────────────────────────────────

/// `GET /persons`
pub async fn list<S: RosterStore>(
  State(state): State<ApiState<S>>,
  OriginalUri(uri): OriginalUri,
  AppQuery(params): AppQuery<PageParams>,
) -> ApiResult<Page<PersonListItem>> {
  let page = params.into_request(default_sort).map_err(ApiError::at(uri.path()))?;
  let found = state.persons.list(&page).await.map_err(ApiError::at(uri.path()))?;
  Ok(Json(AppResponse::ok(found)))
}

/// `GET /persons/search`
pub async fn search<S: RosterStore>(
  State(state): State<ApiState<S>>,
  OriginalUri(uri): OriginalUri,
  AppQuery(criteria): AppQuery<PersonSearchRequest>,
  AppQuery(params): AppQuery<PageParams>,
) -> ApiResult<Page<PersonListItem>> {
  let page = params.into_request(default_sort).map_err(ApiError::at(uri.path()))?;
  let found = state
    .persons
    .search(&criteria, &page)
    .await
    .map_err(ApiError::at(uri.path()))?;
  Ok(Json(AppResponse::ok(found)))
}

/// `POST /persons/list-by-ids` with a body of `["<uuid>", ...]` or `null`
pub async fn list_by_ids<S: RosterStore>(
  State(state): State<ApiState<S>>,
  OriginalUri(uri): OriginalUri,
  AppQuery(params): AppQuery<PageParams>,
  AppJson(ids): AppJson<Option<Vec<Uuid>>>,
) -> ApiResult<Page<PersonListItem>> {
  let page = params.into_request(default_sort).map_err(ApiError::at(uri.path()))?;
  let found = state
    .persons
    .list_by_ids(ids, &page)
    .await
    .map_err(ApiError::at(uri.path()))?;
  Ok(Json(AppResponse::ok(found)))
}

// ─── Lookups ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PhoneParams {
  pub phone: Option<String>,
}

/// `GET /persons/by-phone?phone=`
pub async fn by_phone<S: RosterStore>(
  State(state): State<ApiState<S>>,
  OriginalUri(uri): OriginalUri,
  AppQuery(params): AppQuery<PhoneParams>,
) -> ApiResult<PersonDetail> {
  let phone = params.phone.unwrap_or_default();
  let person = state
    .persons
    .get_by_phone(&phone)
    .await
    .map_err(ApiError::at(uri.path()))?;
  Ok(Json(AppResponse::ok(person)))
}

/// `GET /persons/{id}`
pub async fn get_one<S: RosterStore>(
  State(state): State<ApiState<S>>,
  OriginalUri(uri): OriginalUri,
  AppPath(id): AppPath<Uuid>,
) -> ApiResult<PersonDetail> {
  let person = state.persons.get(id).await.map_err(ApiError::at(uri.path()))?;
  Ok(Json(AppResponse::ok(person)))
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// `POST /persons`
pub async fn create<S: RosterStore>(
  State(state): State<ApiState<S>>,
  OriginalUri(uri): OriginalUri,
  AppJson(body): AppJson<PersonCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
  let person = state.persons.create(body).await.map_err(ApiError::at(uri.path()))?;
  let location = location(uri.path(), "", person.id);
  Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(AppResponse::ok(person))))
}

/// `PATCH /persons/{id}`
pub async fn patch_one<S: RosterStore>(
  State(state): State<ApiState<S>>,
  OriginalUri(uri): OriginalUri,
  AppPath(id): AppPath<Uuid>,
  AppJson(body): AppJson<PersonPatchRequest>,
) -> ApiResult<PersonDetail> {
  let person = state
    .persons
    .patch(id, body)
    .await
    .map_err(ApiError::at(uri.path()))?;
  Ok(Json(AppResponse::ok(person)))
}

/// `DELETE /persons/{id}`
pub async fn delete_one<S: RosterStore>(
  State(state): State<ApiState<S>>,
  OriginalUri(uri): OriginalUri,
  AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, ApiError> {
  state.persons.delete(id).await.map_err(ApiError::at(uri.path()))?;
  Ok(StatusCode::NO_CONTENT)
}
