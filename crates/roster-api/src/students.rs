//! Handlers for `/students` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/students` | `?page=&size=&sort=` |
//! | `GET`    | `/students/search` | Person criteria plus `studentCode`, `enrollmentYearFrom`, `enrollmentYearTo` |
//! | `GET`    | `/students/by-year` | `?year=` (required) |
//! | `GET`    | `/students/stats/count-by-year` | `[{enrollmentYear, total}]` |
//! | `GET`    | `/students/by-student-code` | `?student-code=` |
//! | `GET`    | `/students/by-phone` | `?phone=` |
//! | `GET`    | `/students/{id}` | 404 if not found |
//! | `POST`   | `/students` | Body: `{"person": {...}, "student": {...}}` |
//! | `POST`   | `/students/by-person` | Body: `{"personId", "studentCode", "enrollmentYear"}` |
//! | `PATCH`  | `/students/{id}` | `studentCode` cannot be cleared |
//! | `DELETE` | `/students/{id}` | 204; the person stays |

use axum::{
  Json,
  extract::{OriginalUri, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use roster_core::{page::Page, store::RosterStore, student::EnrollmentStat};
use roster_service::{
  PageParams,
  person::PersonSearchRequest,
  student::{
    StudentCreateFromPersonRequest, StudentCreateRequest, StudentDetail, StudentListItem,
    StudentPatchRequest, StudentSearchRequest, default_sort,
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

/// `GET /students`
pub async fn list<S: RosterStore>(
  State(state): State<ApiState<S>>,
  OriginalUri(uri): OriginalUri,
  AppQuery(params): AppQuery<PageParams>,
) -> ApiResult<Page<StudentListItem>> {
  let page = params.into_request(default_sort).map_err(ApiError::at(uri.path()))?;
  let found = state.students.list(&page).await.map_err(ApiError::at(uri.path()))?;
  Ok(Json(AppResponse::ok(found)))
}

/// `GET /students/search`
///
/// Person and student criteria share one flat query string, so each half is
/// decoded on its own.
pub async fn search<S: RosterStore>(
  State(state): State<ApiState<S>>,
  OriginalUri(uri): OriginalUri,
  AppQuery(person): AppQuery<PersonSearchRequest>,
  AppQuery(criteria): AppQuery<StudentSearchRequest>,
  AppQuery(params): AppQuery<PageParams>,
) -> ApiResult<Page<StudentListItem>> {
  let criteria = StudentSearchRequest { person, ..criteria };
  let page = params.into_request(default_sort).map_err(ApiError::at(uri.path()))?;
  let found = state
    .students
    .search(&criteria, &page)
    .await
    .map_err(ApiError::at(uri.path()))?;
  Ok(Json(AppResponse::ok(found)))
}

#[derive(Debug, Deserialize)]
pub struct YearParams {
  pub year: Option<i32>,
}

/// `GET /students/by-year?year=`
pub async fn by_year<S: RosterStore>(
  State(state): State<ApiState<S>>,
  OriginalUri(uri): OriginalUri,
  AppQuery(year): AppQuery<YearParams>,
  AppQuery(params): AppQuery<PageParams>,
) -> ApiResult<Page<StudentListItem>> {
  let page = params.into_request(default_sort).map_err(ApiError::at(uri.path()))?;
  let found = state
    .students
    .list_by_enrollment_year(year.year, &page)
    .await
    .map_err(ApiError::at(uri.path()))?;
  Ok(Json(AppResponse::ok(found)))
}

/// `GET /students/stats/count-by-year`
pub async fn count_by_year<S: RosterStore>(
  State(state): State<ApiState<S>>,
  OriginalUri(uri): OriginalUri,
) -> ApiResult<Vec<EnrollmentStat>> {
  let stats = state
    .students
    .count_by_enrollment_year()
    .await
    .map_err(ApiError::at(uri.path()))?;
  Ok(Json(AppResponse::ok(stats)))
}

// ─── Lookups ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CodeParams {
  #[serde(rename = "student-code")]
  pub student_code: Option<String>,
}

/// `GET /students/by-student-code?student-code=`
pub async fn by_student_code<S: RosterStore>(
  State(state): State<ApiState<S>>,
  OriginalUri(uri): OriginalUri,
  AppQuery(params): AppQuery<CodeParams>,
) -> ApiResult<StudentDetail> {
  let code = params.student_code.unwrap_or_default();
  let student = state
    .students
    .get_by_student_code(&code)
    .await
    .map_err(ApiError::at(uri.path()))?;
  Ok(Json(AppResponse::ok(student)))
}

/// `GET /students/by-phone?phone=`
pub async fn by_phone<S: RosterStore>(
  State(state): State<ApiState<S>>,
  OriginalUri(uri): OriginalUri,
  AppQuery(params): AppQuery<crate::persons::PhoneParams>,
) -> ApiResult<StudentDetail> {
  let phone = params.phone.unwrap_or_default();
  let student = state
    .students
    .get_by_phone(&phone)
    .await
    .map_err(ApiError::at(uri.path()))?;
  Ok(Json(AppResponse::ok(student)))
}

/// `GET /students/{id}`
pub async fn get_one<S: RosterStore>(
  State(state): State<ApiState<S>>,
  OriginalUri(uri): OriginalUri,
  AppPath(id): AppPath<Uuid>,
) -> ApiResult<StudentDetail> {
  let student = state.students.get(id).await.map_err(ApiError::at(uri.path()))?;
  Ok(Json(AppResponse::ok(student)))
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// `POST /students`
pub async fn create<S: RosterStore>(
  State(state): State<ApiState<S>>,
  OriginalUri(uri): OriginalUri,
  AppJson(body): AppJson<StudentCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
  let student = state.students.create(body).await.map_err(ApiError::at(uri.path()))?;
  let location = location(uri.path(), "", student.person_detail.id);
  Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(AppResponse::ok(student))))
}

/// `POST /students/by-person`
pub async fn create_from_person<S: RosterStore>(
  State(state): State<ApiState<S>>,
  OriginalUri(uri): OriginalUri,
  AppJson(body): AppJson<StudentCreateFromPersonRequest>,
) -> Result<impl IntoResponse, ApiError> {
  let student = state
    .students
    .create_from_person(body)
    .await
    .map_err(ApiError::at(uri.path()))?;
  let location = location(uri.path(), "/by-person", student.person_detail.id);
  Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(AppResponse::ok(student))))
}

/// `PATCH /students/{id}`
pub async fn patch_one<S: RosterStore>(
  State(state): State<ApiState<S>>,
  OriginalUri(uri): OriginalUri,
  AppPath(id): AppPath<Uuid>,
  AppJson(body): AppJson<StudentPatchRequest>,
) -> ApiResult<StudentDetail> {
  let student = state
    .students
    .patch(id, body)
    .await
    .map_err(ApiError::at(uri.path()))?;
  Ok(Json(AppResponse::ok(student)))
}

/// `DELETE /students/{id}`
pub async fn delete_one<S: RosterStore>(
  State(state): State<ApiState<S>>,
  OriginalUri(uri): OriginalUri,
  AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, ApiError> {
  state.students.delete(id).await.map_err(ApiError::at(uri.path()))?;
  Ok(StatusCode::NO_CONTENT)
}
