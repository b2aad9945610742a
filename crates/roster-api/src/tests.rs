//! Router tests: real handlers over an in-memory store, driven with `oneshot`.

use std::sync::Arc;

use axum::{
  Router,
  body::{Body, to_bytes},
  http::{Method, Request, StatusCode, header},
};
use roster_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::api_router;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  Router::new().nest("/api/v1", api_router(Arc::new(store)))
}

struct Reply {
  status:   StatusCode,
  location: Option<String>,
  body:     Value,
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Reply {
  let builder = Request::builder().method(method).uri(uri);
  let request = match body {
    Some(json) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let response = app.clone().oneshot(request).await.unwrap();
  let status = response.status();
  let location = response
    .headers()
    .get(header::LOCATION)
    .map(|v| v.to_str().unwrap().to_owned());
  let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  Reply { status, location, body }
}

async fn get(app: &Router, uri: &str) -> Reply { send(app, Method::GET, uri, None).await }

async fn post(app: &Router, uri: &str, body: Value) -> Reply {
  send(app, Method::POST, uri, Some(body)).await
}

async fn patch(app: &Router, uri: &str, body: Value) -> Reply {
  send(app, Method::PATCH, uri, Some(body)).await
}

fn assert_error(reply: &Reply, status: StatusCode, code: &str, path: &str) {
  assert_eq!(reply.status, status, "{}", reply.body);
  assert_eq!(reply.body["success"], false);
  assert_eq!(reply.body["error"]["code"], code);
  assert_eq!(reply.body["error"]["path"], path);
  assert!(reply.body.get("data").is_none());
}

// ─── Persons ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_person_returns_location_and_envelope() {
  let app = app().await;

  let created = post(
    &app,
    "/api/v1/persons",
    json!({ "fullName": "  Jane Doe  ", "phone": "090-123 456", "dob": "1990-01-01" }),
  )
  .await;
  assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
  assert_eq!(created.body["success"], true);
  assert!(created.body.get("error").is_none());

  let data = &created.body["data"];
  assert_eq!(data["fullName"], "Jane Doe");
  assert_eq!(data["phone"], "090123456");
  assert_eq!(data["isAdult"], true);
  assert!(data["createdAt"].is_string());

  let id = data["id"].as_str().unwrap();
  let location = created.location.unwrap();
  assert_eq!(location, format!("/api/v1/persons/{id}"));

  let fetched = get(&app, &location).await;
  assert_eq!(fetched.status, StatusCode::OK);
  assert_eq!(fetched.body["data"], *data);
}

#[tokio::test]
async fn duplicate_phone_is_a_conflict() {
  let app = app().await;
  post(&app, "/api/v1/persons", json!({ "fullName": "A", "phone": "0900000000" })).await;

  let reply = post(&app, "/api/v1/persons", json!({ "fullName": "B", "phone": "090 000 0000" })).await;
  assert_error(&reply, StatusCode::CONFLICT, "CONFLICT", "/api/v1/persons");
}

#[tokio::test]
async fn blank_name_is_a_validation_error() {
  let app = app().await;
  let reply = post(&app, "/api/v1/persons", json!({ "fullName": "   " })).await;
  assert_error(&reply, StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "/api/v1/persons");
}

#[tokio::test]
async fn malformed_input_is_a_bad_request() {
  let app = app().await;

  let request = Request::builder()
    .method(Method::POST)
    .uri("/api/v1/persons")
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from("{not json"))
    .unwrap();
  let response = app.clone().oneshot(request).await.unwrap();
  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let body: Value = serde_json::from_slice(&bytes).unwrap();
  assert_eq!(body["error"]["code"], "BAD_REQUEST");

  let reply = get(&app, "/api/v1/persons/not-a-uuid").await;
  assert_error(&reply, StatusCode::BAD_REQUEST, "BAD_REQUEST", "/api/v1/persons/not-a-uuid");

  let reply = get(&app, "/api/v1/persons?size=lots").await;
  assert_error(&reply, StatusCode::BAD_REQUEST, "BAD_REQUEST", "/api/v1/persons");
}

#[tokio::test]
async fn missing_person_is_not_found() {
  let app = app().await;
  let path = "/api/v1/persons/00000000-0000-0000-0000-000000000000";
  assert_error(&get(&app, path).await, StatusCode::NOT_FOUND, "NOT_FOUND", path);
}

#[tokio::test]
async fn patch_distinguishes_absent_null_and_value() {
  let app = app().await;
  let created = post(
    &app,
    "/api/v1/persons",
    json!({ "fullName": "Ann", "phone": "0901", "address": "Hue" }),
  )
  .await;
  let location = created.location.unwrap();

  let reply = patch(&app, &location, json!({ "address": null, "contactEmail": "ANN@X.IO" })).await;
  assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
  let data = &reply.body["data"];
  assert_eq!(data["fullName"], "Ann");
  assert_eq!(data["phone"], "0901");
  assert_eq!(data["address"], Value::Null);
  assert_eq!(data["contactEmail"], "ann@x.io");

  let reply = patch(&app, &location, json!({ "fullName": null })).await;
  assert_error(&reply, StatusCode::BAD_REQUEST, "VALIDATION_ERROR", &location);
}

#[tokio::test]
async fn delete_person_returns_no_content() {
  let app = app().await;
  let created = post(&app, "/api/v1/persons", json!({ "fullName": "Ann" })).await;
  let location = created.location.unwrap();

  let reply = send(&app, Method::DELETE, &location, None).await;
  assert_eq!(reply.status, StatusCode::NO_CONTENT);
  assert_eq!(reply.body, Value::Null);

  assert_eq!(get(&app, &location).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_by_ids_accepts_null_and_arrays() {
  let app = app().await;
  let created = post(&app, "/api/v1/persons", json!({ "fullName": "Ann" })).await;
  post(&app, "/api/v1/persons", json!({ "fullName": "Bob" })).await;
  let id = created.body["data"]["id"].clone();

  let reply = post(&app, "/api/v1/persons/list-by-ids", Value::Null).await;
  assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
  assert_eq!(reply.body["data"]["totalItems"], 0);
  assert_eq!(reply.body["data"]["items"], json!([]));

  let reply = post(&app, "/api/v1/persons/list-by-ids", json!([])).await;
  assert_eq!(reply.body["data"]["totalItems"], 0);

  let reply = post(&app, "/api/v1/persons/list-by-ids", json!([id])).await;
  assert_eq!(reply.body["data"]["totalItems"], 1);
  assert_eq!(reply.body["data"]["items"][0]["fullName"], "Ann");
}

#[tokio::test]
async fn search_pages_and_sorts() {
  let app = app().await;
  for name in ["Carol", "alice", "Alan", "Bob"] {
    post(&app, "/api/v1/persons", json!({ "fullName": name })).await;
  }

  let reply = get(&app, "/api/v1/persons/search?name=AL&sort=fullName,asc&size=1").await;
  assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
  let page = &reply.body["data"];
  assert_eq!(page["totalItems"], 2);
  assert_eq!(page["totalPages"], 2);
  assert_eq!(page["size"], 1);
  assert_eq!(page["page"], 0);
  assert_eq!(page["items"][0]["fullName"], "Alan");

  let reply = get(&app, "/api/v1/persons?sort=fullName,desc&page=0&size=10").await;
  let names: Vec<_> = reply.body["data"]["items"]
    .as_array()
    .unwrap()
    .iter()
    .map(|p| p["fullName"].as_str().unwrap().to_owned())
    .collect();
  assert_eq!(names, ["alice", "Carol", "Bob", "Alan"]);

  let reply = get(&app, "/api/v1/persons?sort=shoeSize").await;
  assert_error(&reply, StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "/api/v1/persons");
}

#[tokio::test]
async fn person_by_phone() {
  let app = app().await;
  post(&app, "/api/v1/persons", json!({ "fullName": "Ann", "phone": "0901234" })).await;

  let reply = get(&app, "/api/v1/persons/by-phone?phone=0901-234").await;
  assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
  assert_eq!(reply.body["data"]["fullName"], "Ann");

  let reply = get(&app, "/api/v1/persons/by-phone").await;
  assert_error(&reply, StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "/api/v1/persons/by-phone");
}

// ─── Students ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn composite_student_create() {
  let app = app().await;
  let reply = post(
    &app,
    "/api/v1/students",
    json!({
      "person": { "fullName": "Ann", "phone": "0901" },
      "student": { "studentCode": "abc123", "enrollmentYear": 2024 }
    }),
  )
  .await;
  assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);

  let data = &reply.body["data"];
  assert_eq!(data["studentCode"], "ABC123");
  assert_eq!(data["enrollmentYear"], 2024);
  assert_eq!(data["personDetail"]["fullName"], "Ann");

  let id = data["personDetail"]["id"].as_str().unwrap();
  assert_eq!(reply.location.unwrap(), format!("/api/v1/students/{id}"));

  let reply = get(&app, "/api/v1/students/by-student-code?student-code=abc123").await;
  assert_eq!(reply.body["data"]["personDetail"]["id"], id);

  let reply = get(&app, "/api/v1/students/by-phone?phone=09-01").await;
  assert_eq!(reply.body["data"]["studentCode"], "ABC123");
}

#[tokio::test]
async fn enrolling_an_existing_person() {
  let app = app().await;
  let person = post(&app, "/api/v1/persons", json!({ "fullName": "Ann" })).await;
  let person_id = person.body["data"]["id"].clone();

  let reply = post(
    &app,
    "/api/v1/students/by-person",
    json!({ "personId": person_id, "studentCode": "s1" }),
  )
  .await;
  assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
  assert_eq!(
    reply.location.unwrap(),
    format!("/api/v1/students/{}", person_id.as_str().unwrap())
  );

  let reply = post(
    &app,
    "/api/v1/students/by-person",
    json!({ "personId": person_id, "studentCode": "s2" }),
  )
  .await;
  assert_error(&reply, StatusCode::CONFLICT, "CONFLICT", "/api/v1/students/by-person");
}

#[tokio::test]
async fn student_listing_endpoints() {
  let app = app().await;
  for (name, code, year) in [("Ann", "S1", 2021), ("Bob", "S2", 2023), ("Cid", "X3", 2023)] {
    post(
      &app,
      "/api/v1/students",
      json!({
        "person": { "fullName": name },
        "student": { "studentCode": code, "enrollmentYear": year }
      }),
    )
    .await;
  }

  let reply = get(&app, "/api/v1/students/search?studentCode=s&enrollmentYearFrom=2022").await;
  assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
  assert_eq!(reply.body["data"]["totalItems"], 1);
  assert_eq!(reply.body["data"]["items"][0]["fullName"], "Bob");

  let reply = get(&app, "/api/v1/students/search?name=a&sort=person.fullName,asc").await;
  assert_eq!(reply.body["data"]["totalItems"], 1);
  assert_eq!(reply.body["data"]["items"][0]["studentCode"], "S1");

  let reply = get(&app, "/api/v1/students/by-year?year=2023").await;
  assert_eq!(reply.body["data"]["totalItems"], 2);

  let reply = get(&app, "/api/v1/students/by-year").await;
  assert_error(&reply, StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "/api/v1/students/by-year");

  let reply = get(&app, "/api/v1/students/stats/count-by-year").await;
  assert_eq!(
    reply.body["data"],
    json!([{ "enrollmentYear": 2021, "total": 1 }, { "enrollmentYear": 2023, "total": 2 }])
  );

  let reply = get(&app, "/api/v1/students?size=2").await;
  assert_eq!(reply.body["data"]["totalPages"], 2);
  assert_eq!(reply.body["data"]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn student_patch_and_delete() {
  let app = app().await;
  let created = post(
    &app,
    "/api/v1/students",
    json!({ "person": { "fullName": "Ann" }, "student": { "studentCode": "S1", "enrollmentYear": 2020 } }),
  )
  .await;
  let location = created.location.unwrap();

  let reply = patch(&app, &location, json!({ "enrollmentYear": null })).await;
  assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
  assert_eq!(reply.body["data"]["studentCode"], "S1");
  assert_eq!(reply.body["data"]["enrollmentYear"], Value::Null);

  let reply = patch(&app, &location, json!({ "studentCode": null })).await;
  assert_error(&reply, StatusCode::BAD_REQUEST, "VALIDATION_ERROR", &location);

  let reply = send(&app, Method::DELETE, &location, None).await;
  assert_eq!(reply.status, StatusCode::NO_CONTENT);
  assert_eq!(get(&app, &location).await.status, StatusCode::NOT_FOUND);

  let id = location.rsplit('/').next().unwrap();
  let person = get(&app, &format!("/api/v1/persons/{id}")).await;
  assert_eq!(person.status, StatusCode::OK);
}

// ─── Routing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_route_is_an_enveloped_not_found() {
  let app = app().await;
  let reply = get(&app, "/api/v1/teachers").await;
  assert_error(&reply, StatusCode::NOT_FOUND, "NOT_FOUND", "/api/v1/teachers");
}

#[tokio::test]
async fn wrong_method_is_an_enveloped_method_not_allowed() {
  let app = app().await;
  let reply = send(&app, Method::DELETE, "/api/v1/persons", None).await;
  assert_error(
    &reply,
    StatusCode::METHOD_NOT_ALLOWED,
    "METHOD_NOT_ALLOWED",
    "/api/v1/persons",
  );
}
