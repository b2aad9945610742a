//! Error type for `roster-store-sqlite`.

use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  /// A UNIQUE, PRIMARY KEY or FOREIGN KEY constraint rejected a write. Holds
  /// SQLite's message, e.g. `UNIQUE constraint failed: people.phone`.
  #[error("constraint violated: {0}")]
  Constraint(String),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("person not found: {0}")]
  PersonNotFound(uuid::Uuid),

  #[error("student not found: {0}")]
  StudentNotFound(uuid::Uuid),
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(err: tokio_rusqlite::Error) -> Self {
    match constraint_message(&err) {
      Some(message) => Self::Constraint(message),
      None => Self::Database(err),
    }
  }
}

/// SQLite's message if `err` is an integrity-constraint failure the service
/// treats as a conflict.
fn constraint_message(err: &tokio_rusqlite::Error) -> Option<String> {
  let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(failure, message)) = err
  else {
    return None;
  };
  match failure.extended_code {
    ffi::SQLITE_CONSTRAINT_UNIQUE
    | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    | ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
      Some(message.clone().unwrap_or_else(|| failure.to_string()))
    }
    _ => None,
  }
}

impl From<Error> for roster_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Constraint(message) => Self::Conflict(describe_constraint(&message)),
      Error::PersonNotFound(id) => Self::NotFound(format!("Person not found with id: {id}")),
      Error::StudentNotFound(id) => Self::NotFound(format!("Student not found with id: {id}")),
      other => Self::Store(Box::new(other)),
    }
  }
}

/// Turn a raw SQLite constraint message into something a client can act on.
fn describe_constraint(message: &str) -> String {
  if message.contains("people.phone") {
    "phone already exists".to_owned()
  } else if message.contains("students.student_code") {
    "student code already exists".to_owned()
  } else if message.contains("students.person_id") {
    "person is already a student".to_owned()
  } else if message.starts_with("FOREIGN KEY") {
    "referenced person does not exist".to_owned()
  } else {
    format!("unique constraint violated: {message}")
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
