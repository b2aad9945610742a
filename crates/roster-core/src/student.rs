//! Student: a person enrolled under a unique student code.
//!
//! A student shares its identity with its person: `Student::id` is always the
//! owning person's id, never generated on its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{
  filter::{self, Clause, Value},
  person::{Person, PersonField},
};

pub const STUDENT_CODE_MAX_LEN: usize = 32;

// ─── Entity ──────────────────────────────────────────────────────────────────

/// A stored student, loaded together with its person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
  /// Equal to `person.id`.
  pub id:              Uuid,
  pub person:          Person,
  /// Upper-cased; unique across all students.
  pub student_code:    String,
  pub enrollment_year: Option<i32>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

/// The student half of a new record. Paired with a person id when attaching
/// to an existing person, or with a [`crate::person::NewPerson`] for a
/// composite create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
  pub student_code:    String,
  pub enrollment_year: Option<i32>,
}

/// Number of students per enrollment year. Students without a year are
/// counted under `enrollment_year: None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentStat {
  pub enrollment_year: Option<i32>,
  pub total:           u64,
}

// ─── Query fields ────────────────────────────────────────────────────────────

/// Columns a student search can constrain, including the joined person.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentField {
  StudentCode,
  EnrollmentYear,
  Person(PersonField),
}

/// Columns a student listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum StudentSort {
  CreatedAt,
  UpdatedAt,
  StudentCode,
  EnrollmentYear,
  #[strum(to_string = "person.fullName")]
  PersonFullName,
}

// ─── Clause factories ────────────────────────────────────────────────────────

pub fn student_code_contains(code: Option<&str>) -> Option<Clause<StudentField>> {
  filter::contains(StudentField::StudentCode, code)
}

pub fn enrollment_year_equals(year: Option<i32>) -> Option<Clause<StudentField>> {
  filter::equals(StudentField::EnrollmentYear, year.map(|y| Value::Int(y.into())))
}

pub fn enrollment_year_from(from: Option<i32>) -> Option<Clause<StudentField>> {
  filter::at_least(StudentField::EnrollmentYear, from.map(|y| Value::Int(y.into())))
}

pub fn enrollment_year_to(to: Option<i32>) -> Option<Clause<StudentField>> {
  filter::at_most(StudentField::EnrollmentYear, to.map(|y| Value::Int(y.into())))
}

/// Lift a person clause onto the person side of the student join.
pub fn on_person(clause: Option<Clause<PersonField>>) -> Option<Clause<StudentField>> {
  clause.map(|c| c.map_field(StudentField::Person))
}
