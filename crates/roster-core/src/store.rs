//! The `RosterStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `roster-store-sqlite`).
//! Higher layers (`roster-service`, `roster-api`) depend on this abstraction,
//! not on any concrete backend.
//!
//! Backends guarantee:
//!
//! - writes return the full stored row, including the server-assigned id and
//!   timestamps, read back after the commit;
//! - a write that would break a uniqueness or one-to-one invariant is
//!   rejected at commit time and surfaces as [`crate::Error::Conflict`], even
//!   if the caller's pre-check passed;
//! - [`RosterStore::insert_person_with_student`] commits both rows or
//!   neither.

use std::future::Future;

use uuid::Uuid;

use crate::{
  filter::Filter,
  page::{Page, PageRequest},
  person::{NewPerson, Person, PersonField, PersonSort},
  student::{EnrollmentStat, NewStudent, Student, StudentField, StudentSort},
};

/// Abstraction over a Roster store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RosterStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static + Into<crate::Error>;

  // ── People ────────────────────────────────────────────────────────────

  /// Insert a person and return it as stored.
  fn insert_person(
    &self,
    input: NewPerson,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Retrieve a person by id. Returns `None` if not found.
  fn get_person(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Look up a person by normalised phone.
  fn find_person_by_phone(
    &self,
    phone: String,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  fn phone_exists(
    &self,
    phone: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Overwrite every client-writable column of `person` in one statement and
  /// return the row as stored.
  fn update_person(
    &self,
    person: Person,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Delete a person (and, by cascade, its student). Returns `false` if there
  /// was no such person.
  fn delete_person(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// People matching `filter`, one page at a time.
  fn search_people<'a>(
    &'a self,
    filter: &'a Filter<PersonField>,
    page: &'a PageRequest<PersonSort>,
  ) -> impl Future<Output = Result<Page<Person>, Self::Error>> + Send + 'a;

  /// People whose id is in `ids`, one page at a time. Duplicate ids count
  /// once.
  fn people_by_ids<'a>(
    &'a self,
    ids: Vec<Uuid>,
    page: &'a PageRequest<PersonSort>,
  ) -> impl Future<Output = Result<Page<Person>, Self::Error>> + Send + 'a;

  // ── Students ──────────────────────────────────────────────────────────

  /// Attach a student to the existing person `person_id`.
  fn insert_student(
    &self,
    person_id: Uuid,
    input: NewStudent,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  /// Insert a person and its student atomically.
  fn insert_person_with_student(
    &self,
    person: NewPerson,
    student: NewStudent,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  /// Retrieve a student (with its person) by id.
  fn get_student(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + '_;

  /// Whether the person `id` already has a student.
  fn student_exists(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn student_code_exists(
    &self,
    code: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn find_student_by_code(
    &self,
    code: String,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + '_;

  /// Look up a student through its person's normalised phone.
  fn find_student_by_phone(
    &self,
    phone: String,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + '_;

  /// Overwrite the student columns of `student` (not its person) and return
  /// the row as stored.
  fn update_student(
    &self,
    student: Student,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  /// Delete a student, leaving its person in place.
  fn delete_student(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Students matching `filter`, one page at a time.
  fn search_students<'a>(
    &'a self,
    filter: &'a Filter<StudentField>,
    page: &'a PageRequest<StudentSort>,
  ) -> impl Future<Output = Result<Page<Student>, Self::Error>> + Send + 'a;

  /// Student counts grouped by enrollment year, ascending, unknown year first.
  fn count_by_enrollment_year(
    &self,
  ) -> impl Future<Output = Result<Vec<EnrollmentStat>, Self::Error>> + Send + '_;
}
