//! Student requests, responses and [`StudentService`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use roster_core::{
  Error, Patch, Result,
  filter::Filter,
  normalize::{normalize_code, normalize_phone},
  page::{Page, PageRequest, SortOrder},
  store::RosterStore,
  student::{
    self, EnrollmentStat, NewStudent, STUDENT_CODE_MAX_LEN, Student, StudentField, StudentSort,
  },
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  commit_error, ensure_phone_free, merge,
  person::{PersonCreateRequest, PersonDetail, PersonSearchRequest},
};

/// Newest first.
pub fn default_sort() -> Vec<SortOrder<StudentSort>> {
  vec![SortOrder::desc(StudentSort::CreatedAt)]
}

fn validate_code(raw: Option<&str>) -> Result<String> {
  merge::required("studentCode", raw, normalize_code, STUDENT_CODE_MAX_LEN)
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// The student half of a composite create.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentCreateOnlyRequest {
  pub student_code:    Option<String>,
  pub enrollment_year: Option<i32>,
}

impl StudentCreateOnlyRequest {
  fn validate(self) -> Result<NewStudent> {
    Ok(NewStudent {
      student_code:    validate_code(self.student_code.as_deref())?,
      enrollment_year: self.enrollment_year,
    })
  }
}

/// Create a new person and enrol them in one step.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentCreateRequest {
  pub person:  Option<PersonCreateRequest>,
  pub student: Option<StudentCreateOnlyRequest>,
}

/// Enrol a person who already exists.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentCreateFromPersonRequest {
  pub person_id:       Option<Uuid>,
  pub student_code:    Option<String>,
  pub enrollment_year: Option<i32>,
}

/// Partial update. `studentCode` cannot be cleared; `enrollmentYear` can.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StudentPatchRequest {
  pub student_code:    Patch<String>,
  pub enrollment_year: Patch<i32>,
}

impl StudentPatchRequest {
  pub(crate) fn apply(self, student: &mut Student) -> Result<()> {
    merge::merge_required(
      "studentCode",
      &mut student.student_code,
      self.student_code,
      normalize_code,
      STUDENT_CODE_MAX_LEN,
    )?;
    merge::merge_value(&mut student.enrollment_year, self.enrollment_year);
    Ok(())
  }
}

/// Student search. Person criteria apply to the enrolled person.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSearchRequest {
  #[serde(default)]
  pub person:               PersonSearchRequest,
  /// Substring of the student code.
  pub student_code:         Option<String>,
  pub enrollment_year_from: Option<i32>,
  pub enrollment_year_to:   Option<i32>,
}

impl StudentSearchRequest {
  pub fn filter(&self) -> Filter<StudentField> {
    let code = normalize_code(self.student_code.as_deref());
    self
      .person
      .clauses()
      .into_iter()
      .map(student::on_person)
      .chain([
        student::student_code_contains(code.as_deref()),
        student::enrollment_year_from(self.enrollment_year_from),
        student::enrollment_year_to(self.enrollment_year_to),
      ])
      .collect()
  }
}

// ─── Responses ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDetail {
  pub person_detail:   PersonDetail,
  pub student_code:    String,
  pub enrollment_year: Option<i32>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

impl From<&Student> for StudentDetail {
  fn from(s: &Student) -> Self {
    Self {
      person_detail:   PersonDetail::from(&s.person),
      student_code:    s.student_code.clone(),
      enrollment_year: s.enrollment_year,
      created_at:      s.created_at,
      updated_at:      s.updated_at,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentListItem {
  pub id:              Uuid,
  pub student_code:    String,
  pub enrollment_year: Option<i32>,
  pub full_name:       String,
  pub contact_email:   Option<String>,
  pub is_adult:        bool,
}

impl From<&Student> for StudentListItem {
  fn from(s: &Student) -> Self {
    Self {
      id:              s.id,
      student_code:    s.student_code.clone(),
      enrollment_year: s.enrollment_year,
      full_name:       s.person.full_name.clone(),
      contact_email:   s.person.contact_email.clone(),
      is_adult:        s.person.is_adult(),
    }
  }
}

fn not_found(id: Uuid) -> Error { Error::NotFound(format!("Student not found with id: {id}")) }

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct StudentService<S> {
  store: Arc<S>,
}

impl<S> Clone for StudentService<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: RosterStore> StudentService<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub async fn list(&self, page: &PageRequest<StudentSort>) -> Result<Page<StudentListItem>> {
    self.find(&Filter::unrestricted(), page).await
  }

  pub async fn search(
    &self,
    criteria: &StudentSearchRequest,
    page: &PageRequest<StudentSort>,
  ) -> Result<Page<StudentListItem>> {
    self.find(&criteria.filter(), page).await
  }

  pub async fn list_by_enrollment_year(
    &self,
    year: Option<i32>,
    page: &PageRequest<StudentSort>,
  ) -> Result<Page<StudentListItem>> {
    let year = year.ok_or_else(|| Error::Validation("year is required".into()))?;
    let filter = Filter::unrestricted().and(student::enrollment_year_equals(Some(year)));
    self.find(&filter, page).await
  }

  pub async fn count_by_enrollment_year(&self) -> Result<Vec<EnrollmentStat>> {
    debug!("counting students by enrollment year");
    self.store.count_by_enrollment_year().await.map_err(Error::store)
  }

  pub async fn get(&self, id: Uuid) -> Result<StudentDetail> {
    debug!(%id, "loading student");
    let student = self.load(id).await?;
    Ok(StudentDetail::from(&student))
  }

  pub async fn get_by_student_code(&self, code: &str) -> Result<StudentDetail> {
    let code = validate_code(Some(code))?;
    debug!(%code, "loading student by code");
    let student = self
      .store
      .find_student_by_code(code.clone())
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::NotFound(format!("Student not found with code: {code}")))?;
    Ok(StudentDetail::from(&student))
  }

  pub async fn get_by_phone(&self, phone: &str) -> Result<StudentDetail> {
    let phone = normalize_phone(Some(phone))
      .ok_or_else(|| Error::Validation("phone is required".into()))?;
    debug!(%phone, "loading student by phone");
    let student = self
      .store
      .find_student_by_phone(phone.clone())
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::NotFound(format!("Student not found with phone: {phone}")))?;
    Ok(StudentDetail::from(&student))
  }

  /// Create a person and their student record together. Both are validated
  /// before anything is written, and either both rows commit or neither does.
  pub async fn create(&self, request: StudentCreateRequest) -> Result<StudentDetail> {
    let (Some(person), Some(student)) = (request.person, request.student) else {
      return Err(Error::Validation("person and student are required".into()));
    };
    let person = person.validate()?;
    let student = student.validate()?;

    if let Some(phone) = &person.phone {
      ensure_phone_free(&*self.store, phone).await?;
    }
    self.ensure_code_free(&student.student_code).await?;

    let created = self
      .store
      .insert_person_with_student(person, student)
      .await
      .map_err(commit_error::<S>)?;
    info!(id = %created.id, code = %created.student_code, "student created");
    Ok(StudentDetail::from(&created))
  }

  /// Enrol an existing person. A person can hold at most one student record;
  /// a second enrolment is a conflict.
  pub async fn create_from_person(
    &self,
    request: StudentCreateFromPersonRequest,
  ) -> Result<StudentDetail> {
    let code = normalize_code(request.student_code.as_deref());
    let (Some(person_id), Some(code)) = (request.person_id, code) else {
      return Err(Error::Validation("personId and studentCode are required".into()));
    };
    let student = NewStudent {
      student_code:    validate_code(Some(&code))?,
      enrollment_year: request.enrollment_year,
    };

    let person_exists = self
      .store
      .get_person(person_id)
      .await
      .map_err(Error::store)?
      .is_some();
    if !person_exists {
      return Err(Error::NotFound(format!("Person not found with id: {person_id}")));
    }
    let enrolled = self
      .store
      .student_exists(person_id)
      .await
      .map_err(Error::store)?;
    if enrolled {
      return Err(Error::Conflict(format!("This person is already a student: {person_id}")));
    }
    self.ensure_code_free(&student.student_code).await?;

    let created = self
      .store
      .insert_student(person_id, student)
      .await
      .map_err(commit_error::<S>)?;
    info!(id = %created.id, code = %created.student_code, "student created for existing person");
    Ok(StudentDetail::from(&created))
  }

  pub async fn patch(&self, id: Uuid, request: StudentPatchRequest) -> Result<StudentDetail> {
    let current = self.load(id).await?;
    let mut merged = current.clone();
    request.apply(&mut merged)?;

    if merged.student_code != current.student_code {
      self.ensure_code_free(&merged.student_code).await?;
    }

    let student = self
      .store
      .update_student(merged)
      .await
      .map_err(commit_error::<S>)?;
    info!(%id, "student patched");
    Ok(StudentDetail::from(&student))
  }

  /// Delete a student record. The person stays.
  pub async fn delete(&self, id: Uuid) -> Result<()> {
    let deleted = self.store.delete_student(id).await.map_err(Error::store)?;
    if !deleted {
      return Err(not_found(id));
    }
    info!(%id, "student deleted");
    Ok(())
  }

  async fn find(
    &self,
    filter: &Filter<StudentField>,
    page: &PageRequest<StudentSort>,
  ) -> Result<Page<StudentListItem>> {
    debug!(clauses = filter.clauses().len(), page = page.page, "searching students");
    let found = self
      .store
      .search_students(filter, page)
      .await
      .map_err(Error::store)?;
    Ok(found.map(|s| StudentListItem::from(&s)))
  }

  async fn load(&self, id: Uuid) -> Result<Student> {
    self
      .store
      .get_student(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| not_found(id))
  }

  async fn ensure_code_free(&self, code: &str) -> Result<()> {
    let taken = self
      .store
      .student_code_exists(code.to_owned())
      .await
      .map_err(Error::store)?;
    if taken {
      return Err(Error::Conflict(format!("Student code {code} already exists")));
    }
    Ok(())
  }
}
