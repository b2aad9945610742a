//! [`SqliteStore`]: the SQLite implementation of [`RosterStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use roster_core::{
  filter::Filter,
  page::{Page, PageRequest},
  person::{NewPerson, Person, PersonField, PersonSort},
  store::RosterStore,
  student::{EnrollmentStat, NewStudent, Student, StudentField, StudentSort},
};

use crate::{
  Error, Result,
  encode::{PERSON_COLUMNS, RawPerson, RawStudent, STUDENT_COLUMNS, encode_date, encode_uuid},
  query::{Column, Where, register_functions, render_filter, render_order},
  schema::{NOW, SCHEMA},
};

const PEOPLE_FROM: &str = "people p";
const STUDENTS_FROM: &str = "students s JOIN people p ON p.id = s.person_id";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Roster store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        register_functions(conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `SELECT 1 FROM <table> WHERE <column> = ?1`.
  async fn exists(&self, sql: &'static str, key: String) -> Result<bool> {
    let found = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(sql, rusqlite::params![key], |_| Ok(())).optional()?)
      })
      .await?;
    Ok(found.is_some())
  }

  async fn person_where(&self, column: &'static str, key: String) -> Result<Option<Person>> {
    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| Ok(select_person(conn, column, &key)?))
      .await?;
    raw.map(RawPerson::into_person).transpose()
  }

  async fn student_where(&self, column: &'static str, key: String) -> Result<Option<Student>> {
    let raw: Option<RawStudent> = self
      .conn
      .call(move |conn| Ok(select_student(conn, column, &key)?))
      .await?;
    raw.map(RawStudent::into_student).transpose()
  }

  async fn delete_where(&self, sql: &'static str, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let deleted = self
      .conn
      .call(move |conn| Ok(conn.execute(sql, rusqlite::params![id_str])?))
      .await?;
    Ok(deleted > 0)
  }

  /// Count and fetch one page of `listing`, restricted by `filter`.
  async fn page<R, T, S>(
    &self,
    listing: &Listing<R, T>,
    filter: Where,
    request: &PageRequest<S>,
  ) -> Result<Page<T>>
  where
    R: Send + 'static,
    S: Column,
  {
    let from = listing.from;
    let columns = listing.columns;
    let read = listing.read;
    let order = render_order(&request.sort, listing.tie_break);
    let limit = i64::from(request.size);
    let offset = i64::try_from(request.offset()).unwrap_or(i64::MAX);

    let (total, raws): (i64, Vec<R>) = self
      .conn
      .call(move |conn| {
        let Where { sql: where_sql, mut params } = filter;

        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM {from} {where_sql}"),
          rusqlite::params_from_iter(params.iter()),
          |row| row.get(0),
        )?;

        params.push(rusqlite::types::Value::Integer(limit));
        params.push(rusqlite::types::Value::Integer(offset));
        let mut stmt = conn.prepare(&format!(
          "SELECT {columns} FROM {from} {where_sql} {order} LIMIT ? OFFSET ?"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((total, rows))
      })
      .await?;

    let items = raws.into_iter().map(listing.decode).collect::<Result<Vec<_>>>()?;
    Ok(Page::new(items, request, u64::try_from(total).unwrap_or(0)))
  }
}

// ─── Listings ────────────────────────────────────────────────────────────────

/// How to select, read and decode the rows of one relation.
struct Listing<R, T> {
  from:      &'static str,
  columns:   &'static str,
  /// Unique column appended to every `ORDER BY`.
  tie_break: &'static str,
  read:      fn(&rusqlite::Row<'_>) -> rusqlite::Result<R>,
  decode:    fn(R) -> Result<T>,
}

const PEOPLE: Listing<RawPerson, Person> = Listing {
  from:      PEOPLE_FROM,
  columns:   PERSON_COLUMNS,
  tie_break: "p.id",
  read:      RawPerson::from_row,
  decode:    RawPerson::into_person,
};

const STUDENTS: Listing<RawStudent, Student> = Listing {
  from:      STUDENTS_FROM,
  columns:   STUDENT_COLUMNS,
  tie_break: "s.person_id",
  read:      RawStudent::from_row,
  decode:    RawStudent::into_student,
};

// ─── Connection-level helpers ────────────────────────────────────────────────
//
// These run inside `Connection::call` closures, so they work on a plain
// `rusqlite::Connection` (or a transaction, which derefs to one).

fn select_person(
  conn: &rusqlite::Connection,
  column: &str,
  key: &str,
) -> rusqlite::Result<Option<RawPerson>> {
  conn
    .query_row(
      &format!("SELECT {PERSON_COLUMNS} FROM {PEOPLE_FROM} WHERE {column} = ?1"),
      rusqlite::params![key],
      RawPerson::from_row,
    )
    .optional()
}

fn select_student(
  conn: &rusqlite::Connection,
  column: &str,
  key: &str,
) -> rusqlite::Result<Option<RawStudent>> {
  conn
    .query_row(
      &format!("SELECT {STUDENT_COLUMNS} FROM {STUDENTS_FROM} WHERE {column} = ?1"),
      rusqlite::params![key],
      RawStudent::from_row,
    )
    .optional()
}

/// Owned column values for an `INSERT INTO people`.
struct PersonRow {
  id:            String,
  full_name:     String,
  dob:           Option<String>,
  phone:         Option<String>,
  contact_email: Option<String>,
  address:       Option<String>,
}

impl PersonRow {
  fn new(id: Uuid, input: NewPerson) -> Self {
    Self {
      id:            encode_uuid(id),
      full_name:     input.full_name,
      dob:           input.dob.map(encode_date),
      phone:         input.phone,
      contact_email: input.contact_email,
      address:       input.address,
    }
  }

  fn insert(&self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO people (id, full_name, dob, phone, contact_email, address)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      rusqlite::params![
        self.id,
        self.full_name,
        self.dob,
        self.phone,
        self.contact_email,
        self.address,
      ],
    )?;
    Ok(())
  }
}

fn insert_student_row(
  conn: &rusqlite::Connection,
  person_id: &str,
  input: &NewStudent,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO students (person_id, student_code, enrollment_year) VALUES (?1, ?2, ?3)",
    rusqlite::params![person_id, input.student_code, input.enrollment_year],
  )?;
  Ok(())
}

// ─── RosterStore impl ────────────────────────────────────────────────────────

impl RosterStore for SqliteStore {
  type Error = Error;

  // ── People ────────────────────────────────────────────────────────────────

  async fn insert_person(&self, input: NewPerson) -> Result<Person> {
    let id = Uuid::new_v4();
    let row = PersonRow::new(id, input);

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        row.insert(conn)?;
        Ok(select_person(conn, "p.id", &row.id)?)
      })
      .await?;

    raw.ok_or(Error::PersonNotFound(id))?.into_person()
  }

  async fn get_person(&self, id: Uuid) -> Result<Option<Person>> {
    self.person_where("p.id", encode_uuid(id)).await
  }

  async fn find_person_by_phone(&self, phone: String) -> Result<Option<Person>> {
    self.person_where("p.phone", phone).await
  }

  async fn phone_exists(&self, phone: String) -> Result<bool> {
    self.exists("SELECT 1 FROM people WHERE phone = ?1", phone).await
  }

  async fn update_person(&self, person: Person) -> Result<Person> {
    let id = person.id;
    let id_str = encode_uuid(id);
    let dob_str = person.dob.map(encode_date);

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        let updated = conn.execute(
          &format!(
            "UPDATE people
             SET full_name = ?1, dob = ?2, phone = ?3, contact_email = ?4, address = ?5,
                 updated_at = {NOW}
             WHERE id = ?6"
          ),
          rusqlite::params![
            person.full_name,
            dob_str,
            person.phone,
            person.contact_email,
            person.address,
            id_str,
          ],
        )?;
        if updated == 0 {
          return Ok(None);
        }
        Ok(select_person(conn, "p.id", &id_str)?)
      })
      .await?;

    raw.ok_or(Error::PersonNotFound(id))?.into_person()
  }

  async fn delete_person(&self, id: Uuid) -> Result<bool> {
    self.delete_where("DELETE FROM people WHERE id = ?1", id).await
  }

  async fn search_people(
    &self,
    filter: &Filter<PersonField>,
    page: &PageRequest<PersonSort>,
  ) -> Result<Page<Person>> {
    self.page(&PEOPLE, render_filter(filter), page).await
  }

  async fn people_by_ids(
    &self,
    mut ids: Vec<Uuid>,
    page: &PageRequest<PersonSort>,
  ) -> Result<Page<Person>> {
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
      return Ok(Page::empty(page));
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let filter = Where {
      sql:    format!("WHERE p.id IN ({placeholders})"),
      params: ids
        .into_iter()
        .map(|id| rusqlite::types::Value::Text(encode_uuid(id)))
        .collect(),
    };

    self.page(&PEOPLE, filter, page).await
  }

  // ── Students ──────────────────────────────────────────────────────────────

  async fn insert_student(&self, person_id: Uuid, input: NewStudent) -> Result<Student> {
    let id_str = encode_uuid(person_id);

    let raw: Option<RawStudent> = self
      .conn
      .call(move |conn| {
        insert_student_row(conn, &id_str, &input)?;
        Ok(select_student(conn, "s.person_id", &id_str)?)
      })
      .await?;

    raw.ok_or(Error::StudentNotFound(person_id))?.into_student()
  }

  async fn insert_person_with_student(
    &self,
    person: NewPerson,
    student: NewStudent,
  ) -> Result<Student> {
    let id = Uuid::new_v4();
    let row = PersonRow::new(id, person);

    let raw: Option<RawStudent> = self
      .conn
      .call(move |conn| {
        // Dropping the transaction without commit rolls back the person row
        // if the student insert fails.
        let tx = conn.transaction()?;
        row.insert(&tx)?;
        insert_student_row(&tx, &row.id, &student)?;
        tx.commit()?;
        Ok(select_student(conn, "s.person_id", &row.id)?)
      })
      .await?;

    raw.ok_or(Error::StudentNotFound(id))?.into_student()
  }

  async fn get_student(&self, id: Uuid) -> Result<Option<Student>> {
    self.student_where("s.person_id", encode_uuid(id)).await
  }

  async fn student_exists(&self, id: Uuid) -> Result<bool> {
    self
      .exists("SELECT 1 FROM students WHERE person_id = ?1", encode_uuid(id))
      .await
  }

  async fn student_code_exists(&self, code: String) -> Result<bool> {
    self.exists("SELECT 1 FROM students WHERE student_code = ?1", code).await
  }

  async fn find_student_by_code(&self, code: String) -> Result<Option<Student>> {
    self.student_where("s.student_code", code).await
  }

  async fn find_student_by_phone(&self, phone: String) -> Result<Option<Student>> {
    self.student_where("p.phone", phone).await
  }

  async fn update_student(&self, student: Student) -> Result<Student> {
    let id = student.id;
    let id_str = encode_uuid(id);

    let raw: Option<RawStudent> = self
      .conn
      .call(move |conn| {
        let updated = conn.execute(
          &format!(
            "UPDATE students
             SET student_code = ?1, enrollment_year = ?2, updated_at = {NOW}
             WHERE person_id = ?3"
          ),
          rusqlite::params![student.student_code, student.enrollment_year, id_str],
        )?;
        if updated == 0 {
          return Ok(None);
        }
        Ok(select_student(conn, "s.person_id", &id_str)?)
      })
      .await?;

    raw.ok_or(Error::StudentNotFound(id))?.into_student()
  }

  async fn delete_student(&self, id: Uuid) -> Result<bool> {
    self.delete_where("DELETE FROM students WHERE person_id = ?1", id).await
  }

  async fn search_students(
    &self,
    filter: &Filter<StudentField>,
    page: &PageRequest<StudentSort>,
  ) -> Result<Page<Student>> {
    self.page(&STUDENTS, render_filter(filter), page).await
  }

  async fn count_by_enrollment_year(&self) -> Result<Vec<EnrollmentStat>> {
    let rows: Vec<(Option<i32>, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT enrollment_year, COUNT(*)
           FROM students
           GROUP BY enrollment_year
           ORDER BY enrollment_year ASC",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(enrollment_year, total)| EnrollmentStat {
          enrollment_year,
          total: u64::try_from(total).unwrap_or(0),
        })
        .collect(),
    )
  }
}
