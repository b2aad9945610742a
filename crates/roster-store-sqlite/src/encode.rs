//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, dates as `YYYY-MM-DD` (so they
//! compare correctly as text) and UUIDs as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use roster_core::{person::Person, student::Student};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Dates ───────────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawPerson::from_row`], for `people p`.
pub const PERSON_COLUMNS: &str =
  "p.id, p.full_name, p.dob, p.phone, p.contact_email, p.address, p.created_at, p.updated_at";

/// Column list matching [`RawStudent::from_row`], for
/// `students s JOIN people p`.
pub const STUDENT_COLUMNS: &str = "p.id, p.full_name, p.dob, p.phone, p.contact_email, \
   p.address, p.created_at, p.updated_at, \
   s.student_code, s.enrollment_year, s.created_at, s.updated_at";

/// Raw strings read directly from a `people` row.
pub struct RawPerson {
  pub id:            String,
  pub full_name:     String,
  pub dob:           Option<String>,
  pub phone:         Option<String>,
  pub contact_email: Option<String>,
  pub address:       Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawPerson {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      full_name:     row.get(1)?,
      dob:           row.get(2)?,
      phone:         row.get(3)?,
      contact_email: row.get(4)?,
      address:       row.get(5)?,
      created_at:    row.get(6)?,
      updated_at:    row.get(7)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      id:            decode_uuid(&self.id)?,
      full_name:     self.full_name,
      dob:           self.dob.as_deref().map(decode_date).transpose()?,
      phone:         self.phone,
      contact_email: self.contact_email,
      address:       self.address,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read from a `students` row joined with its `people` row.
pub struct RawStudent {
  pub person:          RawPerson,
  pub student_code:    String,
  pub enrollment_year: Option<i32>,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawStudent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person:          RawPerson::from_row(row)?,
      student_code:    row.get(8)?,
      enrollment_year: row.get(9)?,
      created_at:      row.get(10)?,
      updated_at:      row.get(11)?,
    })
  }

  pub fn into_student(self) -> Result<Student> {
    let person = self.person.into_person()?;
    Ok(Student {
      id: person.id,
      person,
      student_code: self.student_code,
      enrollment_year: self.enrollment_year,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dates_roundtrip_as_sortable_text() {
    let d = NaiveDate::from_ymd_opt(2001, 2, 3).unwrap();
    assert_eq!(encode_date(d), "2001-02-03");
    assert_eq!(decode_date("2001-02-03").unwrap(), d);
  }

  #[test]
  fn sqlite_timestamps_parse() {
    let dt = decode_dt("2024-05-06T07:08:09.123Z").unwrap();
    assert_eq!(dt.timestamp_subsec_millis(), 123);
  }

  #[test]
  fn bad_uuid_is_an_error() {
    assert!(matches!(decode_uuid("nope"), Err(Error::Uuid(_))));
  }
}
