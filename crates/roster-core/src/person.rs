//! Person: the owner record every student hangs off.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::filter::{self, Clause, Value};

pub const FULL_NAME_MAX_LEN: usize = 150;
pub const PHONE_MAX_LEN: usize = 20;
pub const EMAIL_MAX_LEN: usize = 254;
pub const ADDRESS_MAX_LEN: usize = 255;

/// Age at which [`Person::is_adult`] turns true.
pub const ADULT_AGE: u32 = 18;

// ─── Entity ──────────────────────────────────────────────────────────────────

/// A stored person. `id`, `created_at` and `updated_at` are assigned by the
/// store and never accepted from clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub id:            Uuid,
  pub full_name:     String,
  pub dob:           Option<NaiveDate>,
  /// Normalised; unique across all people when present.
  pub phone:         Option<String>,
  /// Normalised to lower case.
  pub contact_email: Option<String>,
  pub address:       Option<String>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl Person {
  /// Whether the person is at least [`ADULT_AGE`] years old today.
  pub fn is_adult(&self) -> bool { is_adult_on(self.dob, Local::now().date_naive()) }
}

/// Whether someone born on `dob` is an adult on `today`. An unknown or
/// future date of birth is never adult.
pub fn is_adult_on(dob: Option<NaiveDate>, today: NaiveDate) -> bool {
  dob
    .and_then(|dob| today.years_since(dob))
    .is_some_and(|age| age >= ADULT_AGE)
}

/// Input to [`crate::store::RosterStore::insert_person`]. All strings are
/// already normalised and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
  pub full_name:     String,
  pub dob:           Option<NaiveDate>,
  pub phone:         Option<String>,
  pub contact_email: Option<String>,
  pub address:       Option<String>,
}

// ─── Query fields ────────────────────────────────────────────────────────────

/// Columns of a person that search clauses can constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonField {
  FullName,
  Dob,
  Phone,
  ContactEmail,
  Address,
}

/// Columns a person listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum PersonSort {
  CreatedAt,
  UpdatedAt,
  FullName,
  Dob,
  Phone,
  ContactEmail,
}

// ─── Clause factories ────────────────────────────────────────────────────────
//
// Each takes an already-normalised value and returns `None` when there is
// nothing to constrain.

pub fn full_name_contains(keyword: Option<&str>) -> Option<Clause<PersonField>> {
  filter::contains(PersonField::FullName, keyword)
}

pub fn phone_equals(phone: Option<&str>) -> Option<Clause<PersonField>> {
  filter::text_equals(PersonField::Phone, phone)
}

pub fn email_contains(email: Option<&str>) -> Option<Clause<PersonField>> {
  filter::contains(PersonField::ContactEmail, email)
}

pub fn address_contains(address: Option<&str>) -> Option<Clause<PersonField>> {
  filter::contains(PersonField::Address, address)
}

pub fn dob_from(from: Option<NaiveDate>) -> Option<Clause<PersonField>> {
  filter::at_least(PersonField::Dob, from.map(Value::Date))
}

pub fn dob_to(to: Option<NaiveDate>) -> Option<Clause<PersonField>> {
  filter::at_most(PersonField::Dob, to.map(Value::Date))
}
