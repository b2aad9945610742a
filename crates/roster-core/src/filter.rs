//! Composable search predicates.
//!
//! A [`Filter`] is a conjunction of [`Clause`]s over the fields `F` of one
//! relation. Clause factories return `Option<Clause<F>>`; `None` means "no
//! constraint" and is the identity element of [`Filter::and`], so optional
//! search parameters can be chained without branching. An empty filter
//! matches every row.
//!
//! Filters describe *which* rows match and nothing else. Ordering and paging
//! live in [`crate::page`], and backends render filters into their own query
//! language (see `roster-store-sqlite`).

use chrono::NaiveDate;

// ─── Values ──────────────────────────────────────────────────────────────────

/// A literal operand of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
  Text(String),
  Date(NaiveDate),
  Int(i64),
}

/// The comparison a clause applies to its field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
  /// Case-insensitive substring match. The needle is already trimmed and
  /// lower-cased; backends wrap it in wildcards on both ends.
  Contains(String),
  Equals(Value),
  AtLeast(Value),
  AtMost(Value),
}

// ─── Clauses ─────────────────────────────────────────────────────────────────

/// One atomic constraint: `field <condition>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause<F> {
  pub field:     F,
  pub condition: Condition,
}

impl<F> Clause<F> {
  /// Re-target the clause onto another relation, e.g. a person clause onto
  /// the person side of a student/person join.
  pub fn map_field<G>(self, f: impl FnOnce(F) -> G) -> Clause<G> {
    Clause { field: f(self.field), condition: self.condition }
  }
}

/// `field` contains `needle`, ignoring case. Blank needles yield no
/// constraint.
pub fn contains<F>(field: F, needle: Option<&str>) -> Option<Clause<F>> {
  let needle = needle?.trim();
  if needle.is_empty() {
    return None;
  }
  Some(Clause { field, condition: Condition::Contains(needle.to_lowercase()) })
}

/// `field` equals `text` exactly. Blank text yields no constraint.
pub fn text_equals<F>(field: F, text: Option<&str>) -> Option<Clause<F>> {
  let text = text?;
  if text.trim().is_empty() {
    return None;
  }
  Some(Clause { field, condition: Condition::Equals(Value::Text(text.to_owned())) })
}

/// `field >= value`.
pub fn at_least<F>(field: F, value: Option<Value>) -> Option<Clause<F>> {
  Some(Clause { field, condition: Condition::AtLeast(value?) })
}

/// `field <= value`.
pub fn at_most<F>(field: F, value: Option<Value>) -> Option<Clause<F>> {
  Some(Clause { field, condition: Condition::AtMost(value?) })
}

/// `field = value`.
pub fn equals<F>(field: F, value: Option<Value>) -> Option<Clause<F>> {
  Some(Clause { field, condition: Condition::Equals(value?) })
}

// ─── Filter ──────────────────────────────────────────────────────────────────

/// A conjunction of clauses. See the module docs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter<F> {
  clauses: Vec<Clause<F>>,
}

impl<F> Default for Filter<F> {
  fn default() -> Self { Self::unrestricted() }
}

impl<F> Filter<F> {
  /// The filter that matches everything.
  pub fn unrestricted() -> Self { Self { clauses: Vec::new() } }

  /// Add `clause` to the conjunction; `None` leaves the filter unchanged.
  pub fn and(mut self, clause: Option<Clause<F>>) -> Self {
    self.clauses.extend(clause);
    self
  }

  pub fn is_unrestricted(&self) -> bool { self.clauses.is_empty() }

  pub fn clauses(&self) -> &[Clause<F>] { &self.clauses }
}

impl<F> FromIterator<Option<Clause<F>>> for Filter<F> {
  fn from_iter<I: IntoIterator<Item = Option<Clause<F>>>>(iter: I) -> Self {
    iter.into_iter().fold(Self::unrestricted(), Self::and)
  }
}
