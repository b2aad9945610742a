//! Rendering of [`Filter`]s and sort orders into parameterised SQL.
//!
//! Person columns are always addressed through the alias `p` and student
//! columns through `s`, so the same person clause works both on `people p`
//! and on `students s JOIN people p`.

use roster_core::{
  filter::{Condition, Filter, Value},
  page::{Direction, SortOrder},
  person::{PersonField, PersonSort},
  student::{StudentField, StudentSort},
};
use rusqlite::{
  Connection,
  functions::{Context, FunctionFlags},
  types::Value as SqlValue,
};

use crate::encode::encode_date;

// ─── Column mapping ──────────────────────────────────────────────────────────

/// A field that maps to a qualified SQL column.
pub trait Column: Copy {
  fn column(self) -> &'static str;
}

impl Column for PersonField {
  fn column(self) -> &'static str {
    match self {
      Self::FullName => "p.full_name",
      Self::Dob => "p.dob",
      Self::Phone => "p.phone",
      Self::ContactEmail => "p.contact_email",
      Self::Address => "p.address",
    }
  }
}

impl Column for StudentField {
  fn column(self) -> &'static str {
    match self {
      Self::StudentCode => "s.student_code",
      Self::EnrollmentYear => "s.enrollment_year",
      Self::Person(field) => field.column(),
    }
  }
}

impl Column for PersonSort {
  fn column(self) -> &'static str {
    match self {
      Self::CreatedAt => "p.created_at",
      Self::UpdatedAt => "p.updated_at",
      Self::FullName => "p.full_name",
      Self::Dob => "p.dob",
      Self::Phone => "p.phone",
      Self::ContactEmail => "p.contact_email",
    }
  }
}

impl Column for StudentSort {
  fn column(self) -> &'static str {
    match self {
      Self::CreatedAt => "s.created_at",
      Self::UpdatedAt => "s.updated_at",
      Self::StudentCode => "s.student_code",
      Self::EnrollmentYear => "s.enrollment_year",
      Self::PersonFullName => "p.full_name",
    }
  }
}

// ─── Case folding ────────────────────────────────────────────────────────────

/// SQL name of the Unicode lower-case fold used by contains clauses.
///
/// SQLite's built-in `lower()` only folds ASCII, which would never match a
/// needle folded with [`str::to_lowercase`].
pub const FOLD: &str = "roster_lower";

/// Register [`FOLD`] on `conn`. Must run on every connection before any
/// search.
pub fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
  conn.create_scalar_function(
    FOLD,
    1,
    FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
    fold,
  )
}

fn fold(ctx: &Context<'_>) -> rusqlite::Result<Option<String>> {
  let text: Option<String> = ctx.get(0)?;
  Ok(text.map(|t| t.to_lowercase()))
}

// ─── WHERE ───────────────────────────────────────────────────────────────────

/// A rendered `WHERE` clause (possibly empty) and its positional parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Where {
  pub sql:    String,
  pub params: Vec<SqlValue>,
}

/// Render `filter` as `WHERE a AND b ...`; an unrestricted filter renders to
/// an empty string.
pub fn render_filter<F: Column>(filter: &Filter<F>) -> Where {
  let mut params = Vec::with_capacity(filter.clauses().len());
  let terms: Vec<String> = filter
    .clauses()
    .iter()
    .map(|clause| {
      let column = clause.field.column();
      match &clause.condition {
        Condition::Contains(needle) => {
          params.push(SqlValue::Text(like_pattern(needle)));
          format!("{FOLD}({column}) LIKE ? ESCAPE '\\'")
        }
        Condition::Equals(value) => {
          params.push(sql_value(value));
          format!("{column} = ?")
        }
        Condition::AtLeast(value) => {
          params.push(sql_value(value));
          format!("{column} >= ?")
        }
        Condition::AtMost(value) => {
          params.push(sql_value(value));
          format!("{column} <= ?")
        }
      }
    })
    .collect();

  let sql = if terms.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", terms.join(" AND "))
  };
  Where { sql, params }
}

/// `%needle%`, with LIKE metacharacters in the needle escaped.
pub fn like_pattern(needle: &str) -> String {
  let mut pattern = String::with_capacity(needle.len() + 2);
  pattern.push('%');
  for c in needle.chars() {
    if matches!(c, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

fn sql_value(value: &Value) -> SqlValue {
  match value {
    Value::Text(s) => SqlValue::Text(s.clone()),
    Value::Date(d) => SqlValue::Text(encode_date(*d)),
    Value::Int(i) => SqlValue::Integer(*i),
  }
}

// ─── ORDER BY ────────────────────────────────────────────────────────────────

/// Render `ORDER BY` terms, always ending with `tie_break` so the ordering is
/// total and pages never overlap.
pub fn render_order<F: Column>(sort: &[SortOrder<F>], tie_break: &str) -> String {
  let mut terms: Vec<String> = sort
    .iter()
    .map(|order| {
      let dir = match order.direction {
        Direction::Asc => "ASC",
        Direction::Desc => "DESC",
      };
      format!("{} {dir}", order.field.column())
    })
    .collect();
  terms.push(format!("{tie_break} ASC"));
  format!("ORDER BY {}", terms.join(", "))
}
