//! Field-level validation and tri-state patch merging.
//!
//! Create requests go through [`required`] and [`optional`]; patch requests
//! go through the `merge_*` functions, which apply one [`Patch`] field onto
//! the loaded entity in place:
//!
//! | Patch          | Required field     | Optional field |
//! |----------------|--------------------|----------------|
//! | `Unset`        | unchanged          | unchanged      |
//! | `Clear`        | `Validation` error | cleared        |
//! | `Set(raw)`     | normalised, must not be blank | normalised, blank clears |
//!
//! Uniqueness is not checked here. Callers compare the merged entity with the
//! stored one and pre-check only the unique fields that actually changed.

use roster_core::{Error, Patch, Result};

/// A normaliser from [`roster_core::normalize`].
pub type Normalize = fn(Option<&str>) -> Option<String>;

fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
  if value.chars().count() > max {
    return Err(Error::Validation(format!("{field} must be at most {max} characters")));
  }
  Ok(())
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// Normalise a field that must be present and non-blank.
pub fn required(field: &str, raw: Option<&str>, normalize: Normalize, max: usize) -> Result<String> {
  let value = normalize(raw).ok_or_else(|| Error::Validation(format!("{field} is required")))?;
  check_len(field, &value, max)?;
  Ok(value)
}

/// Normalise an optional field; blank input becomes `None`.
pub fn optional(
  field: &str,
  raw: Option<&str>,
  normalize: Normalize,
  max: usize,
) -> Result<Option<String>> {
  let value = normalize(raw);
  if let Some(v) = &value {
    check_len(field, v, max)?;
  }
  Ok(value)
}

// ─── Patch ───────────────────────────────────────────────────────────────────

/// Merge a patch onto a field that can never be cleared.
pub fn merge_required(
  field: &str,
  current: &mut String,
  patch: Patch<String>,
  normalize: Normalize,
  max: usize,
) -> Result<()> {
  match patch {
    Patch::Unset => Ok(()),
    Patch::Clear => Err(Error::Validation(format!("{field} cannot be null"))),
    Patch::Set(raw) => {
      *current = required(field, Some(&raw), normalize, max)?;
      Ok(())
    }
  }
}

/// Merge a patch onto an optional text field.
pub fn merge_optional(
  field: &str,
  current: &mut Option<String>,
  patch: Patch<String>,
  normalize: Normalize,
  max: usize,
) -> Result<()> {
  match patch {
    Patch::Unset => Ok(()),
    Patch::Clear => {
      *current = None;
      Ok(())
    }
    Patch::Set(raw) => {
      *current = optional(field, Some(&raw), normalize, max)?;
      Ok(())
    }
  }
}

/// Merge a patch onto an optional non-text field. Values are taken as-is.
pub fn merge_value<T>(current: &mut Option<T>, patch: Patch<T>) {
  if let Some(change) = patch.into_change() {
    *current = change;
  }
}
