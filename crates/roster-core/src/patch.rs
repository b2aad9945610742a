//! Three-state field for partial updates.
//!
//! A JSON patch body has to tell apart "field missing" (leave the stored value
//! alone), `"field": null` (clear it) and `"field": value` (replace it). A
//! plain `Option<T>` collapses the first two, so patch DTOs use [`Patch<T>`]
//! together with `#[serde(default)]`:
//!
//! ```rust
//! use roster_core::Patch;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Body {
//!   #[serde(default)]
//!   nickname: Patch<String>,
//! }
//!
//! let b: Body = serde_json::from_str("{}").unwrap();
//! assert!(b.nickname.is_unset());
//! let b: Body = serde_json::from_str(r#"{"nickname":null}"#).unwrap();
//! assert!(b.nickname.is_clear());
//! ```

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
  /// The field was not present; keep the stored value.
  #[default]
  Unset,
  /// The field was present and `null`; clear the stored value.
  Clear,
  /// The field carried a value.
  Set(T),
}

impl<T> Patch<T> {
  pub fn is_unset(&self) -> bool { matches!(self, Self::Unset) }

  pub fn is_clear(&self) -> bool { matches!(self, Self::Clear) }

  /// `None` for [`Patch::Unset`], otherwise the value the field should take.
  pub fn into_change(self) -> Option<Option<T>> {
    match self {
      Self::Unset => None,
      Self::Clear => Some(None),
      Self::Set(v) => Some(Some(v)),
    }
  }
}

impl<T> From<Option<T>> for Patch<T> {
  /// A present field: `None` clears, `Some` sets.
  fn from(value: Option<T>) -> Self {
    match value {
      Some(v) => Self::Set(v),
      None => Self::Clear,
    }
  }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
  /// Only called when the field is present; absence is handled by
  /// `#[serde(default)]` on the containing struct.
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    Option::<T>::deserialize(deserializer).map(Self::from)
  }
}
