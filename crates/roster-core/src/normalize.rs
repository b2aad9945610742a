//! Canonicalisation of raw client strings.
//!
//! Every function is total and idempotent: feeding the output back in yields
//! the same output. Blank input (absent, empty, or whitespace only) always
//! normalises to `None`.

/// Strip surrounding whitespace; blank input becomes `None`.
pub fn trim_to_nullable(s: Option<&str>) -> Option<String> {
  let trimmed = s?.trim();
  if trimmed.is_empty() {
    None
  } else {
    Some(trimmed.to_owned())
  }
}

/// Trim, then lower-case.
pub fn normalize_email(s: Option<&str>) -> Option<String> {
  trim_to_nullable(s).map(|v| v.to_lowercase())
}

/// Trim, then drop whitespace, `.` and `-` separators. Input made only of
/// separators normalises to `None`.
pub fn normalize_phone(s: Option<&str>) -> Option<String> {
  let digits: String = trim_to_nullable(s)?
    .chars()
    .filter(|c| !c.is_whitespace() && *c != '.' && *c != '-')
    .collect();
  if digits.is_empty() { None } else { Some(digits) }
}

/// Trim, then upper-case.
pub fn normalize_code(s: Option<&str>) -> Option<String> {
  trim_to_nullable(s).map(|v| v.to_uppercase())
}
