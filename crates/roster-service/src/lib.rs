//! Record services for people and students.
//!
//! Each service is generic over a [`RosterStore`] and turns raw client
//! requests into store calls: normalise, validate, pre-check uniqueness,
//! commit, then map the stored entity to a response DTO. No state is kept
//! between calls.
//!
//! Every write re-reads the committed row, so responses always carry the
//! store-assigned id and timestamps.

pub mod merge;
pub mod paging;
pub mod person;
pub mod student;

use roster_core::{Error, Result, store::RosterStore};

pub use paging::PageParams;
pub use person::PersonService;
pub use student::StudentService;

/// Convert a failed commit into a core error.
///
/// A conflict here means another writer got in between our pre-check and the
/// commit.
fn commit_error<S: RosterStore>(err: S::Error) -> Error {
  let err = Error::store(err);
  if let Error::Conflict(message) = &err {
    tracing::warn!(%message, "constraint violated at commit");
  }
  err
}

/// Fail with a conflict if another person already holds `phone`.
async fn ensure_phone_free<S: RosterStore>(store: &S, phone: &str) -> Result<()> {
  let taken = store
    .phone_exists(phone.to_owned())
    .await
    .map_err(Error::store)?;
  if taken {
    return Err(Error::Conflict(format!("Phone {phone} already exists")));
  }
  Ok(())
}
