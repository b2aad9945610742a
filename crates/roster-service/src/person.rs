//! Person requests, responses and [`PersonService`].

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use roster_core::{
  Error, Patch, Result,
  filter::{Clause, Filter},
  normalize::{normalize_email, normalize_phone, trim_to_nullable},
  page::{Page, PageRequest, SortOrder},
  person::{
    self, ADDRESS_MAX_LEN, EMAIL_MAX_LEN, FULL_NAME_MAX_LEN, NewPerson, PHONE_MAX_LEN, Person,
    PersonField, PersonSort,
  },
  store::RosterStore,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{commit_error, ensure_phone_free, merge};

/// Newest first.
pub fn default_sort() -> Vec<SortOrder<PersonSort>> { vec![SortOrder::desc(PersonSort::CreatedAt)] }

// ─── Requests ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonCreateRequest {
  pub full_name:     Option<String>,
  pub dob:           Option<NaiveDate>,
  pub phone:         Option<String>,
  pub contact_email: Option<String>,
  pub address:       Option<String>,
}

impl PersonCreateRequest {
  /// Normalise and validate into a store input.
  pub(crate) fn validate(self) -> Result<NewPerson> {
    Ok(NewPerson {
      full_name:     merge::required(
        "fullName",
        self.full_name.as_deref(),
        trim_to_nullable,
        FULL_NAME_MAX_LEN,
      )?,
      dob:           self.dob,
      phone:         merge::optional(
        "phone",
        self.phone.as_deref(),
        normalize_phone,
        PHONE_MAX_LEN,
      )?,
      contact_email: merge::optional(
        "contactEmail",
        self.contact_email.as_deref(),
        normalize_email,
        EMAIL_MAX_LEN,
      )?,
      address:       merge::optional(
        "address",
        self.address.as_deref(),
        trim_to_nullable,
        ADDRESS_MAX_LEN,
      )?,
    })
  }
}

/// Partial update. Omit a field to leave it alone, send `null` to clear it.
/// `fullName` cannot be cleared.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonPatchRequest {
  pub full_name:     Patch<String>,
  pub dob:           Patch<NaiveDate>,
  pub phone:         Patch<String>,
  pub contact_email: Patch<String>,
  pub address:       Patch<String>,
}

impl PersonPatchRequest {
  /// Merge onto `person`. On error `person` may be partly merged and must be
  /// discarded.
  pub(crate) fn apply(self, person: &mut Person) -> Result<()> {
    merge::merge_required(
      "fullName",
      &mut person.full_name,
      self.full_name,
      trim_to_nullable,
      FULL_NAME_MAX_LEN,
    )?;
    merge::merge_value(&mut person.dob, self.dob);
    merge::merge_optional("phone", &mut person.phone, self.phone, normalize_phone, PHONE_MAX_LEN)?;
    merge::merge_optional(
      "contactEmail",
      &mut person.contact_email,
      self.contact_email,
      normalize_email,
      EMAIL_MAX_LEN,
    )?;
    merge::merge_optional(
      "address",
      &mut person.address,
      self.address,
      trim_to_nullable,
      ADDRESS_MAX_LEN,
    )?;
    Ok(())
  }
}

/// Search criteria. Every field is optional; absent or blank fields do not
/// constrain the result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSearchRequest {
  /// Substring of the full name.
  pub name:     Option<String>,
  /// Exact phone, in any formatting.
  pub phone:    Option<String>,
  /// Substring of the contact email.
  pub email:    Option<String>,
  /// Substring of the address.
  pub address:  Option<String>,
  pub dob_from: Option<NaiveDate>,
  pub dob_to:   Option<NaiveDate>,
}

impl PersonSearchRequest {
  /// One optional clause per criterion.
  pub(crate) fn clauses(&self) -> [Option<Clause<PersonField>>; 6] {
    let name = trim_to_nullable(self.name.as_deref());
    let phone = normalize_phone(self.phone.as_deref());
    let email = normalize_email(self.email.as_deref());
    let address = trim_to_nullable(self.address.as_deref());
    [
      person::full_name_contains(name.as_deref()),
      person::phone_equals(phone.as_deref()),
      person::email_contains(email.as_deref()),
      person::address_contains(address.as_deref()),
      person::dob_from(self.dob_from),
      person::dob_to(self.dob_to),
    ]
  }

  pub fn filter(&self) -> Filter<PersonField> { self.clauses().into_iter().collect() }
}

// ─── Responses ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDetail {
  pub id:            Uuid,
  pub full_name:     String,
  pub dob:           Option<NaiveDate>,
  pub phone:         Option<String>,
  pub contact_email: Option<String>,
  pub address:       Option<String>,
  pub is_adult:      bool,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl From<&Person> for PersonDetail {
  fn from(p: &Person) -> Self {
    Self {
      id:            p.id,
      full_name:     p.full_name.clone(),
      dob:           p.dob,
      phone:         p.phone.clone(),
      contact_email: p.contact_email.clone(),
      address:       p.address.clone(),
      is_adult:      p.is_adult(),
      created_at:    p.created_at,
      updated_at:    p.updated_at,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonListItem {
  pub id:            Uuid,
  pub full_name:     String,
  pub contact_email: Option<String>,
  pub is_adult:      bool,
}

impl From<&Person> for PersonListItem {
  fn from(p: &Person) -> Self {
    Self {
      id:            p.id,
      full_name:     p.full_name.clone(),
      contact_email: p.contact_email.clone(),
      is_adult:      p.is_adult(),
    }
  }
}

fn not_found(id: Uuid) -> Error { Error::NotFound(format!("Person not found with id: {id}")) }

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct PersonService<S> {
  store: Arc<S>,
}

impl<S> Clone for PersonService<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: RosterStore> PersonService<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub async fn list(&self, page: &PageRequest<PersonSort>) -> Result<Page<PersonListItem>> {
    self.search(&PersonSearchRequest::default(), page).await
  }

  pub async fn search(
    &self,
    criteria: &PersonSearchRequest,
    page: &PageRequest<PersonSort>,
  ) -> Result<Page<PersonListItem>> {
    let filter = criteria.filter();
    debug!(clauses = filter.clauses().len(), page = page.page, "searching people");
    let found = self
      .store
      .search_people(&filter, page)
      .await
      .map_err(Error::store)?;
    Ok(found.map(|p| PersonListItem::from(&p)))
  }

  /// A page of the people with the given ids. Unknown ids are skipped. An
  /// absent or empty id list yields an empty page without touching the store.
  pub async fn list_by_ids(
    &self,
    ids: Option<Vec<Uuid>>,
    page: &PageRequest<PersonSort>,
  ) -> Result<Page<PersonListItem>> {
    let ids = ids.unwrap_or_default();
    if ids.is_empty() {
      return Ok(Page::empty(page));
    }
    debug!(count = ids.len(), "listing people by id");
    let found = self.store.people_by_ids(ids, page).await.map_err(Error::store)?;
    Ok(found.map(|p| PersonListItem::from(&p)))
  }

  pub async fn get(&self, id: Uuid) -> Result<PersonDetail> {
    debug!(%id, "loading person");
    let person = self.load(id).await?;
    Ok(PersonDetail::from(&person))
  }

  pub async fn get_by_phone(&self, phone: &str) -> Result<PersonDetail> {
    let phone = normalize_phone(Some(phone))
      .ok_or_else(|| Error::Validation("phone is required".into()))?;
    debug!(%phone, "loading person by phone");
    let person = self
      .store
      .find_person_by_phone(phone.clone())
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::NotFound(format!("Person not found with phone: {phone}")))?;
    Ok(PersonDetail::from(&person))
  }

  pub async fn create(&self, request: PersonCreateRequest) -> Result<PersonDetail> {
    let input = request.validate()?;
    if let Some(phone) = &input.phone {
      ensure_phone_free(&*self.store, phone).await?;
    }

    let person = self
      .store
      .insert_person(input)
      .await
      .map_err(commit_error::<S>)?;
    info!(id = %person.id, "person created");
    Ok(PersonDetail::from(&person))
  }

  pub async fn patch(&self, id: Uuid, request: PersonPatchRequest) -> Result<PersonDetail> {
    let current = self.load(id).await?;
    let mut merged = current.clone();
    request.apply(&mut merged)?;

    let new_phone = merged.phone.as_deref().filter(|p| current.phone.as_deref() != Some(*p));
    if let Some(phone) = new_phone {
      ensure_phone_free(&*self.store, phone).await?;
    }

    let person = self
      .store
      .update_person(merged)
      .await
      .map_err(commit_error::<S>)?;
    info!(%id, "person patched");
    Ok(PersonDetail::from(&person))
  }

  /// Delete a person. Their student record, if any, goes with them.
  pub async fn delete(&self, id: Uuid) -> Result<()> {
    let deleted = self.store.delete_person(id).await.map_err(Error::store)?;
    if !deleted {
      return Err(not_found(id));
    }
    info!(%id, "person deleted");
    Ok(())
  }

  async fn load(&self, id: Uuid) -> Result<Person> {
    self
      .store
      .get_person(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| not_found(id))
  }
}
