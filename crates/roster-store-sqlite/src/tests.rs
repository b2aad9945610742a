//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use roster_core::{
  filter::Filter,
  page::{PageRequest, SortOrder},
  person::{self, NewPerson, PersonSort},
  store::RosterStore,
  student::{self, NewStudent, StudentSort},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_person(name: &str, phone: Option<&str>) -> NewPerson {
  NewPerson {
    full_name:     name.into(),
    dob:           None,
    phone:         phone.map(Into::into),
    contact_email: None,
    address:       None,
  }
}

fn new_student(code: &str, year: Option<i32>) -> NewStudent {
  NewStudent { student_code: code.into(), enrollment_year: year }
}

fn by_name() -> PageRequest<PersonSort> {
  PageRequest::new(None, Some(100), vec![SortOrder::asc(PersonSort::FullName)], Vec::new)
}

fn students_by_code() -> PageRequest<StudentSort> {
  PageRequest::new(None, Some(100), vec![SortOrder::asc(StudentSort::StudentCode)], Vec::new)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

fn is_conflict(err: Error) -> bool {
  matches!(roster_core::Error::from(err), roster_core::Error::Conflict(_))
}

// ─── People ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_person() {
  let s = store().await;

  let mut input = new_person("Jane Doe", Some("090123456"));
  input.dob = Some(date(1990, 4, 1));
  input.contact_email = Some("jane@example.com".into());

  let person = s.insert_person(input).await.unwrap();
  assert_eq!(person.full_name, "Jane Doe");
  assert_eq!(person.dob, Some(date(1990, 4, 1)));
  assert!(person.updated_at >= person.created_at);

  let fetched = s.get_person(person.id).await.unwrap().unwrap();
  assert_eq!(fetched, person);
}

#[tokio::test]
async fn get_person_missing_returns_none() {
  let s = store().await;
  assert!(s.get_person(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_phone_is_rejected_by_the_store() {
  let s = store().await;
  s.insert_person(new_person("A", Some("0900000000"))).await.unwrap();

  let err = s
    .insert_person(new_person("B", Some("0900000000")))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Constraint(_)), "{err:?}");
  assert!(is_conflict(err));

  let all = s.search_people(&Filter::unrestricted(), &by_name()).await.unwrap();
  assert_eq!(all.total_items, 1);
}

#[tokio::test]
async fn people_without_phone_never_collide() {
  let s = store().await;
  s.insert_person(new_person("A", None)).await.unwrap();
  s.insert_person(new_person("B", None)).await.unwrap();
  assert!(!s.phone_exists("".into()).await.unwrap());
}

#[tokio::test]
async fn phone_lookups() {
  let s = store().await;
  let p = s.insert_person(new_person("A", Some("0911"))).await.unwrap();

  assert!(s.phone_exists("0911".into()).await.unwrap());
  assert!(!s.phone_exists("0912".into()).await.unwrap());
  assert_eq!(s.find_person_by_phone("0911".into()).await.unwrap().unwrap().id, p.id);
}

#[tokio::test]
async fn update_person_overwrites_columns() {
  let s = store().await;
  let mut p = s.insert_person(new_person("Old", Some("0911"))).await.unwrap();

  p.full_name = "New".into();
  p.phone = None;
  p.address = Some("1 Main St".into());
  let updated = s.update_person(p.clone()).await.unwrap();

  assert_eq!(updated.full_name, "New");
  assert_eq!(updated.phone, None);
  assert_eq!(updated.address.as_deref(), Some("1 Main St"));
  assert_eq!(updated.created_at, p.created_at);
  assert!(updated.updated_at >= p.updated_at);
}

#[tokio::test]
async fn update_person_to_taken_phone_conflicts() {
  let s = store().await;
  s.insert_person(new_person("A", Some("0911"))).await.unwrap();
  let mut b = s.insert_person(new_person("B", Some("0922"))).await.unwrap();

  b.phone = Some("0911".into());
  let err = s.update_person(b.clone()).await.unwrap_err();
  assert!(is_conflict(err));

  let stored = s.get_person(b.id).await.unwrap().unwrap();
  assert_eq!(stored.phone.as_deref(), Some("0922"));
}

#[tokio::test]
async fn update_missing_person_is_not_found() {
  let s = store().await;
  let mut p = s.insert_person(new_person("A", None)).await.unwrap();
  s.delete_person(p.id).await.unwrap();

  p.full_name = "B".into();
  let err = s.update_person(p.clone()).await.unwrap_err();
  assert!(matches!(err, Error::PersonNotFound(id) if id == p.id));
}

#[tokio::test]
async fn delete_person_cascades_to_student() {
  let s = store().await;
  let st = s
    .insert_person_with_student(new_person("A", None), new_student("S1", None))
    .await
    .unwrap();

  assert!(s.delete_person(st.id).await.unwrap());
  assert!(!s.delete_person(st.id).await.unwrap());
  assert!(s.get_student(st.id).await.unwrap().is_none());
}

// ─── Search ──────────────────────────────────────────────────────────────────

async fn seed_people(s: &SqliteStore) {
  let rows = [
    ("Alice Nguyen", Some("0901"), Some(date(1990, 1, 1)), Some("alice@uni.edu"), Some("Hanoi")),
    ("Bob Tran", Some("0902"), Some(date(2010, 5, 5)), None, Some("Da Nang")),
    ("alina Le", None, None, Some("alina@mail.com"), None),
    ("Chris 100% Pham", Some("0904"), Some(date(2000, 12, 31)), None, Some("Hue")),
  ];
  for (name, phone, dob, email, address) in rows {
    s.insert_person(NewPerson {
      full_name:     name.into(),
      dob,
      phone:         phone.map(Into::into),
      contact_email: email.map(Into::into),
      address:       address.map(Into::into),
    })
    .await
    .unwrap();
  }
}

fn names<T>(page: &roster_core::page::Page<T>, name: impl Fn(&T) -> &str) -> Vec<String> {
  page.items.iter().map(|p| name(p).to_owned()).collect()
}

#[tokio::test]
async fn unrestricted_search_returns_everyone() {
  let s = store().await;
  seed_people(&s).await;

  let filter = Filter::unrestricted()
    .and(person::full_name_contains(None))
    .and(person::phone_equals(Some("  ")))
    .and(person::dob_from(None));
  let page = s.search_people(&filter, &by_name()).await.unwrap();
  assert_eq!(page.total_items, 4);
  assert_eq!(page.items.len(), 4);
}

#[tokio::test]
async fn name_search_is_case_insensitive_substring() {
  let s = store().await;
  seed_people(&s).await;

  let filter = Filter::unrestricted().and(person::full_name_contains(Some("ALI")));
  let page = s.search_people(&filter, &by_name()).await.unwrap();
  assert_eq!(names(&page, |p| p.full_name.as_str()), ["Alice Nguyen", "alina Le"]);
}

#[tokio::test]
async fn contains_search_folds_non_ascii_case() {
  let s = store().await;
  s.insert_person_with_student(new_person("Đặng Élise", None), new_student("ÄBC1", None))
    .await
    .unwrap();
  s.insert_person(new_person("Dang Elise", None)).await.unwrap();

  for needle in ["Đặng", "đẶNG", "Élise"] {
    let filter = Filter::unrestricted().and(person::full_name_contains(Some(needle)));
    let page = s.search_people(&filter, &by_name()).await.unwrap();
    assert_eq!(names(&page, |p| p.full_name.as_str()), ["Đặng Élise"], "needle {needle:?}");
  }

  for needle in ["ÄBC1", "äbc"] {
    let filter = Filter::unrestricted().and(student::student_code_contains(Some(needle)));
    let page = s.search_students(&filter, &students_by_code()).await.unwrap();
    assert_eq!(names(&page, |st| st.student_code.as_str()), ["ÄBC1"], "needle {needle:?}");
  }
}

#[tokio::test]
async fn like_wildcards_in_input_are_literal() {
  let s = store().await;
  seed_people(&s).await;

  let filter = Filter::unrestricted().and(person::full_name_contains(Some("%")));
  let page = s.search_people(&filter, &by_name()).await.unwrap();
  assert_eq!(names(&page, |p| p.full_name.as_str()), ["Chris 100% Pham"]);
}

#[tokio::test]
async fn criteria_combine_with_and() {
  let s = store().await;
  seed_people(&s).await;

  let filter = Filter::unrestricted()
    .and(person::dob_from(Some(date(1995, 1, 1))))
    .and(person::dob_to(Some(date(2005, 1, 1))));
  let page = s.search_people(&filter, &by_name()).await.unwrap();
  assert_eq!(names(&page, |p| p.full_name.as_str()), ["Chris 100% Pham"]);

  let filter = Filter::unrestricted()
    .and(person::address_contains(Some("a")))
    .and(person::phone_equals(Some("0902")));
  let page = s.search_people(&filter, &by_name()).await.unwrap();
  assert_eq!(names(&page, |p| p.full_name.as_str()), ["Bob Tran"]);
}

#[tokio::test]
async fn pagination_slices_and_counts() {
  let s = store().await;
  seed_people(&s).await;

  let request = PageRequest::new(Some(1), Some(3), vec![SortOrder::asc(PersonSort::FullName)], Vec::new);
  let page = s.search_people(&Filter::unrestricted(), &request).await.unwrap();
  assert_eq!(page.total_items, 4);
  assert_eq!(page.total_pages, 2);
  assert_eq!(page.page, 1);
  assert_eq!(names(&page, |p| p.full_name.as_str()), ["alina Le"]);

  let desc = PageRequest::new(None, Some(1), vec![SortOrder::desc(PersonSort::FullName)], Vec::new);
  let page = s.search_people(&Filter::unrestricted(), &desc).await.unwrap();
  assert_eq!(names(&page, |p| p.full_name.as_str()), ["alina Le"]);
}

#[tokio::test]
async fn people_by_ids_dedups_and_ignores_unknown_ids() {
  let s = store().await;
  let a = s.insert_person(new_person("A", None)).await.unwrap();
  let b = s.insert_person(new_person("B", None)).await.unwrap();
  s.insert_person(new_person("C", None)).await.unwrap();

  let page = s
    .people_by_ids(vec![a.id, b.id, a.id, Uuid::new_v4()], &by_name())
    .await
    .unwrap();
  assert_eq!(page.total_items, 2);
  assert_eq!(names(&page, |p| p.full_name.as_str()), ["A", "B"]);

  let empty = s.people_by_ids(vec![], &by_name()).await.unwrap();
  assert_eq!(empty.total_items, 0);
  assert!(empty.items.is_empty());
}

// ─── Students ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn composite_insert_shares_identity() {
  let s = store().await;
  let st = s
    .insert_person_with_student(new_person("Ann", None), new_student("ABC123", Some(2024)))
    .await
    .unwrap();

  assert_eq!(st.id, st.person.id);
  assert_eq!(st.student_code, "ABC123");
  assert_eq!(s.get_person(st.id).await.unwrap().unwrap(), st.person);
  assert_eq!(s.get_student(st.id).await.unwrap().unwrap(), st);
}

#[tokio::test]
async fn composite_insert_rolls_back_person_on_student_conflict() {
  let s = store().await;
  s.insert_person_with_student(new_person("First", None), new_student("DUP", None))
    .await
    .unwrap();

  let err = s
    .insert_person_with_student(new_person("Second", Some("0999")), new_student("DUP", None))
    .await
    .unwrap_err();
  assert!(is_conflict(err));

  let people = s.search_people(&Filter::unrestricted(), &by_name()).await.unwrap();
  assert_eq!(names(&people, |p| p.full_name.as_str()), ["First"]);
  assert!(!s.phone_exists("0999".into()).await.unwrap());
}

#[tokio::test]
async fn second_student_for_same_person_conflicts() {
  let s = store().await;
  let p = s.insert_person(new_person("A", None)).await.unwrap();

  let first = s.insert_student(p.id, new_student("S1", None)).await.unwrap();
  let err = s.insert_student(p.id, new_student("S2", None)).await.unwrap_err();
  assert!(matches!(&err, Error::Constraint(m) if m.contains("students.person_id")), "{err:?}");

  assert_eq!(s.get_student(p.id).await.unwrap().unwrap(), first);
}

#[tokio::test]
async fn student_for_missing_person_conflicts() {
  let s = store().await;
  let err = s.insert_student(Uuid::new_v4(), new_student("S1", None)).await.unwrap_err();
  assert!(matches!(err, Error::Constraint(_)), "{err:?}");
}

#[tokio::test]
async fn student_lookups() {
  let s = store().await;
  let st = s
    .insert_person_with_student(new_person("A", Some("0911")), new_student("S1", None))
    .await
    .unwrap();

  assert!(s.student_exists(st.id).await.unwrap());
  assert!(s.student_code_exists("S1".into()).await.unwrap());
  assert!(!s.student_code_exists("s1".into()).await.unwrap());
  assert_eq!(s.find_student_by_code("S1".into()).await.unwrap().unwrap().id, st.id);
  assert_eq!(s.find_student_by_phone("0911".into()).await.unwrap().unwrap().id, st.id);
  assert!(s.find_student_by_phone("0000".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn update_student_leaves_person_alone() {
  let s = store().await;
  let mut st = s
    .insert_person_with_student(new_person("A", None), new_student("S1", Some(2020)))
    .await
    .unwrap();

  st.student_code = "S2".into();
  st.enrollment_year = None;
  st.person.full_name = "ignored".into();
  let updated = s.update_student(st).await.unwrap();

  assert_eq!(updated.student_code, "S2");
  assert_eq!(updated.enrollment_year, None);
  assert_eq!(updated.person.full_name, "A");
}

#[tokio::test]
async fn delete_student_keeps_person() {
  let s = store().await;
  let st = s
    .insert_person_with_student(new_person("A", None), new_student("S1", None))
    .await
    .unwrap();

  assert!(s.delete_student(st.id).await.unwrap());
  assert!(!s.delete_student(st.id).await.unwrap());
  assert!(s.get_person(st.id).await.unwrap().is_some());
}

#[tokio::test]
async fn student_search_filters_on_joined_person() {
  let s = store().await;
  for (name, code, year) in [
    ("Ann Le", "SV001", Some(2021)),
    ("Annie Vo", "SV002", Some(2023)),
    ("Binh Do", "XX003", Some(2023)),
    ("Anh Ho", "SV004", None),
  ] {
    s.insert_person_with_student(new_person(name, None), new_student(code, year))
      .await
      .unwrap();
  }

  let filter = Filter::unrestricted()
    .and(student::on_person(person::full_name_contains(Some("ann"))))
    .and(student::enrollment_year_from(Some(2022)));
  let page = s.search_students(&filter, &students_by_code()).await.unwrap();
  assert_eq!(names(&page, |st| st.student_code.as_str()), ["SV002"]);

  let filter = Filter::unrestricted().and(student::student_code_contains(Some("sv")));
  let page = s.search_students(&filter, &students_by_code()).await.unwrap();
  assert_eq!(names(&page, |st| st.student_code.as_str()), ["SV001", "SV002", "SV004"]);

  let by_person_name = PageRequest::new(
    None,
    None,
    vec![SortOrder::asc(StudentSort::PersonFullName)],
    Vec::new,
  );
  let page = s.search_students(&Filter::unrestricted(), &by_person_name).await.unwrap();
  assert_eq!(page.total_items, 4);
  assert_eq!(names(&page, |st| st.person.full_name.as_str()), ["Anh Ho", "Ann Le", "Annie Vo", "Binh Do"]);
}

#[tokio::test]
async fn counts_group_by_enrollment_year() {
  let s = store().await;
  for (code, year) in [("A", Some(2023)), ("B", Some(2021)), ("C", Some(2023)), ("D", None)] {
    s.insert_person_with_student(new_person(code, None), new_student(code, year))
      .await
      .unwrap();
  }

  let stats = s.count_by_enrollment_year().await.unwrap();
  let pairs: Vec<_> = stats.iter().map(|st| (st.enrollment_year, st.total)).collect();
  assert_eq!(pairs, [(None, 1), (Some(2021), 1), (Some(2023), 2)]);
}
