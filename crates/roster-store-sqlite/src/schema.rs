//! SQL schema for the Roster SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Timestamps are written by SQLite itself (column defaults on insert, an
/// explicit `updated_at` assignment on update) so clients can never set them.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS people (
    id            TEXT PRIMARY KEY,
    full_name     TEXT NOT NULL CHECK (length(trim(full_name)) > 0),
    dob           TEXT,            -- ISO 8601 date or NULL
    phone         TEXT UNIQUE,     -- normalised; NULLs never collide
    contact_email TEXT,
    address       TEXT,
    created_at    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

-- A student shares its primary key with its person (one-to-one).
CREATE TABLE IF NOT EXISTS students (
    person_id       TEXT PRIMARY KEY REFERENCES people(id) ON DELETE CASCADE,
    student_code    TEXT NOT NULL UNIQUE CHECK (length(trim(student_code)) > 0),
    enrollment_year INTEGER,
    created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE INDEX IF NOT EXISTS people_created_idx  ON people(created_at);
CREATE INDEX IF NOT EXISTS students_year_idx   ON students(enrollment_year);

PRAGMA user_version = 1;
";

/// SQL expression for the current UTC time, in the same format as the
/// column defaults above.
pub const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";
