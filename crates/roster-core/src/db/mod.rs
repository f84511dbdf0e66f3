//! SQLite persistence.
//!
//! Connections are opened with:
//! - `journal_mode = WAL` so readers are not blocked by an appending writer
//! - `busy_timeout = 5s` to ride out short lock contention
//! - `foreign_keys = ON` so permissions, absences and notes cannot dangle
//!
//! Timestamps are stored as microseconds since the Unix epoch in `*_at_us`
//! columns; absence dates are ISO `YYYY-MM-DD` text.

pub mod migrations;
pub mod query;
pub mod schema;
mod store;

pub use store::SqliteStore;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::{path::Path, time::Duration};
use tracing::{info, warn};

use crate::error::IncompatibleStore;
use crate::model::field::FIELD_KEY_WIRE_VERSION;

/// Busy timeout used for store connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the store, apply pragmas and migrate to the latest
/// schema.
///
/// # Errors
///
/// Returns [`IncompatibleStore`] (inside the `anyhow::Error`) when the file
/// was written by a newer build, or an error if opening, configuring or
/// migrating the database fails.
pub fn open_store(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create store directory {}", parent.display()))?;
    }

    let mut conn =
        Connection::open(path).with_context(|| format!("open store {}", path.display()))?;

    configure_connection(&conn).context("configure sqlite pragmas")?;
    let found = migrations::current_schema_version(&conn).context("read schema version")?;
    if found > migrations::LATEST_SCHEMA_VERSION {
        return Err(IncompatibleStore {
            what: "schema",
            found,
            supported: migrations::LATEST_SCHEMA_VERSION,
        }
        .into());
    }
    let version = migrations::migrate(&mut conn).context("apply store migrations")?;
    check_wire_version(&conn)?;
    info!(path = %path.display(), version, "store opened");

    Ok(conn)
}

/// Open an existing store, or `None` when no store file exists at `path`.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be opened, configured or
/// migrated, including a store newer than this build.
pub fn try_open_store(path: &Path) -> Result<Option<Connection>> {
    if !path.exists() {
        return Ok(None);
    }
    open_store(path).map(Some)
}

/// Refuse a store whose persisted [`FieldKey`](crate::model::field::FieldKey)
/// tokens are newer than [`FIELD_KEY_WIRE_VERSION`].
fn check_wire_version(conn: &Connection) -> Result<()> {
    let stored: i64 = conn
        .query_row(
            "SELECT field_key_wire_version FROM store_meta WHERE id = 1",
            [],
            |row| row.get(0),
        )
        .context("read store metadata")?;
    let found = u32::try_from(stored).unwrap_or(u32::MAX);
    if found > FIELD_KEY_WIRE_VERSION {
        return Err(IncompatibleStore {
            what: "field key tokens",
            found,
            supported: FIELD_KEY_WIRE_VERSION,
        }
        .into());
    }
    if found < FIELD_KEY_WIRE_VERSION {
        warn!(found, current = FIELD_KEY_WIRE_VERSION, "store uses older field key tokens");
    }
    Ok(())
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

pub(crate) fn to_micros(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

pub(crate) fn from_micros(us: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(us).ok_or(rusqlite::Error::IntegralValueOutOfRange(0, us))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_db_path() -> (TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(".roster").join("roster.db");
        (dir, path)
    }

    #[test]
    fn open_store_sets_wal_busy_timeout_and_fk() {
        let (_dir, path) = temp_db_path();
        let conn = open_store(&path).expect("open store");

        let journal_mode: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .expect("query journal_mode");
        assert_eq!(journal_mode.to_ascii_lowercase(), "wal");

        let busy_timeout_ms: u64 = conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .expect("query busy_timeout");
        assert_eq!(u128::from(busy_timeout_ms), DEFAULT_BUSY_TIMEOUT.as_millis());

        let foreign_keys: i64 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .expect("query foreign_keys");
        assert_eq!(foreign_keys, 1);
    }

    #[test]
    fn open_store_runs_migrations() {
        let (_dir, path) = temp_db_path();
        let conn = open_store(&path).expect("open store");
        let version = migrations::current_schema_version(&conn).expect("schema version");
        assert_eq!(version, migrations::LATEST_SCHEMA_VERSION);
    }

    #[test]
    fn try_open_missing_store_is_none() {
        let (_dir, path) = temp_db_path();
        assert!(try_open_store(&path).expect("no error").is_none());
    }

    #[test]
    fn try_open_garbage_file_is_an_error() {
        let (_dir, path) = temp_db_path();
        std::fs::create_dir_all(path.parent().expect("has parent")).expect("mkdir");
        std::fs::write(&path, b"definitely not sqlite").expect("write garbage");
        let err = try_open_store(&path).expect_err("garbage is not a missing store");
        assert!(err.chain().any(|cause| cause.is::<rusqlite::Error>()));
    }

    #[test]
    fn newer_schema_is_refused_not_hidden() {
        let (_dir, path) = temp_db_path();
        let conn = open_store(&path).expect("open store");
        conn.pragma_update(None, "user_version", 9_i64).expect("bump version");
        drop(conn);

        let err = try_open_store(&path).expect_err("newer store");
        let incompatible = err
            .downcast_ref::<IncompatibleStore>()
            .expect("typed incompatibility");
        assert_eq!(incompatible.found, 9);
        assert_eq!(incompatible.supported, migrations::LATEST_SCHEMA_VERSION);
    }

    #[test]
    fn newer_field_key_tokens_are_refused() {
        let (_dir, path) = temp_db_path();
        let conn = open_store(&path).expect("open store");
        conn.execute(
            "UPDATE store_meta SET field_key_wire_version = ?1 WHERE id = 1",
            [i64::from(FIELD_KEY_WIRE_VERSION) + 1],
        )
        .expect("bump wire version");
        drop(conn);

        let err = open_store(&path).expect_err("newer tokens");
        let incompatible = err
            .downcast_ref::<IncompatibleStore>()
            .expect("typed incompatibility");
        assert_eq!(incompatible.what, "field key tokens");
    }

    #[test]
    fn fresh_store_records_current_wire_version() {
        let (_dir, path) = temp_db_path();
        let conn = open_store(&path).expect("open store");
        let stored: i64 = conn
            .query_row("SELECT field_key_wire_version FROM store_meta WHERE id = 1", [], |row| {
                row.get(0)
            })
            .expect("meta row");
        assert_eq!(stored, i64::from(FIELD_KEY_WIRE_VERSION));
    }

    #[test]
    fn micros_round_trip_keeps_precision() {
        let at = DateTime::from_timestamp_micros(1_601_553_600_123_456).expect("in range");
        assert_eq!(from_micros(to_micros(at)).expect("in range"), at);
    }
}
