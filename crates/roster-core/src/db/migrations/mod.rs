//! Versioned schema changes for the roster store.
//!
//! The applied version lives in `PRAGMA user_version` and is mirrored into
//! `store_meta.schema_version` for tools that only read tables.

use super::schema;
use rusqlite::{Connection, types::Type};
use tracing::info;

/// One forward-only schema step.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "base tables and append-only triggers",
        sql: schema::MIGRATION_V1_SQL,
    },
    Migration {
        version: 2,
        name: "lookup indexes",
        sql: schema::MIGRATION_V2_SQL,
    },
];

/// Highest version in [`MIGRATIONS`].
pub const LATEST_SCHEMA_VERSION: u32 = 2;

/// Applied schema version of `conn`.
///
/// # Errors
///
/// Returns an error if the pragma cannot be read or holds a value outside
/// `u32`.
pub fn current_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    let raw: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    u32::try_from(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(e)))
}

/// Migrations newer than `version`, oldest first.
pub fn pending(version: u32) -> impl Iterator<Item = &'static Migration> {
    MIGRATIONS.iter().filter(move |m| m.version > version)
}

/// Bring `conn` up to [`LATEST_SCHEMA_VERSION`], one transaction per step.
///
/// A store already at a newer version than this build knows is refused
/// rather than read with a stale schema.
///
/// # Errors
///
/// Returns an error if a step fails (earlier steps stay committed) or the
/// store is newer than this build.
pub fn migrate(conn: &mut Connection) -> rusqlite::Result<u32> {
    let start = current_schema_version(conn)?;
    if start > LATEST_SCHEMA_VERSION {
        let message = format!("store schema v{start} is newer than supported v{LATEST_SCHEMA_VERSION}");
        return Err(rusqlite::Error::FromSqlConversionFailure(
            0,
            Type::Integer,
            message.into(),
        ));
    }

    let mut applied = start;
    for step in pending(start) {
        let version = i64::from(step.version);
        let tx = conn.transaction()?;
        tx.execute_batch(step.sql)?;
        tx.execute(
            "UPDATE store_meta SET schema_version = ?1 WHERE id = 1",
            [version],
        )?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;

        info!(version = step.version, name = step.name, "applied store migration");
        applied = step.version;
    }

    Ok(applied)
}
