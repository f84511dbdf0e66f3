//! Viewer identity resolution for read commands.
//!
//! The resolution chain: `--as` flag > `ROSTER_VIEWER` env > user config
//! `viewer`. The resolved id must name an existing user; its stored role
//! decides what the viewer may read.

use anyhow::{Context as _, Result};
use roster_core::db::query;
use roster_core::error::ErrorCode;
use roster_core::model::UserId;
use roster_core::model::role::Viewer;
use rusqlite::Connection;
use std::env;

use crate::output::ReportedError;

/// Environment reader, swappable in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
}

struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

fn resolve_viewer_id_with(
    cli_flag: Option<UserId>,
    config_viewer: Option<UserId>,
    env: &dyn EnvReader,
) -> Result<Option<UserId>> {
    if let Some(id) = cli_flag {
        return Ok(Some(id));
    }

    if let Some(raw) = env.get("ROSTER_VIEWER") {
        let id = raw
            .trim()
            .parse::<UserId>()
            .with_context(|| format!("ROSTER_VIEWER must be a user id, got '{raw}'"))?;
        return Ok(Some(id));
    }

    Ok(config_viewer)
}

/// Resolve the viewer id without touching the store.
///
/// # Errors
///
/// Returns an error when `ROSTER_VIEWER` is set but is not an integer.
pub fn resolve_viewer_id(cli_flag: Option<UserId>, config_viewer: Option<UserId>) -> Result<Option<UserId>> {
    resolve_viewer_id_with(cli_flag, config_viewer, &RealEnv)
}

/// Resolve the viewer and load its role.
///
/// # Errors
///
/// Returns `NoViewer` when nothing names a viewer, `UserNotFound` when the
/// id is unknown, or a store error.
pub fn require_viewer(
    conn: &Connection,
    cli_flag: Option<UserId>,
    config_viewer: Option<UserId>,
) -> Result<Viewer> {
    let Some(id) = resolve_viewer_id(cli_flag, config_viewer)? else {
        return Err(ReportedError::new(
            ErrorCode::NoViewer,
            "a viewer is required for this command",
        )
        .into());
    };

    let user = query::get_user(conn, id)?.ok_or_else(|| {
        ReportedError::new(ErrorCode::UserNotFound, format!("viewer {id} is not a known user"))
    })?;
    tracing::debug!(viewer = user.id, role = %user.role, "viewer resolved");
    Ok(Viewer::new(user.id, user.role))
}
