use anyhow::Result;
use chrono::Utc;
use clap::Args;
use roster_core::config::ProjectConfig;
use roster_core::db::query;
use roster_core::model::UserId;
use roster_core::model::field::FieldKey;
use std::path::Path;

use crate::output::{OutputMode, render_success};

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Player id.
    pub player: UserId,

    /// Field key token, e.g. `Pushups` or `GPA`.
    pub key: String,

    /// Value text. Numeric keys take a plain integer or decimal.
    pub value: String,

    /// Observation time (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long)]
    pub at: Option<String>,
}

/// Execute `roster record`: append one field observation.
///
/// # Errors
///
/// Returns an error if the key is unknown, the player does not exist, the
/// value is refused, or the insert fails.
pub fn run_record(
    args: &RecordArgs,
    config: &ProjectConfig,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let key: FieldKey = args.key.parse()?;
    let created_at = match args.at.as_deref() {
        Some(raw) => super::parse_timestamp(raw)?,
        None => Utc::now(),
    };

    let conn = super::open_existing(project_root)?;
    let entry = query::record_field(
        &conn,
        &config.history,
        args.player,
        key,
        &args.value,
        created_at,
    )?;

    render_success(
        output,
        &entry,
        &format!(
            "recorded {} = {} for player {} (seq {})",
            entry.key.label(),
            entry.value,
            entry.player_id,
            entry.seq
        ),
    )
}
