use anyhow::{Context as _, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};
use roster_core::db::query;
use roster_core::model::UserId;
use roster_core::model::absence::AbsenceRecord;
use std::path::Path;

use crate::output::{OutputMode, render_success};

#[derive(Subcommand, Debug)]
pub enum AbsenceCommand {
    /// Record an absence for a player.
    Add(AbsenceAddArgs),
}

#[derive(Args, Debug)]
pub struct AbsenceAddArgs {
    /// Player id.
    pub player: UserId,

    /// school, tutoring or soccer.
    #[arg(long = "type")]
    pub absence_type: String,

    /// Day of the absence (YYYY-MM-DD).
    #[arg(long)]
    pub date: String,

    /// excused or unexcused.
    #[arg(long)]
    pub reason: String,

    #[arg(long, default_value = "")]
    pub description: String,
}

/// Execute `roster absence add`.
///
/// # Errors
///
/// Returns an error if a token or the date does not parse, the player does
/// not exist, or the insert fails.
pub fn run_absence_add(args: &AbsenceAddArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let record = AbsenceRecord {
        player_id: args.player,
        absence_type: args.absence_type.parse()?,
        date: NaiveDate::parse_from_str(args.date.trim(), "%Y-%m-%d")
            .with_context(|| format!("expected YYYY-MM-DD, got '{}'", args.date))?,
        reason: args.reason.parse()?,
        description: args.description.clone(),
    };

    let conn = super::open_existing(project_root)?;
    query::add_absence(&conn, &record, Utc::now())?;

    render_success(
        output,
        &record,
        &format!(
            "recorded {} {} absence for player {} on {}",
            record.reason, record.absence_type, record.player_id, record.date
        ),
    )
}
