use anyhow::Result;
use clap::Args;
use roster_core::db::SqliteStore;
use roster_core::history::FieldEntry;
use roster_core::model::UserId;
use roster_core::model::field::FieldKey;
use roster_core::model::role::Viewer;
use roster_core::profile;
use serde::Serialize;
use std::io::Write;

use crate::output::{OutputMode, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Player id.
    pub player: UserId,

    /// Field key token, e.g. `MileTime`.
    pub key: String,

    /// Include entries at or after this time (RFC 3339 or YYYY-MM-DD).
    #[arg(long)]
    pub since: Option<String>,

    /// Include entries strictly before this time.
    #[arg(long)]
    pub until: Option<String>,
}

#[derive(Debug, Serialize)]
struct HistoryReport {
    player_id: UserId,
    key: FieldKey,
    label: &'static str,
    entries: Vec<FieldEntry>,
}

/// Execute `roster history`: every recorded value of one key, oldest first.
///
/// # Errors
///
/// Returns `Forbidden`/`NotFound` from the profile read, or an error if the
/// key or a time bound does not parse.
pub fn run_history(
    args: &HistoryArgs,
    viewer: Viewer,
    output: OutputMode,
    conn: &rusqlite::Connection,
) -> Result<()> {
    let key: FieldKey = args.key.parse()?;
    let since = super::parse_optional_timestamp(args.since.as_deref())?;
    let until = super::parse_optional_timestamp(args.until.as_deref())?;

    let store = SqliteStore::new(conn);
    let entries = profile::load_field_history(&store, viewer, args.player, key, since, until)?;

    let report = HistoryReport {
        player_id: args.player,
        key,
        label: key.label(),
        entries,
    };
    render_mode(output, &report, render_history_text, render_history_human)
}

fn render_history_text(report: &HistoryReport, w: &mut dyn Write) -> std::io::Result<()> {
    for entry in &report.entries {
        writeln!(w, "{}\t{}\t{}", entry.created_at.to_rfc3339(), entry.seq, entry.value)?;
    }
    Ok(())
}

fn render_history_human(report: &HistoryReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(
        w,
        &format!("{} history for player {}", report.label, report.player_id),
    )?;
    if report.entries.is_empty() {
        return writeln!(w, "(no entries)");
    }
    for entry in &report.entries {
        let valid = if report.key.parse_value(&entry.value).is_ok() {
            ""
        } else {
            "  (invalid)"
        };
        writeln!(
            w,
            "{}  {}{valid}",
            entry.created_at.format("%Y-%m-%d %H:%M"),
            entry.value
        )?;
    }
    Ok(())
}
