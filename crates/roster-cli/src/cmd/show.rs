//! `roster show`: a player's resolved profile, one section per visible
//! category.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use roster_core::db::SqliteStore;
use roster_core::model::UserId;
use roster_core::model::absence::{AbsenceRecord, AbsenceType};
use roster_core::model::category::ProfileCategory;
use roster_core::model::field::{FieldKey, FieldValue};
use roster_core::model::player::PlayerSummary;
use roster_core::model::role::Viewer;
use roster_core::profile::{self, PlayerProfile};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

use crate::output::{OutputMode, pretty_kv, pretty_rule, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Player id.
    pub player: UserId,
}

#[derive(Debug, Serialize)]
struct ShowProfile {
    player: PlayerSummary,
    categories: Vec<ShowCategory>,
}

#[derive(Debug, Serialize)]
struct ShowCategory {
    category: ProfileCategory,
    fields: Vec<ShowField>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    absences: BTreeMap<AbsenceType, Vec<AbsenceRecord>>,
}

#[derive(Debug, Serialize)]
struct ShowField {
    key: FieldKey,
    label: &'static str,
    value: FieldValue,
    last_updated: DateTime<Utc>,
}

impl From<PlayerProfile> for ShowProfile {
    fn from(profile: PlayerProfile) -> Self {
        let categories = profile
            .categories
            .iter()
            .map(|&category| ShowCategory {
                category,
                fields: profile
                    .fields_in(category)
                    .map(|field| ShowField {
                        key: field.key,
                        label: field.key.label(),
                        value: field.current.clone(),
                        last_updated: field.last_updated,
                    })
                    .collect(),
                absences: if category.uses_absences() {
                    profile.absences.clone()
                } else {
                    BTreeMap::new()
                },
            })
            .collect();
        Self {
            player: profile.player,
            categories,
        }
    }
}

/// Execute `roster show <player>`.
///
/// # Errors
///
/// Returns `Forbidden` when the viewer cannot reach the player, `NotFound`
/// when the id is not a player, or a store error.
pub fn run_show(args: &ShowArgs, viewer: Viewer, output: OutputMode, conn: &Connection) -> Result<()> {
    let store = SqliteStore::new(conn);
    let profile = profile::load_profile(&store, viewer, args.player)?;
    let show = ShowProfile::from(profile);
    render_mode(output, &show, render_show_text, render_show_human)
}

fn render_show_human(show: &ShowProfile, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Player {}: {}", show.player.id, show.player.name))?;
    if let Some(year) = show.player.year_of_birth {
        pretty_kv(w, "Born", year.to_string())?;
    }
    if let Some(relationship) = show.player.relationship {
        pretty_kv(w, "Your player", relationship.as_str())?;
    }
    if show.categories.is_empty() {
        writeln!(w)?;
        return writeln!(w, "(nothing recorded yet)");
    }

    for section in &show.categories {
        writeln!(w)?;
        pretty_section(w, section.category.as_str())?;
        for field in &section.fields {
            pretty_kv(w, field.label, field.value.to_string())?;
        }
        for (kind, records) in &section.absences {
            writeln!(w, "{kind} ({})", records.len())?;
            for record in records {
                let detail = if record.description.is_empty() {
                    String::new()
                } else {
                    format!("  {}", record.description)
                };
                writeln!(w, "  {}  {}{detail}", record.date, record.reason)?;
            }
        }
    }
    pretty_rule(w)
}

fn render_show_text(show: &ShowProfile, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "player\t{}\t{}", show.player.id, show.player.name)?;
    for section in &show.categories {
        writeln!(w, "[{}]", section.category)?;
        for field in &section.fields {
            writeln!(w, "{}\t{}", field.key, field.value)?;
        }
        for records in section.absences.values() {
            for record in records {
                writeln!(
                    w,
                    "absence\t{}\t{}\t{}",
                    record.absence_type, record.date, record.reason
                )?;
            }
        }
    }
    Ok(())
}
