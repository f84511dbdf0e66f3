use anyhow::Result;
use chrono::Utc;
use clap::{Args, Subcommand};
use roster_core::db::{SqliteStore, query};
use roster_core::model::UserId;
use roster_core::model::note::{Note, NoteCategory};
use roster_core::model::role::Viewer;
use roster_core::permission::ResourceType;
use roster_core::profile;
use rusqlite::Connection;

use crate::output::{OutputMode, render_success};

#[derive(Subcommand, Debug)]
pub enum NoteCommand {
    /// Write a note about a player, authored by the viewer.
    Add(NoteAddArgs),
}

#[derive(Args, Debug)]
pub struct NoteAddArgs {
    /// Player id.
    pub player: UserId,

    /// general, soccer, academics or mentorship.
    #[arg(long, default_value = "general")]
    pub category: String,

    /// Note text.
    pub content: String,
}

/// Execute `roster note add`. The author must be able to read the player's
/// notes.
///
/// # Errors
///
/// Returns `Forbidden` when the viewer cannot reach the player, or an error
/// if the category is unknown or the insert fails.
pub fn run_note_add(args: &NoteAddArgs, viewer: Viewer, output: OutputMode, conn: &Connection) -> Result<()> {
    let category: NoteCategory = args.category.parse()?;
    let permissions = profile::permissions_for(&SqliteStore::new(conn), viewer)?;
    permissions.authorize(args.player, ResourceType::Notes)?;

    let created_at = Utc::now();
    let note_id = query::add_note(conn, args.player, viewer.id, category, &args.content, created_at)?;
    let note = Note {
        note_id,
        player_id: args.player,
        author_id: viewer.id,
        category,
        content: args.content.clone(),
        created_at,
    };
    render_success(
        output,
        &note,
        &format!("added {category} note {note_id} for player {}", args.player),
    )
}
