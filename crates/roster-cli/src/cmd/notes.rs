use anyhow::Result;
use clap::Args;
use roster_core::db::SqliteStore;
use roster_core::db::query::{self, NoteFilter, NotePages};
use roster_core::error::ProfileError;
use roster_core::model::UserId;
use roster_core::model::note::{Note, NoteCategory};
use roster_core::model::player::User;
use roster_core::model::role::Viewer;
use roster_core::permission::ResourceType;
use roster_core::profile;
use rusqlite::Connection;
use std::io::Write;

use super::players::ListingPage;
use crate::output::{OutputMode, pretty_rule, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct NotesArgs {
    /// Player id.
    pub player: UserId,

    /// One-based page number; out-of-range pages are clamped.
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub page: i64,

    /// Case-insensitive substring of the note text.
    #[arg(long)]
    pub phrase: Option<String>,

    /// Only these categories (repeatable). All when omitted.
    #[arg(long = "category")]
    pub categories: Vec<String>,
}

/// Execute `roster notes <player>`: one page of notes, newest first.
///
/// # Errors
///
/// Returns `Forbidden` before `NotFound`, like a profile read, or an error
/// if a category is unknown or a query fails.
pub fn run_notes(
    args: &NotesArgs,
    viewer: Viewer,
    page_size: u64,
    output: OutputMode,
    conn: &Connection,
) -> Result<()> {
    let categories = args
        .categories
        .iter()
        .map(|raw| raw.parse::<NoteCategory>())
        .collect::<Result<Vec<_>, _>>()?;

    let permissions = profile::permissions_for(&SqliteStore::new(conn), viewer)?;
    permissions.authorize(args.player, ResourceType::Notes)?;
    if !query::get_user(conn, args.player)?.as_ref().is_some_and(User::is_player) {
        return Err(ProfileError::NotFound { player: args.player }.into());
    }

    let filter = NoteFilter {
        player_id: args.player,
        phrase: args.phrase.clone(),
        categories,
    };
    let mut source = NotePages::new(conn, &permissions);
    let cursor = super::load_page(&mut source, filter, page_size, args.page)?;
    let listing = ListingPage {
        page: cursor.display_page(),
        total_pages: cursor.total_pages(),
        page_size: cursor.page_size(),
        results: cursor.visible_data().to_vec(),
    };

    render_mode(output, &listing, render_notes_text, render_notes_human)
}

fn render_notes_text(listing: &ListingPage<Note>, w: &mut dyn Write) -> std::io::Result<()> {
    for note in &listing.results {
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            note.note_id,
            note.created_at.to_rfc3339(),
            note.category,
            note.content
        )?;
    }
    Ok(())
}

fn render_notes_human(listing: &ListingPage<Note>, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Notes")?;
    if listing.results.is_empty() {
        writeln!(w, "(no notes)")?;
    }
    for note in &listing.results {
        writeln!(
            w,
            "#{} [{}] {} by user {}",
            note.note_id,
            note.category,
            note.created_at.format("%Y-%m-%d %H:%M"),
            note.author_id
        )?;
        for line in note.content.lines() {
            writeln!(w, "    {line}")?;
        }
    }
    pretty_rule(w)?;
    writeln!(w, "page {} of {}", listing.page, listing.total_pages.max(1))
}
