use anyhow::Result;
use clap::Args;
use roster_core::db::SqliteStore;
use roster_core::db::query::{PlayerFilter, PlayerPages};
use roster_core::model::player::PlayerSummary;
use roster_core::model::role::{Role, Viewer};
use roster_core::profile;
use rusqlite::Connection;
use serde::Serialize;
use std::io::Write;

use crate::output::{OutputMode, pretty_rule, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct PlayersArgs {
    /// One-based page number; out-of-range pages are clamped.
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub page: i64,

    /// Case-insensitive substring of the name.
    #[arg(long)]
    pub phrase: Option<String>,

    /// List users with this role instead of players.
    #[arg(long)]
    pub role: Option<String>,

    /// Only players linked to the viewer by a viewing permission.
    #[arg(long)]
    pub mine: bool,
}

/// Rendered page of a listing.
#[derive(Debug, Serialize)]
pub struct ListingPage<T> {
    pub page: u64,
    pub total_pages: u64,
    pub page_size: u64,
    pub results: Vec<T>,
}

/// Execute `roster players`: the permission-filtered user listing.
///
/// # Errors
///
/// Returns an error if the role token is unknown or a query fails.
pub fn run_players(
    args: &PlayersArgs,
    viewer: Viewer,
    page_size: u64,
    output: OutputMode,
    conn: &Connection,
) -> Result<()> {
    let role_filter = args.role.as_deref().map(str::parse::<Role>).transpose()?;
    let permissions = profile::permissions_for(&SqliteStore::new(conn), viewer)?;
    let filter = PlayerFilter {
        phrase: args.phrase.clone(),
        role_filter,
        related_player_ids: args
            .mine
            .then(|| permissions.linked_players().collect()),
    };

    let mut source = PlayerPages::new(conn, &permissions);
    let cursor = super::load_page(&mut source, filter, page_size, args.page)?;
    let listing = ListingPage {
        page: cursor.display_page(),
        total_pages: cursor.total_pages(),
        page_size: cursor.page_size(),
        results: cursor.visible_data().to_vec(),
    };

    render_mode(output, &listing, render_players_text, render_players_human)
}

fn render_players_text(listing: &ListingPage<PlayerSummary>, w: &mut dyn Write) -> std::io::Result<()> {
    for player in &listing.results {
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            player.id,
            player.name,
            player.role,
            player.year_of_birth.map_or_else(String::new, |y| y.to_string())
        )?;
    }
    Ok(())
}

fn render_players_human(listing: &ListingPage<PlayerSummary>, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("{:<6} {:<28} {:<8} {}", "ID", "NAME", "ROLE", "BORN"))?;
    for player in &listing.results {
        let marker = if player.relationship.is_some() {
            "  ★ your player"
        } else {
            ""
        };
        writeln!(
            w,
            "{:<6} {:<28} {:<8} {}{marker}",
            player.id,
            player.name,
            player.role.as_str(),
            player.year_of_birth.map_or_else(|| "-".to_string(), |y| y.to_string())
        )?;
    }
    pretty_rule(w)?;
    writeln!(w, "page {} of {}", listing.page, listing.total_pages.max(1))
}
