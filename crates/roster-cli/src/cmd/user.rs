use anyhow::Result;
use chrono::Utc;
use clap::{Args, Subcommand};
use roster_core::db::query;
use roster_core::model::player::User;
use roster_core::model::role::Role;
use std::path::Path;

use crate::output::{OutputMode, render_success};

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Register a user.
    Add(UserAddArgs),
}

#[derive(Args, Debug)]
pub struct UserAddArgs {
    #[arg(long)]
    pub name: String,

    /// admin, player, mentor, parent or donor.
    #[arg(long)]
    pub role: String,
}

/// Execute `roster user add`.
///
/// # Errors
///
/// Returns an error if the role is unknown or the insert fails.
pub fn run_user_add(args: &UserAddArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let role: Role = args.role.parse()?;
    let conn = super::open_existing(project_root)?;
    let id = query::add_user(&conn, &args.name, role, Utc::now())?;

    let user = User {
        id,
        name: args.name.trim().to_string(),
        role,
    };
    render_success(
        output,
        &user,
        &format!("added {} {} as user {}", user.role, user.name, user.id),
    )
}
