use anyhow::Result;
use chrono::Utc;
use clap::Args;
use roster_core::db::query;
use roster_core::error::{ErrorCode, UnknownUser};
use roster_core::model::UserId;
use roster_core::model::role::{RelationshipType, ViewingPermission};
use serde::Serialize;
use std::path::Path;

use crate::output::{OutputMode, ReportedError, render_success};

#[derive(Args, Debug)]
pub struct GrantArgs {
    /// User id receiving access.
    pub viewer: UserId,

    /// Player id being made visible.
    pub player: UserId,

    /// Relationship token ("Mentor to Player" or just "mentor"). Defaults to
    /// the one implied by the viewer's role.
    #[arg(long)]
    pub relationship: Option<String>,
}

#[derive(Debug, Serialize)]
struct GrantReport {
    #[serde(flatten)]
    permission: ViewingPermission,
    created: bool,
}

/// Execute `roster grant`: add a viewing permission edge.
///
/// # Errors
///
/// Returns an error if either id is unknown, no relationship can be derived,
/// or the insert fails.
pub fn run_grant(args: &GrantArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let conn = super::open_existing(project_root)?;

    let relationship: RelationshipType = match args.relationship.as_deref() {
        Some(raw) => raw.parse()?,
        None => {
            let viewer = query::get_user(&conn, args.viewer)?.ok_or(UnknownUser { id: args.viewer })?;
            RelationshipType::for_role(viewer.role).ok_or_else(|| {
                ReportedError::new(
                    ErrorCode::InvalidEnumValue,
                    format!("{} users need an explicit --relationship", viewer.role),
                )
            })?
        }
    };

    let created = query::grant_permission(&conn, args.viewer, args.player, relationship, Utc::now())?;
    let report = GrantReport {
        permission: ViewingPermission {
            viewer_id: args.viewer,
            related_player_id: args.player,
            relationship,
        },
        created,
    };

    let verb = if created { "granted" } else { "already granted" };
    render_success(
        output,
        &report,
        &format!("{verb}: user {} -> player {} ({relationship})", args.viewer, args.player),
    )
}
