use anyhow::{Context as _, Result};
use clap::Args;
use roster_core::config::ProjectConfig;
use roster_core::db;
use serde::Serialize;
use std::path::Path;

use crate::output::{OutputMode, pretty_kv, render_mode};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Rewrite `config.toml` even if `.roster/` already exists. The store is
    /// kept; its history is append-only.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct InitReport {
    store: String,
    config: String,
    schema_version: u32,
}

/// Execute `roster init`. Creates:
///
/// ```text
/// .roster/
///   roster.db     (SQLite store, migrated to the latest schema)
///   config.toml   (default project config)
/// ```
///
/// # Errors
///
/// Returns an error if `.roster/` exists and `--force` is not set, or if any
/// filesystem or store operation fails.
pub fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let roster_dir = project_root.join(".roster");
    if roster_dir.exists() && !args.force {
        anyhow::bail!(".roster/ already exists. Use `roster init --force` to rewrite its config.");
    }

    std::fs::create_dir_all(&roster_dir)
        .with_context(|| format!("Failed to create {}", roster_dir.display()))?;

    let config_path = roster_dir.join("config.toml");
    let template = toml::to_string_pretty(&ProjectConfig::default())
        .context("Failed to render default config")?;
    std::fs::write(&config_path, template)
        .with_context(|| format!("Failed to write config: {}", config_path.display()))?;

    let store_path = super::store_path(project_root);
    let conn = db::open_store(&store_path)?;
    let schema_version = db::migrations::current_schema_version(&conn)
        .context("Failed to read schema version")?;

    let report = InitReport {
        store: ".roster/roster.db".to_string(),
        config: ".roster/config.toml".to_string(),
        schema_version,
    };
    render_mode(
        output,
        &report,
        |r, w| writeln!(w, "initialized {} (schema v{})", r.store, r.schema_version),
        |r, w| {
            writeln!(w, "✓ Initialized .roster/")?;
            writeln!(w)?;
            pretty_kv(w, "store", &r.store)?;
            pretty_kv(w, "config", &r.config)?;
            pretty_kv(w, "schema", format!("v{}", r.schema_version))?;
            writeln!(w)?;
            writeln!(w, "Next steps:")?;
            writeln!(w, "  roster user add --name \"Coach\" --role admin")?;
            writeln!(w, "  export ROSTER_VIEWER=1")
        },
    )
}
