#![forbid(unsafe_code)]

mod cmd;
mod output;
mod viewer;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use roster_core::config::{self, EffectiveConfig};
use roster_core::error::ErrorCode;
use roster_core::model::UserId;
use std::env;
use std::path::Path;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "roster: role-aware player profiles",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Read as this user id (overrides ROSTER_VIEWER and the user config).
    #[arg(long = "as", global = true, value_name = "USER_ID")]
    viewer: Option<UserId>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize a roster store in the current directory",
        after_help = "EXAMPLES:\n    # Create .roster/ with a store and default config\n    roster init"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Manage users",
        after_help = "EXAMPLES:\n    roster user add --name \"Ana Ruiz\" --role player"
    )]
    User {
        #[command(subcommand)]
        command: cmd::user::UserCommand,
    },

    #[command(
        next_help_heading = "Setup",
        about = "Grant a user viewing access to a player",
        after_help = "EXAMPLES:\n    # Relationship follows the viewer's role\n    roster grant 7 2\n\n    # Explicit relationship\n    roster grant 7 2 --relationship \"Parent to Player\""
    )]
    Grant(cmd::grant::GrantArgs),

    #[command(
        next_help_heading = "Record",
        about = "Append a profile field value",
        long_about = "Append one observation of a profile field. History is append-only; \
                      the newest observation is the current value.",
        after_help = "EXAMPLES:\n    roster record 2 Pushups 25\n    roster record 2 GPA 3.4 --at 2024-01-15"
    )]
    Record(cmd::record::RecordArgs),

    #[command(
        next_help_heading = "Record",
        about = "Record absences",
        after_help = "EXAMPLES:\n    roster absence add 2 --type school --date 2024-02-01 --reason excused"
    )]
    Absence {
        #[command(subcommand)]
        command: cmd::absence::AbsenceCommand,
    },

    #[command(
        next_help_heading = "Record",
        about = "Write notes about a player",
        after_help = "EXAMPLES:\n    roster --as 7 note add 2 --category soccer \"Great footwork today\""
    )]
    Note {
        #[command(subcommand)]
        command: cmd::note::NoteCommand,
    },

    #[command(
        next_help_heading = "Read",
        about = "Show a player's profile",
        after_help = "EXAMPLES:\n    roster --as 1 show 2\n    roster --as 7 show 2 --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show the history of one field",
        after_help = "EXAMPLES:\n    roster history 2 MileTime --since 2024-01-01"
    )]
    History(cmd::history::HistoryArgs),

    #[command(
        next_help_heading = "Read",
        about = "List users the viewer may see, one page at a time",
        after_help = "EXAMPLES:\n    roster players --role player --page 2\n    roster players --mine --phrase ana"
    )]
    Players(cmd::players::PlayersArgs),

    #[command(
        next_help_heading = "Read",
        about = "List a player's notes, one page at a time",
        after_help = "EXAMPLES:\n    roster notes 2 --category soccer --category academics"
    )]
    Notes(cmd::notes::NotesArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("ROSTER_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "roster=debug,info"
        } else {
            "roster=info,warn"
        })
    });

    let format = env::var("ROSTER_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn load_config(project_root: &Path, json: bool) -> anyhow::Result<EffectiveConfig> {
    config::resolve_config(project_root, json).map_err(|e| {
        output::ReportedError::new(ErrorCode::ConfigParseError, format!("{e:#}")).into()
    })
}

fn run(cli: &Cli, project_root: &Path, config: &EffectiveConfig, output: OutputMode) -> anyhow::Result<()> {
    let page_size = config.project.pagination.page_size;
    let require_viewer = |conn: &rusqlite::Connection| {
        viewer::require_viewer(conn, cli.viewer, config.user.viewer)
    };

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, output, project_root),
        Commands::User {
            command: cmd::user::UserCommand::Add(args),
        } => cmd::user::run_user_add(args, output, project_root),
        Commands::Grant(args) => cmd::grant::run_grant(args, output, project_root),
        Commands::Record(args) => cmd::record::run_record(args, &config.project, output, project_root),
        Commands::Absence {
            command: cmd::absence::AbsenceCommand::Add(args),
        } => cmd::absence::run_absence_add(args, output, project_root),
        Commands::Note {
            command: cmd::note::NoteCommand::Add(args),
        } => {
            let conn = cmd::open_existing(project_root)?;
            let viewer = require_viewer(&conn)?;
            cmd::note::run_note_add(args, viewer, output, &conn)
        }
        Commands::Show(args) => {
            let conn = cmd::open_existing(project_root)?;
            let viewer = require_viewer(&conn)?;
            cmd::show::run_show(args, viewer, output, &conn)
                .with_context(|| format!("show player {}", args.player))
        }
        Commands::History(args) => {
            let conn = cmd::open_existing(project_root)?;
            let viewer = require_viewer(&conn)?;
            cmd::history::run_history(args, viewer, output, &conn)
        }
        Commands::Players(args) => {
            let conn = cmd::open_existing(project_root)?;
            let viewer = require_viewer(&conn)?;
            cmd::players::run_players(args, viewer, page_size, output, &conn)
        }
        Commands::Notes(args) => {
            let conn = cmd::open_existing(project_root)?;
            let viewer = require_viewer(&conn)?;
            cmd::notes::run_notes(args, viewer, page_size, output, &conn)
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let fallback_output = OutputMode::from_token(&config::resolve_output(
        cli.json,
        None,
        env::var("FORMAT").ok().as_deref(),
    ));

    let root = match env::current_dir().context("Failed to read the current directory") {
        Ok(root) => root,
        Err(e) => {
            report(fallback_output, &e);
            return ExitCode::FAILURE;
        }
    };
    let config = match load_config(&root, cli.json) {
        Ok(config) => config,
        Err(e) => {
            report(fallback_output, &e);
            return ExitCode::FAILURE;
        }
    };
    let output = OutputMode::from_token(&config.resolved_output);

    match run(&cli, &root, &config, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(output, &e);
            ExitCode::FAILURE
        }
    }
}

fn report(output: OutputMode, err: &anyhow::Error) {
    let cli_error = CliError::from_anyhow(err);
    tracing::debug!(code = cli_error.code, error = %format!("{err:#}"), "command failed");
    if render_error(output, &cli_error).is_err() {
        eprintln!("error: {}", cli_error.message);
    }
}
