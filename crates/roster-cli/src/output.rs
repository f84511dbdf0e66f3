//! Shared output layer for pretty/text/JSON parity across commands.
//!
//! Handlers receive an [`OutputMode`] and format through [`render_mode`]:
//! framed sections for humans, flat lines for pipes, stable JSON for scripts.
//! Errors go to stderr through [`render_error`] in the same mode.

use roster_core::error::{ErrorCode, IncompatibleStore, ProfileError, UnknownUser};
use roster_core::model::ParseEnumError;
use roster_core::model::field::ValueError;
use serde::Serialize;
use std::io::{self, Write};

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<22} {}", format!("{key}:"), value.as_ref())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Sections and aligned labels.
    Pretty,
    /// One record per line, tab separated.
    Text,
    Json,
}

impl OutputMode {
    /// Map a resolved config token (`pretty`, `text`, `json`).
    pub fn from_token(token: &str) -> Self {
        match token {
            "json" => Self::Json,
            "text" => Self::Text,
            _ => Self::Pretty,
        }
    }

    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Render a serializable value with explicit pretty/text renderers.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, &mut out)?,
        OutputMode::Pretty => pretty_fn(value, &mut out)?,
    }
    Ok(())
}

/// Render a one-line confirmation for write commands.
pub fn render_success<T: Serialize>(mode: OutputMode, value: &T, message: &str) -> anyhow::Result<()> {
    render_mode(
        mode,
        value,
        |_, w| writeln!(w, "{message}"),
        |_, w| writeln!(w, "✓ {message}"),
    )
}

/// A structured error with a stable code and optional hint.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

impl CliError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            hint: code.hint(),
        }
    }

    /// Classify a command failure by the typed error at the root of its chain.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");
        for cause in err.chain() {
            if let Some(profile) = cause.downcast_ref::<ProfileError>() {
                return Self::new(profile.code(), message);
            }
            if let Some(reported) = cause.downcast_ref::<ReportedError>() {
                return Self::new(reported.code, message);
            }
            if cause.is::<ValueError>() {
                return Self::new(ErrorCode::InvalidFieldValue, message);
            }
            if cause.is::<ParseEnumError>() {
                return Self::new(ErrorCode::InvalidEnumValue, message);
            }
            if cause.is::<UnknownUser>() {
                return Self::new(ErrorCode::UserNotFound, message);
            }
            if cause.is::<IncompatibleStore>() {
                return Self::new(ErrorCode::IncompatibleStore, message);
            }
            if let Some(sqlite) = cause.downcast_ref::<rusqlite::Error>() {
                return Self::new(sqlite_code(sqlite), message);
            }
        }
        Self::new(ErrorCode::InternalUnexpected, message)
    }
}

/// Lock contention is transient; anything else from SQLite means the store
/// itself is unusable.
fn sqlite_code(err: &rusqlite::Error) -> ErrorCode {
    match err.sqlite_error_code() {
        Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked) => {
            ErrorCode::FetchFailed
        }
        _ => ErrorCode::CorruptStore,
    }
}

/// An error raised by the CLI layer itself, tagged with its code.
#[derive(Debug)]
pub struct ReportedError {
    pub code: ErrorCode,
    pub message: String,
}

impl ReportedError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ReportedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ReportedError {}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    write_error(mode, error, &mut out)?;
    Ok(())
}

fn write_error(mode: OutputMode, error: &CliError, out: &mut dyn Write) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({ "error": error });
            serde_json::to_writer_pretty(&mut *out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            writeln!(out, "error: {}", error.message)?;
            writeln!(out, "  code: {}", error.code)?;
            if let Some(hint) = error.hint {
                writeln!(out, "  hint: {hint}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::error::FetchError;
    use roster_core::permission::ResourceType;

    #[test]
    fn output_mode_tokens() {
        assert_eq!(OutputMode::from_token("json"), OutputMode::Json);
        assert_eq!(OutputMode::from_token("text"), OutputMode::Text);
        assert_eq!(OutputMode::from_token("pretty"), OutputMode::Pretty);
        assert!(OutputMode::Json.is_json());
        assert!(!OutputMode::Text.is_json());
    }

    #[test]
    fn forbidden_keeps_its_code_through_context() {
        let err = anyhow::Error::new(ProfileError::Forbidden {
            viewer: 3,
            player: 8,
            resource: ResourceType::ProfileFields,
        })
        .context("show player 8");
        let cli = CliError::from_anyhow(&err);
        assert_eq!(cli.code, "E2002");
        assert!(cli.message.contains("show player 8"));
        assert!(cli.hint.is_some());
    }

    #[test]
    fn not_found_and_forbidden_classify_differently() {
        let missing = anyhow::Error::new(ProfileError::NotFound { player: 8 });
        assert_eq!(CliError::from_anyhow(&missing).code, "E2001");

        let fetch = anyhow::Error::new(ProfileError::from(FetchError::new("absences", "locked")));
        assert_eq!(CliError::from_anyhow(&fetch).code, "E5001");
    }

    #[test]
    fn store_failures_are_not_reported_as_missing() {
        let newer = anyhow::Error::new(IncompatibleStore {
            what: "schema",
            found: 9,
            supported: 2,
        })
        .context("open store");
        assert_eq!(CliError::from_anyhow(&newer).code, "E3002");

        let busy = anyhow::Error::new(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        ));
        assert_eq!(CliError::from_anyhow(&busy).code, "E5001");

        let garbage = anyhow::Error::new(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_NOTADB),
            None,
        ));
        assert_eq!(CliError::from_anyhow(&garbage).code, "E3003");
    }

    #[test]
    fn unknown_tokens_and_users_have_codes() {
        let token = anyhow::Error::new(
            "Bogus"
                .parse::<roster_core::model::role::Role>()
                .expect_err("unknown role"),
        );
        assert_eq!(CliError::from_anyhow(&token).code, "E2005");

        let user = anyhow::Error::new(UnknownUser { id: 44 });
        assert_eq!(CliError::from_anyhow(&user).code, "E2004");

        let plain = anyhow::anyhow!("something odd");
        assert_eq!(CliError::from_anyhow(&plain).code, "E9001");
    }

    #[test]
    fn human_error_lists_code_and_hint() {
        let mut buf = Vec::new();
        let error = CliError::new(ErrorCode::NotInitialized, "no store at .roster/roster.db");
        write_error(OutputMode::Text, &error, &mut buf).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("error: no store at .roster/roster.db"));
        assert!(text.contains("code: E1001"));
        assert!(text.contains("hint: Run `roster init`"));
    }

    #[test]
    fn json_error_is_wrapped() {
        let mut buf = Vec::new();
        let error = CliError::new(ErrorCode::PlayerNotFound, "player 9 not found");
        write_error(OutputMode::Json, &error, &mut buf).expect("write");
        let value: serde_json::Value = serde_json::from_slice(&buf).expect("json");
        assert_eq!(value["error"]["code"], "E2001");
        assert_eq!(value["error"]["message"], "player 9 not found");
        assert!(value["error"].get("hint").is_none());
    }
}
