use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::Path;

use crate::model::UserId;

/// Per-store settings from `.roster/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Refuse to record numeric fields whose text does not parse.
    #[serde(default = "default_true")]
    pub reject_invalid_numbers: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            reject_invalid_numbers: default_true(),
        }
    }
}

/// Per-user settings from `<config dir>/roster/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
    /// Default viewer id when neither `--as` nor `ROSTER_VIEWER` is given.
    #[serde(default)]
    pub viewer: Option<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

/// Read `.roster/config.toml` under `root`, or defaults when it is missing.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read or parsed, or
/// when `page_size` is zero.
pub fn load_project_config(root: &Path) -> Result<ProjectConfig> {
    let path = root.join(".roster/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    if config.pagination.page_size == 0 {
        bail!("{}: pagination.page_size must be at least 1", path.display());
    }
    Ok(config)
}

/// Read the per-user config, or defaults when there is none.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("roster/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load both config layers and settle the output mode.
///
/// # Errors
///
/// Propagates config read/parse failures.
pub fn resolve_config(root: &Path, cli_json: bool) -> Result<EffectiveConfig> {
    let project = load_project_config(root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_json, user.output.as_deref(), env_format.as_deref());

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

/// `--json`, then `FORMAT`, then the user config, then TTY detection.
#[must_use]
pub fn resolve_output(cli_json: bool, user_output: Option<&str>, env_format: Option<&str>) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "plain" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

const fn default_true() -> bool {
    true
}

const fn default_page_size() -> u64 {
    10
}
