use std::fmt;

use crate::model::UserId;
use crate::permission::ResourceType;

/// Machine-readable error codes for scripts and the JSON output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    NoViewer,
    PlayerNotFound,
    Forbidden,
    InvalidFieldValue,
    UserNotFound,
    InvalidEnumValue,
    IncompatibleStore,
    CorruptStore,
    FetchFailed,
    InternalUnexpected,
}

impl ErrorCode {
    pub const ALL: [Self; 12] = [
        Self::NotInitialized,
        Self::ConfigParseError,
        Self::NoViewer,
        Self::PlayerNotFound,
        Self::Forbidden,
        Self::InvalidFieldValue,
        Self::UserNotFound,
        Self::InvalidEnumValue,
        Self::IncompatibleStore,
        Self::CorruptStore,
        Self::FetchFailed,
        Self::InternalUnexpected,
    ];

    /// Stable code identifier (`E####`).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::NoViewer => "E1003",
            Self::PlayerNotFound => "E2001",
            Self::Forbidden => "E2002",
            Self::InvalidFieldValue => "E2003",
            Self::UserNotFound => "E2004",
            Self::InvalidEnumValue => "E2005",
            Self::IncompatibleStore => "E3002",
            Self::CorruptStore => "E3003",
            Self::FetchFailed => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Roster store not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::NoViewer => "No viewer identity",
            Self::PlayerNotFound => "Player not found",
            Self::Forbidden => "Viewer is not authorized for this player",
            Self::InvalidFieldValue => "Invalid field value",
            Self::UserNotFound => "User not found",
            Self::InvalidEnumValue => "Invalid enumerated value",
            Self::IncompatibleStore => "Store written by a newer roster",
            Self::CorruptStore => "Corrupt SQLite store",
            Self::FetchFailed => "Store read failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `roster init` in this directory."),
            Self::ConfigParseError => Some("Fix syntax in .roster/config.toml and retry."),
            Self::NoViewer => Some("Pass --as <user-id> or set ROSTER_VIEWER."),
            Self::PlayerNotFound | Self::UserNotFound => None,
            Self::Forbidden => Some("Ask an admin to grant a viewing permission with `roster grant`."),
            Self::InvalidFieldValue => Some("Numeric fields take a plain integer or decimal."),
            Self::InvalidEnumValue => Some("Use one of the documented tokens."),
            Self::IncompatibleStore => Some("Upgrade roster to open this store."),
            Self::CorruptStore => Some("Restore .roster/roster.db from a backup."),
            Self::FetchFailed => Some("Retry; the store may be locked by another process."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A collaborator read failed for reasons unrelated to the request itself.
#[derive(Debug, thiserror::Error)]
#[error("failed to fetch {what}: {source}")]
pub struct FetchError {
    pub what: &'static str,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl FetchError {
    pub fn new(
        what: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            what,
            source: source.into(),
        }
    }
}

/// The store carries a format version newer than this build understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("store {what} is v{found}, this build supports up to v{supported}")]
pub struct IncompatibleStore {
    pub what: &'static str,
    pub found: u32,
    pub supported: u32,
}

/// A write referenced a user id that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("user {id} not found")]
pub struct UnknownUser {
    pub id: UserId,
}

/// Outcome of a profile read that did not produce a profile.
///
/// `Forbidden` and `NotFound` are never collapsed into each other or into an
/// empty profile.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("viewer {viewer} may not read {resource} of player {player}")]
    Forbidden {
        viewer: UserId,
        player: UserId,
        resource: ResourceType,
    },

    #[error("player {player} not found")]
    NotFound { player: UserId },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl ProfileError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Forbidden { .. } => ErrorCode::Forbidden,
            Self::NotFound { .. } => ErrorCode::PlayerNotFound,
            Self::Fetch(_) => ErrorCode::FetchFailed,
        }
    }

    #[must_use]
    pub const fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
