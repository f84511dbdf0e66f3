use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{ParseEnumError, UserId};

/// Topic a note is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteCategory {
    General,
    Soccer,
    Academics,
    Mentorship,
}

impl NoteCategory {
    pub const ALL: [Self; 4] = [Self::General, Self::Soccer, Self::Academics, Self::Mentorship];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Soccer => "soccer",
            Self::Academics => "academics",
            Self::Mentorship => "mentorship",
        }
    }
}

impl fmt::Display for NoteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteCategory {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError {
                expected: "note category",
                got: s.to_string(),
            })
    }
}

/// A free-form note written about a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub note_id: i64,
    pub player_id: UserId,
    pub author_id: UserId,
    pub category: NoteCategory,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
