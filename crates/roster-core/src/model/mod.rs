//! Domain vocabulary: field keys, categories, roles, absences and notes.
//!
//! All enums here persist as fixed string tokens. `as_str` gives the token,
//! `FromStr` parses it back, and serde uses the same spelling.

pub mod absence;
pub mod category;
pub mod field;
pub mod note;
pub mod player;
pub mod role;

use std::fmt;

/// Identifier of any user (players included).
pub type UserId = i64;

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}
