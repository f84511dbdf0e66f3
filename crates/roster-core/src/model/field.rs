//! Tracked profile field keys and their stored values.
//!
//! Every historical observation is stored as text. How that text is read back
//! depends on the key: score/count keys are integers, GPA and BMI are
//! decimals, links are URLs and everything else is free text. The mapping is
//! an exhaustive `match`, so adding a key forces every table in this module
//! (and the category table in [`super::category`]) to be revisited.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::ParseEnumError;

/// Version of the string tokens used to persist [`FieldKey`] values.
///
/// Stored in `store_meta.field_key_wire_version`; opening a store with a
/// higher value fails. Bump together with a migration that rewrites renamed
/// tokens and the stored version.
pub const FIELD_KEY_WIRE_VERSION: u32 = 1;

/// Closed set of profile attributes tracked per player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldKey {
    AcademicEngagementScore,
    AdvisingScore,
    AthleticScore,
    BioAboutMe,
    BioFavoriteSubject,
    BioHobbies,
    BioMostDifficultSubject,
    BioParents,
    BioSiblings,
    #[serde(rename = "BMI")]
    Bmi,
    DisciplinaryActions,
    #[serde(rename = "GPA")]
    Gpa,
    HealthAndWellness,
    Highlights,
    IntroVideo,
    MileTime,
    PacerTest,
    PlayerNumber,
    Pushups,
    Situps,
    YearOfBirth,
}

/// How the stored text of a field is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Integer,
    Decimal,
    Text,
    Url,
}

impl FieldKey {
    /// Every key, in declaration order.
    pub const ALL: [Self; 21] = [
        Self::AcademicEngagementScore,
        Self::AdvisingScore,
        Self::AthleticScore,
        Self::BioAboutMe,
        Self::BioFavoriteSubject,
        Self::BioHobbies,
        Self::BioMostDifficultSubject,
        Self::BioParents,
        Self::BioSiblings,
        Self::Bmi,
        Self::DisciplinaryActions,
        Self::Gpa,
        Self::HealthAndWellness,
        Self::Highlights,
        Self::IntroVideo,
        Self::MileTime,
        Self::PacerTest,
        Self::PlayerNumber,
        Self::Pushups,
        Self::Situps,
        Self::YearOfBirth,
    ];

    /// Persisted token for this key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AcademicEngagementScore => "AcademicEngagementScore",
            Self::AdvisingScore => "AdvisingScore",
            Self::AthleticScore => "AthleticScore",
            Self::BioAboutMe => "BioAboutMe",
            Self::BioFavoriteSubject => "BioFavoriteSubject",
            Self::BioHobbies => "BioHobbies",
            Self::BioMostDifficultSubject => "BioMostDifficultSubject",
            Self::BioParents => "BioParents",
            Self::BioSiblings => "BioSiblings",
            Self::Bmi => "BMI",
            Self::DisciplinaryActions => "DisciplinaryActions",
            Self::Gpa => "GPA",
            Self::HealthAndWellness => "HealthAndWellness",
            Self::Highlights => "Highlights",
            Self::IntroVideo => "IntroVideo",
            Self::MileTime => "MileTime",
            Self::PacerTest => "PacerTest",
            Self::PlayerNumber => "PlayerNumber",
            Self::Pushups => "Pushups",
            Self::Situps => "Situps",
            Self::YearOfBirth => "YearOfBirth",
        }
    }

    #[must_use]
    pub const fn value_kind(self) -> ValueKind {
        match self {
            Self::AcademicEngagementScore
            | Self::AdvisingScore
            | Self::AthleticScore
            | Self::PacerTest
            | Self::PlayerNumber
            | Self::Pushups
            | Self::Situps
            | Self::YearOfBirth => ValueKind::Integer,
            Self::Bmi | Self::Gpa => ValueKind::Decimal,
            Self::Highlights | Self::IntroVideo => ValueKind::Url,
            Self::BioAboutMe
            | Self::BioFavoriteSubject
            | Self::BioHobbies
            | Self::BioMostDifficultSubject
            | Self::BioParents
            | Self::BioSiblings
            | Self::DisciplinaryActions
            | Self::HealthAndWellness
            | Self::MileTime => ValueKind::Text,
        }
    }

    /// Human-facing label shown next to the value.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AcademicEngagementScore => "School",
            Self::AdvisingScore => "Academic Advising",
            Self::AthleticScore => "Athletic",
            Self::BioAboutMe => "About Me",
            Self::BioFavoriteSubject => "Favorite Subject",
            Self::BioHobbies => "Hobbies",
            Self::BioMostDifficultSubject => "Most Difficult Subject",
            Self::BioParents => "Parents",
            Self::BioSiblings => "Siblings",
            Self::Bmi => "Body Mass Index",
            Self::DisciplinaryActions => "Disciplinary Actions",
            Self::Gpa => "GPA",
            Self::HealthAndWellness => "Health and Wellness",
            Self::Highlights => "Highlights",
            Self::IntroVideo => "Intro Video",
            Self::MileTime => "1 Mile Time",
            Self::PacerTest => "Pacer Test",
            Self::PlayerNumber => "Player Number",
            Self::Pushups => "Push-Ups",
            Self::Situps => "Sit-Ups",
            Self::YearOfBirth => "Year of Birth",
        }
    }

    /// Interpret stored text for this key.
    ///
    /// Numeric keys reject anything that is not a finite number. Text and URL
    /// keys pass the stored value through untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] when a numeric key holds non-numeric text.
    pub fn parse_value(self, raw: &str) -> Result<FieldValue, ValueError> {
        match self.value_kind() {
            ValueKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| ValueError::new(self, raw)),
            ValueKind::Decimal => match raw.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(FieldValue::Decimal(value)),
                _ => Err(ValueError::new(self, raw)),
            },
            ValueKind::Text => Ok(FieldValue::Text(raw.to_string())),
            ValueKind::Url => Ok(FieldValue::Url(raw.to_string())),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKey {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                expected: "field key",
                got: s.to_string(),
            })
    }
}

/// A stored value after key-specific interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Integer(i64),
    Decimal(f64),
    Text(String),
    Url(String),
}

impl FieldValue {
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Decimal(value) => write!(f, "{value}"),
            Self::Text(value) | Self::Url(value) => f.write_str(value),
        }
    }
}

/// A stored value that does not parse for its key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("invalid {kind:?} value for {key}: '{raw}'")]
pub struct ValueError {
    pub key: FieldKey,
    pub kind: ValueKind,
    pub raw: String,
}

impl ValueError {
    fn new(key: FieldKey, raw: &str) -> Self {
        Self {
            key,
            kind: key.value_kind(),
            raw: raw.to_string(),
        }
    }
}
