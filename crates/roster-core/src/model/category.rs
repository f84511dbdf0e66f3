use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::ParseEnumError;
use super::field::FieldKey;

/// Profile tabs, in display order.
///
/// `Ord` follows declaration order, which is also the order tabs render in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProfileCategory {
    Overview,
    Engagement,
    #[serde(rename = "Academic Performance")]
    AcademicPerformance,
    Attendance,
    #[serde(rename = "Physical Wellness")]
    PhysicalWellness,
    Highlights,
}

impl ProfileCategory {
    pub const ALL: [Self; 6] = [
        Self::Overview,
        Self::Engagement,
        Self::AcademicPerformance,
        Self::Attendance,
        Self::PhysicalWellness,
        Self::Highlights,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Engagement => "Engagement",
            Self::AcademicPerformance => "Academic Performance",
            Self::Attendance => "Attendance",
            Self::PhysicalWellness => "Physical Wellness",
            Self::Highlights => "Highlights",
        }
    }

    /// Field keys whose presence makes this category worth showing.
    ///
    /// Attendance maps to no keys: it is driven by absence records instead.
    #[must_use]
    pub const fn field_keys(self) -> &'static [FieldKey] {
        match self {
            Self::Overview => &[
                FieldKey::BioAboutMe,
                FieldKey::BioHobbies,
                FieldKey::BioFavoriteSubject,
                FieldKey::BioMostDifficultSubject,
                FieldKey::BioSiblings,
                FieldKey::BioParents,
                FieldKey::IntroVideo,
            ],
            Self::Engagement => &[
                FieldKey::AcademicEngagementScore,
                FieldKey::AdvisingScore,
                FieldKey::AthleticScore,
            ],
            Self::AcademicPerformance => &[FieldKey::Gpa, FieldKey::DisciplinaryActions],
            Self::Attendance => &[],
            Self::PhysicalWellness => &[
                FieldKey::Bmi,
                FieldKey::PacerTest,
                FieldKey::MileTime,
                FieldKey::Situps,
                FieldKey::Pushups,
                FieldKey::HealthAndWellness,
            ],
            Self::Highlights => &[FieldKey::Highlights],
        }
    }

    /// Whether this category is backed by absence records.
    #[must_use]
    pub const fn uses_absences(self) -> bool {
        matches!(self, Self::Attendance)
    }
}

impl fmt::Display for ProfileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileCategory {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError {
                expected: "profile category",
                got: s.to_string(),
            })
    }
}
