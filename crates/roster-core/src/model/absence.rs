use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, str::FromStr};

use super::{ParseEnumError, UserId};

/// Which program a missed session belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AbsenceType {
    School,
    Tutoring,
    Soccer,
}

impl AbsenceType {
    pub const ALL: [Self; 3] = [Self::School, Self::Tutoring, Self::Soccer];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::School => "School",
            Self::Tutoring => "Tutoring",
            Self::Soccer => "Soccer",
        }
    }
}

impl fmt::Display for AbsenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AbsenceType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError {
                expected: "absence type",
                got: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbsenceReason {
    Excused,
    Unexcused,
}

impl AbsenceReason {
    pub const ALL: [Self; 2] = [Self::Excused, Self::Unexcused];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excused => "Excused",
            Self::Unexcused => "Unexcused",
        }
    }
}

impl fmt::Display for AbsenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AbsenceReason {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|reason| reason.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError {
                expected: "absence reason",
                got: s.to_string(),
            })
    }
}

/// One recorded absence. Never folded into a resolved field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceRecord {
    pub player_id: UserId,
    #[serde(rename = "type")]
    pub absence_type: AbsenceType,
    pub date: NaiveDate,
    pub reason: AbsenceReason,
    pub description: String,
}

/// Group absences per type for the Attendance tab.
///
/// Types come out in enumeration order and only appear when they have at
/// least one record; within a type the newest date comes first.
#[must_use]
pub fn group_by_type(records: &[AbsenceRecord]) -> BTreeMap<AbsenceType, Vec<AbsenceRecord>> {
    let mut grouped: BTreeMap<AbsenceType, Vec<AbsenceRecord>> = BTreeMap::new();
    for record in records {
        grouped
            .entry(record.absence_type)
            .or_default()
            .push(record.clone());
    }
    for group in grouped.values_mut() {
        group.sort_by(|a, b| b.date.cmp(&a.date));
    }
    grouped
}
